use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use penqp_core::dense::DenseMatrix;
use penqp_core::evaluator::LINEAR_TERM_COEFFICIENT;
use penqp_core::math::Scalar;
use penqp_core::problem::ProblemData;
use penqp_core::traits::LinearOperator;
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn random_matrix(nrows: usize, ncols: usize, rng: &mut SmallRng) -> DenseMatrix<Scalar> {
    let data = (0..nrows * ncols)
        .map(|_| rng.gen::<Scalar>() - 0.5)
        .collect();
    DenseMatrix::from_row_major(nrows, ncols, data).unwrap()
}

fn build_problem(n: usize, m: usize, rng: &mut SmallRng) -> ProblemData<Scalar> {
    let q = DenseMatrix::identity(n);
    let linear = (0..n).map(|_| rng.gen::<Scalar>() - 0.5).collect::<Vec<_>>();
    let a = random_matrix(m, n, rng);
    let b = (0..m).map(|_| rng.gen::<Scalar>()).collect::<Vec<_>>();
    let shift = (0..m).map(|_| rng.gen::<Scalar>() * 0.1).collect::<Vec<_>>();
    ProblemData::from_values(&q, &linear, &a, &b, &shift, 10.0).unwrap()
}

/// Q·x + c·q + ρ·Aᵀ(A·x − (b − Pk)) evaluated without the derived cache.
fn uncached_gradient(problem: &ProblemData<Scalar>, x: &[Scalar]) -> Vec<Scalar> {
    let constants = problem.constants();
    let state = problem.penalty().snapshot();
    let mut ax = vec![0.0; problem.ncons()];
    constants.constraints().apply(x, &mut ax);
    for ((r, &b), &p) in ax.iter_mut().zip(constants.rhs()).zip(state.shift()) {
        *r -= b - p;
    }
    let mut grad = vec![0.0; problem.nvars()];
    constants.constraints().apply_transpose(&ax, &mut grad);
    let mut qx = vec![0.0; problem.nvars()];
    constants.quadratic().apply(x, &mut qx);
    for ((g, &qx), &lin) in grad.iter_mut().zip(&qx).zip(constants.linear()) {
        *g = qx + LINEAR_TERM_COEFFICIENT as Scalar * lin + state.rho() * *g;
    }
    grad
}

fn gradient_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("penalized_gradient");
    let mut rng = SmallRng::seed_from_u64(42);
    let mut problem = build_problem(100, 60, &mut rng);
    let x = (0..100).map(|_| rng.gen::<Scalar>()).collect::<Vec<_>>();
    let uncached = problem.detach();
    let evaluator = problem.evaluator();
    let mut grad = vec![0.0; 100];
    group.bench_function("cached_n=100_m=60", |b| {
        b.iter(|| evaluator.gradient_into(black_box(&x), &mut grad));
    });
    group.bench_function("uncached_n=100_m=60", |b| {
        b.iter(|| uncached_gradient(black_box(&uncached), black_box(&x)));
    });
    group.finish();
}

fn cache_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("derived_cache");
    let mut rng = SmallRng::seed_from_u64(7);
    let problem = build_problem(100, 60, &mut rng);
    group.bench_function("refresh_after_shift_update", |b| {
        b.iter_batched(
            || problem.detach(),
            |mut problem| {
                problem.penalty().update_shift(|shift| {
                    for s in shift.iter_mut() {
                        *s += 0.01;
                    }
                });
                problem.refresh()
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_function("recompute_cache", |b| {
        b.iter_batched(
            || problem.detach(),
            |mut problem| problem.recompute_cache(),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, gradient_benchmark, cache_benchmark);
criterion_main!(benches);
