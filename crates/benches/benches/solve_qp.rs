use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use penqp_algos::PenaltySolver;
use penqp_core::dense::DenseMatrix;
use penqp_core::math::Scalar;
use penqp_core::options::SolveOptions;
use penqp_core::problem::ProblemData;
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn build_problem(n: usize, m: usize, rng: &mut SmallRng) -> ProblemData<Scalar> {
    let diagonal = (0..n * n)
        .map(|k| {
            if k % (n + 1) == 0 {
                1.0 + rng.gen::<Scalar>() * 0.1
            } else {
                0.0
            }
        })
        .collect();
    let q = DenseMatrix::from_row_major(n, n, diagonal).unwrap();
    let linear = (0..n).map(|_| rng.gen::<Scalar>() - 0.5).collect::<Vec<_>>();
    let a_data = (0..m * n)
        .map(|_| rng.gen::<Scalar>() * 0.5 - 0.25)
        .collect();
    let a = DenseMatrix::from_row_major(m, n, a_data).unwrap();
    let b = (0..m).map(|_| rng.gen::<Scalar>() * 0.2).collect::<Vec<_>>();
    let mut problem = ProblemData::from_values(&q, &linear, &a, &b, &vec![0.0; m], 1.0).unwrap();
    problem.set_bounds(vec![-1.0; n], vec![1.0; n]).unwrap();
    problem
}

fn solve_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("penalty_qp_solve");
    let mut rng = SmallRng::seed_from_u64(42);
    group.bench_function("n=50_m=10", |b| {
        b.iter_batched(
            || build_problem(50, 10, &mut rng),
            |mut problem| {
                let solver = PenaltySolver::new(SolveOptions::default());
                let _ = solver.solve(&mut problem).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, solve_benchmark);
criterion_main!(benches);
