use approx::assert_relative_eq;
use penqp_algos::PenaltySolver;
use penqp_core::dense::DenseMatrix;
use penqp_core::math::Scalar;
use penqp_core::options::SolveOptions;
use penqp_core::penalty::PenaltyHandle;
use penqp_core::problem::ProblemData;
use penqp_core::solution::Status;
use std::sync::Arc;

fn tight_options() -> SolveOptions<Scalar> {
    SolveOptions {
        tolerance: 1e-10,
        constraint_tolerance: 1e-8,
        max_inner_iterations: 20_000,
        ..SolveOptions::default()
    }
}

/// minimize ‖x − target‖² subject to x₁ + x₂ = 4
fn closest_point(target: [Scalar; 2]) -> ProblemData<Scalar> {
    ProblemData::from_values(
        &DenseMatrix::identity(2),
        &[-target[0], -target[1]],
        &DenseMatrix::from_rows(&[[1.0, 1.0]]).unwrap(),
        &[4.0],
        &[0.0],
        1.0,
    )
    .unwrap()
}

#[test]
fn solves_box_qp() {
    let mut problem = ProblemData::from_values(
        &DenseMatrix::from_rows(&[[4.0, 0.0], [0.0, 4.0]]).unwrap(),
        &[-1.0, -1.0],
        &DenseMatrix::zeros(0, 2),
        &[],
        &[],
        1.0,
    )
    .unwrap();
    problem.set_bounds(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
    let solution = PenaltySolver::new(tight_options())
        .solve(&mut problem)
        .expect("solve");
    assert_eq!(solution.status, Status::Optimal);
    assert_eq!(solution.outer_iterations, 1);
    for &x in &solution.primal {
        assert_relative_eq!(x, 0.25, epsilon = 1e-8);
    }
}

#[test]
fn solves_equality_constrained_qp() {
    let mut problem = closest_point([3.0, 2.0]);
    problem.set_bounds(vec![0.0, 0.0], vec![Scalar::INFINITY; 2]).unwrap();
    let solution = PenaltySolver::new(tight_options())
        .solve(&mut problem)
        .expect("solve");
    assert!(solution.is_optimal());
    assert_relative_eq!(solution.primal[0], 2.5, epsilon = 1e-6);
    assert_relative_eq!(solution.primal[1], 1.5, epsilon = 1e-6);
    // x − target + y·1 = 0
    assert_relative_eq!(solution.equality_dual[0], 0.5, epsilon = 1e-5);
    assert!(solution.constraint_residual <= 1e-8);
    assert_eq!(solution.stats.history.len(), solution.outer_iterations);
    assert!(solution.stats.cache_refreshes >= solution.outer_iterations - 1);
}

#[test]
fn active_bound_moves_the_solution() {
    let mut problem = closest_point([3.0, -2.0]);
    problem.set_bounds(vec![0.0, 0.0], vec![10.0, 10.0]).unwrap();
    let solution = PenaltySolver::new(tight_options())
        .solve(&mut problem)
        .expect("solve");
    assert!(solution.is_optimal());
    assert_relative_eq!(solution.primal[0], 4.0, epsilon = 1e-6);
    assert_relative_eq!(solution.primal[1], 0.0, epsilon = 1e-6);
}

#[test]
fn outer_limit_reports_max_iterations() {
    let mut problem = closest_point([3.0, 2.0]);
    let options = SolveOptions {
        max_outer_iterations: 1,
        ..tight_options()
    };
    let solution = PenaltySolver::new(options).solve(&mut problem).unwrap();
    assert_eq!(solution.status, Status::MaxIterations);
    assert_eq!(solution.outer_iterations, 1);
    // one penalty update was written back
    assert_eq!(problem.penalty().generation(), 1);
}

#[test]
fn non_finite_data_is_a_numerical_failure() {
    let mut problem = ProblemData::from_values(
        &DenseMatrix::identity(2),
        &[Scalar::NAN, 0.0],
        &DenseMatrix::from_rows(&[[1.0, 1.0]]).unwrap(),
        &[1.0],
        &[0.0],
        1.0,
    )
    .unwrap();
    let solution = PenaltySolver::new(SolveOptions::default())
        .solve(&mut problem)
        .unwrap();
    assert_eq!(solution.status, Status::NumericalFailure);
}

#[test]
fn warm_start_at_the_solution_finishes_quickly() {
    let mut cold = closest_point([3.0, 2.0]);
    let reference = PenaltySolver::new(tight_options()).solve(&mut cold).unwrap();

    let mut warm = closest_point([3.0, 2.0]);
    let shift = cold.penalty().shift();
    warm.penalty().set(cold.penalty().rho(), shift).unwrap();
    let solution = PenaltySolver::new(tight_options())
        .with_warm_start(reference.primal.clone())
        .solve(&mut warm)
        .unwrap();
    assert!(solution.is_optimal());
    assert!(solution.iterations < reference.iterations);
}

#[test]
fn sibling_problems_share_structure() {
    let penalty = PenaltyHandle::zeros(1.0, 1);
    let mut first = ProblemData::from_shared(
        Arc::new(DenseMatrix::identity(2)),
        Arc::new(vec![0.0, 0.0]),
        Arc::new(DenseMatrix::from_rows(&[[1.0, 1.0]]).unwrap()),
        Arc::new(vec![1.0]),
        penalty,
        2,
    )
    .unwrap();
    let mut second = first.with_rhs(vec![3.0]).unwrap();
    let solver = PenaltySolver::new(tight_options());
    let a = solver.solve(&mut first).unwrap();
    let b = solver.solve(&mut second).unwrap();
    assert!(a.is_optimal() && b.is_optimal());
    assert_relative_eq!(a.primal[0], 0.5, epsilon = 1e-6);
    assert_relative_eq!(b.primal[0], 1.5, epsilon = 1e-6);
    assert!(first.constants().shares_storage_with(second.constants()));
}

#[test]
fn warm_start_with_wrong_length_is_rejected() {
    let mut problem = closest_point([3.0, 2.0]);
    let err = PenaltySolver::new(tight_options())
        .with_warm_start(vec![1.0, 2.0, 3.0])
        .solve(&mut problem)
        .unwrap_err();
    assert!(err.to_string().contains("warm start"));
    assert_eq!(problem.penalty().generation(), 0);
}

#[test]
fn non_finite_hessian_is_an_error() {
    let mut problem = ProblemData::from_values(
        &DenseMatrix::from_rows(&[[1.0, 0.0], [0.0, Scalar::INFINITY]]).unwrap(),
        &[0.0, 0.0],
        &DenseMatrix::from_rows(&[[1.0, 1.0]]).unwrap(),
        &[1.0],
        &[0.0],
        1.0,
    )
    .unwrap();
    let err = PenaltySolver::new(SolveOptions::default())
        .solve(&mut problem)
        .unwrap_err();
    assert!(err.to_string().contains("non-finite"));
}
