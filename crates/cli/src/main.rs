#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use penqp_algos::PenaltySolver;
use penqp_core::math::{norm2, Scalar};
use penqp_core::options::SolveOptions;
use penqp_core::problem::ProblemData;
use penqp_core::solution::Solution;
use penqp_io::{read_options, read_point, read_problem, write_solution};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "penqp")]
#[command(version, about = "Penalty-method quadratic programming solver")]
struct Cli {
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file
    Solve {
        #[arg(long)]
        problem: PathBuf,
        #[command(flatten)]
        overrides: OptionOverrides,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the full solution as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Validate a problem file
    Check {
        #[arg(long)]
        problem: PathBuf,
    },
    /// Evaluate the penalized objective and its gradient at a point
    Eval {
        #[arg(long)]
        problem: PathBuf,
        /// JSON array holding the point
        #[arg(long)]
        point: PathBuf,
        #[arg(long)]
        rho: Option<f64>,
    },
}

#[derive(Args)]
struct OptionOverrides {
    /// JSON options document; flags below take precedence
    #[arg(long)]
    options: Option<PathBuf>,
    #[arg(long)]
    tol: Option<f64>,
    #[arg(long)]
    constraint_tol: Option<f64>,
    #[arg(long)]
    max_inner: Option<usize>,
    #[arg(long)]
    max_outer: Option<usize>,
    /// Initial rho; takes precedence over a rho stored in the problem file
    #[arg(long)]
    rho: Option<f64>,
    /// Seconds
    #[arg(long)]
    time_limit: Option<u64>,
}

impl OptionOverrides {
    fn resolve(&self) -> Result<SolveOptions<Scalar>> {
        let mut options = match &self.options {
            Some(path) => read_options(path)?,
            None => SolveOptions::default(),
        };
        if let Some(tolerance) = self.tol {
            options.tolerance = tolerance as Scalar;
        }
        if let Some(tolerance) = self.constraint_tol {
            options.constraint_tolerance = tolerance as Scalar;
        }
        if let Some(iters) = self.max_inner {
            options.max_inner_iterations = iters;
        }
        if let Some(iters) = self.max_outer {
            options.max_outer_iterations = iters;
        }
        if let Some(rho) = self.rho {
            options.rho = rho as Scalar;
        }
        if let Some(limit) = self.time_limit {
            options.max_time = Some(Duration::from_secs(limit));
        }
        Ok(options)
    }
}

#[derive(Serialize)]
struct Evaluation {
    objective: Scalar,
    gradient: Vec<Scalar>,
    gradient_norm: Scalar,
    constraint_residual: Vec<Scalar>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(cli.log_json)?;
    match cli.command {
        Commands::Solve {
            problem,
            overrides,
            output,
            json,
        } => solve_command(
            problem,
            overrides.resolve()?,
            overrides.rho.map(|rho| rho as Scalar),
            output,
            json,
        ),
        Commands::Check { problem } => check_command(problem),
        Commands::Eval {
            problem,
            point,
            rho,
        } => eval_command(problem, point, rho.map(|rho| rho as Scalar)),
    }
}

fn initialize_tracing(log_json: bool) -> Result<()> {
    if log_json {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .try_init()
            .ok();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init()
            .ok();
    }
    Ok(())
}

/// Reads a problem file. `rho_override` replaces whatever rho the file
/// carries; `default_rho` only fills in a missing one.
fn load_problem(
    path: &Path,
    default_rho: Scalar,
    rho_override: Option<Scalar>,
) -> Result<ProblemData<Scalar>> {
    let document = read_problem(path)?;
    let problem = document
        .to_problem(default_rho)
        .context("QP validation failed")?;
    if let Some(rho) = rho_override {
        problem.penalty().set_rho(rho);
    }
    Ok(problem)
}

fn solve_command(
    path: PathBuf,
    options: SolveOptions<Scalar>,
    rho_override: Option<Scalar>,
    output: Option<PathBuf>,
    output_json: bool,
) -> Result<()> {
    let mut problem = load_problem(&path, options.rho, rho_override)?;
    let solution = PenaltySolver::new(options).solve(&mut problem)?;
    emit_solution(solution, output, output_json)
}

fn emit_solution(
    solution: Solution<Scalar>,
    output: Option<PathBuf>,
    output_json: bool,
) -> Result<()> {
    if output_json {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &solution)?;
        handle.write_all(b"\n")?;
        handle.flush()?;
    } else {
        println!(
            "status: {:?}\nobjective: {:.6}\nresidual: {:.3e}\nouter iters: {}\ninner iters: {}",
            solution.status,
            solution.objective_value,
            solution.constraint_residual,
            solution.outer_iterations,
            solution.iterations
        );
    }
    if let Some(path) = output {
        write_solution(path, &solution)?;
    }
    Ok(())
}

fn check_command(path: PathBuf) -> Result<()> {
    let problem = load_problem(&path, SolveOptions::<Scalar>::default().rho, None)?;
    if let Some(bounds) = problem.bounds() {
        let crossed = bounds.crossed();
        if !crossed.is_empty() {
            warn!(indices = ?crossed, "lower bound exceeds upper bound");
        }
    }
    if !problem.constants().quadratic().is_symmetric() {
        warn!("quadratic matrix is not symmetric");
    }
    println!(
        "QP validation succeeded ({} variables, {} equality constraints).",
        problem.nvars(),
        problem.ncons()
    );
    Ok(())
}

fn eval_command(path: PathBuf, point: PathBuf, rho: Option<Scalar>) -> Result<()> {
    let mut problem = load_problem(&path, SolveOptions::<Scalar>::default().rho, rho)?;
    let x = read_point(&point)?;
    anyhow::ensure!(
        x.len() == problem.nvars(),
        "point has {} entries but the problem has {} variables",
        x.len(),
        problem.nvars()
    );
    let evaluator = problem.evaluator();
    let gradient = evaluator.gradient(&x);
    let evaluation = Evaluation {
        objective: evaluator.objective(&x),
        gradient_norm: norm2(&gradient),
        gradient,
        constraint_residual: evaluator.constants().constraint_residual(&x),
    };
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, &evaluation)?;
    handle.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use penqp_core::dense::DenseMatrix;
    use penqp_io::{write_problem, MatrixDocument, QpDocument};

    fn problem_file(name: &str, rho: Option<Scalar>) -> PathBuf {
        let document = QpDocument {
            quadratic: MatrixDocument::Dense(DenseMatrix::identity(2)),
            linear: vec![0.0, 0.0],
            constraints: MatrixDocument::Dense(DenseMatrix::from_rows(&[[1.0, 1.0]]).unwrap()),
            rhs: vec![1.0],
            bounds: None,
            shift: None,
            rho,
        };
        let path = std::env::temp_dir().join(format!("penqp-cli-{}-{name}.json", std::process::id()));
        write_problem(&path, &document).unwrap();
        path
    }

    #[test]
    fn rho_flag_overrides_the_problem_file() {
        let path = problem_file("override", Some(3.0));
        let problem = load_problem(&path, 1.0, Some(50.0)).unwrap();
        assert_eq!(problem.penalty().rho(), 50.0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn file_rho_wins_over_the_default() {
        let path = problem_file("file", Some(3.0));
        assert_eq!(load_problem(&path, 1.0, None).unwrap().penalty().rho(), 3.0);
        std::fs::remove_file(&path).ok();

        let path = problem_file("default", None);
        assert_eq!(load_problem(&path, 7.0, None).unwrap().penalty().rho(), 7.0);
        std::fs::remove_file(&path).ok();
    }
}
