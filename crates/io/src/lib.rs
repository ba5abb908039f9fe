#![forbid(unsafe_code)]

use anyhow::{anyhow, Context, Result};
use penqp_core::dense::{CscMatrix, DenseMatrix};
use penqp_core::math::Scalar;
use penqp_core::options::SolveOptions;
use penqp_core::problem::{Bounds, ProblemData, ProblemResult};
use penqp_core::solution::Solution;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// A matrix as stored on disk: compressed columns or dense row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatrixDocument {
    // listed first: a dense document has no `indptr`, so it never matches
    Csc(CscMatrix<Scalar>),
    Dense(DenseMatrix<Scalar>),
}

impl MatrixDocument {
    pub fn to_dense(&self) -> ProblemResult<DenseMatrix<Scalar>> {
        match self {
            MatrixDocument::Csc(matrix) => DenseMatrix::from_csc(matrix),
            MatrixDocument::Dense(matrix) => {
                matrix.validate()?;
                Ok(matrix.clone())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QpDocument {
    pub quadratic: MatrixDocument,
    pub linear: Vec<Scalar>,
    pub constraints: MatrixDocument,
    pub rhs: Vec<Scalar>,
    #[serde(default)]
    pub bounds: Option<Bounds<Scalar>>,
    #[serde(default)]
    pub shift: Option<Vec<Scalar>>,
    #[serde(default)]
    pub rho: Option<Scalar>,
}

impl QpDocument {
    /// Builds the problem; a missing `rho` falls back to `default_rho` and a
    /// missing shift to zeros.
    pub fn to_problem(&self, default_rho: Scalar) -> Result<ProblemData<Scalar>> {
        let quadratic = self.quadratic.to_dense().context("invalid quadratic matrix")?;
        let constraints = self
            .constraints
            .to_dense()
            .context("invalid constraint matrix")?;
        let shift = self
            .shift
            .clone()
            .unwrap_or_else(|| vec![0.0; self.rhs.len()]);
        let mut problem = ProblemData::from_values(
            &quadratic,
            &self.linear,
            &constraints,
            &self.rhs,
            &shift,
            self.rho.unwrap_or(default_rho),
        )
        .context("problem validation failed")?;
        if let Some(bounds) = &self.bounds {
            problem
                .set_bounds(bounds.lower.clone(), bounds.upper.clone())
                .context("invalid bounds")?;
        }
        Ok(problem)
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .with_context(|| format!("failed to read {:?}", path))?;
    Ok(contents)
}

pub fn read_problem<P: AsRef<Path>>(path: P) -> Result<QpDocument> {
    let contents = read_to_string(path.as_ref())?;
    match serde_json::from_str::<QpDocument>(&contents) {
        Ok(document) => Ok(document),
        Err(parse_err) => {
            if serde_json::from_str::<Solution<Scalar>>(&contents).is_ok() {
                Err(anyhow!(
                    "JSON file contains a solver solution, but a penqp problem was expected."
                ))
            } else {
                Err(parse_err).context("failed to parse JSON problem")
            }
        }
    }
}

pub fn write_problem<P: AsRef<Path>>(path: P, document: &QpDocument) -> Result<()> {
    let file = File::create(path.as_ref())
        .with_context(|| format!("failed to create {:?}", path.as_ref()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, document).context("failed to serialise problem")?;
    Ok(())
}

pub fn read_options<P: AsRef<Path>>(path: P) -> Result<SolveOptions<Scalar>> {
    let contents = read_to_string(path.as_ref())?;
    serde_json::from_str(&contents).context("failed to parse solver options")
}

/// Reads a point as a JSON array of numbers.
pub fn read_point<P: AsRef<Path>>(path: P) -> Result<Vec<Scalar>> {
    let contents = read_to_string(path.as_ref())?;
    serde_json::from_str(&contents).context("failed to parse point")
}

pub fn write_solution<P: AsRef<Path>>(path: P, solution: &Solution<Scalar>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create parent directory {:?}", parent))?;
        }
    }

    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, solution).context("failed to serialise solution")?;
    writer
        .flush()
        .with_context(|| format!("failed to write solution into {:?}", path))?;
    Ok(())
}
