//! Lowest eigenpair of a real symmetric operator.
//!
//! Small spaces are diagonalized densely. Larger ones go through Lanczos
//! with full reorthogonalization; the Krylov basis is kept so the Ritz
//! vector can be rebuilt for observables.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};
use tfim_core::{ErrorInfo, RngHandle, TfimError};

/// Spaces up to this dimension are diagonalized densely.
pub const DENSE_LIMIT: usize = 64;

/// Krylov breakdown threshold: the basis spans an invariant subspace.
const BREAKDOWN: f64 = 1e-13;

/// Tuning knobs for the Lanczos iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanczosOptions {
    /// Maximum number of Krylov vectors.
    #[serde(default = "LanczosOptions::default_max_iterations")]
    pub max_iterations: usize,
    /// Residual tolerance relative to `max(|theta|, 1)`.
    #[serde(default = "LanczosOptions::default_tolerance")]
    pub tolerance: f64,
    /// Seed of the random start vector.
    #[serde(default = "LanczosOptions::default_seed")]
    pub seed: u64,
}

impl LanczosOptions {
    const fn default_max_iterations() -> usize {
        300
    }

    const fn default_tolerance() -> f64 {
        1e-10
    }

    const fn default_seed() -> u64 {
        5489
    }
}

impl Default for LanczosOptions {
    fn default() -> Self {
        Self {
            max_iterations: Self::default_max_iterations(),
            tolerance: Self::default_tolerance(),
            seed: Self::default_seed(),
        }
    }
}

/// Lowest eigenvalue with its normalized eigenvector.
#[derive(Debug, Clone)]
pub struct Eigenpair {
    /// Lowest eigenvalue.
    pub value: f64,
    /// Normalized eigenvector.
    pub vector: DVector<f64>,
    /// Matrix-vector products spent.
    pub iterations: usize,
}

/// Finds the lowest eigenpair of the symmetric operator `apply` on a space of
/// dimension `dim`. `apply(x, y)` must overwrite `y` with `H x`.
pub fn lowest_eigenpair<F>(
    dim: usize,
    apply: F,
    opts: &LanczosOptions,
) -> Result<Eigenpair, TfimError>
where
    F: Fn(&DVector<f64>, &mut DVector<f64>),
{
    if dim == 0 {
        return Err(TfimError::validation(
            "lanczos.empty",
            "operator acts on an empty space",
        ));
    }
    if dim <= DENSE_LIMIT {
        return dense_lowest(dim, &apply);
    }

    let mut rng = RngHandle::from_seed(opts.seed);
    let mut start = DVector::from_vec(rng.symmetric_vector(dim));
    let norm = start.norm();
    if norm <= BREAKDOWN {
        return Err(TfimError::solver(
            "lanczos.start",
            "random start vector vanished",
        ));
    }
    start /= norm;

    let max_iterations = opts.max_iterations.clamp(1, dim);
    let mut basis = vec![start];
    let mut alphas: Vec<f64> = Vec::with_capacity(max_iterations);
    let mut betas: Vec<f64> = Vec::with_capacity(max_iterations);
    let mut w = DVector::<f64>::zeros(dim);
    let mut residual = f64::INFINITY;

    for k in 0..max_iterations {
        apply(&basis[k], &mut w);
        let alpha = basis[k].dot(&w);
        alphas.push(alpha);
        w.axpy(-alpha, &basis[k], 1.0);
        if k > 0 {
            w.axpy(-betas[k - 1], &basis[k - 1], 1.0);
        }
        for v in &basis {
            let overlap = v.dot(&w);
            w.axpy(-overlap, v, 1.0);
        }
        let beta = w.norm();

        let (theta, coefficients) = tridiagonal_lowest(&alphas, &betas)?;
        residual = beta * coefficients[k].abs();
        if residual <= opts.tolerance * theta.abs().max(1.0) || beta <= BREAKDOWN {
            let vector = ritz_vector(&basis, &coefficients);
            return Ok(Eigenpair {
                value: theta,
                vector,
                iterations: k + 1,
            });
        }
        betas.push(beta);
        basis.push(&w / beta);
    }

    Err(TfimError::Solver(
        ErrorInfo::new(
            "lanczos.no_convergence",
            "Lanczos iteration did not reach the residual tolerance",
        )
        .with_context("dim", dim.to_string())
        .with_context("iterations", max_iterations.to_string())
        .with_context("residual", format!("{residual:e}")),
    ))
}

fn dense_lowest<F>(dim: usize, apply: &F) -> Result<Eigenpair, TfimError>
where
    F: Fn(&DVector<f64>, &mut DVector<f64>),
{
    let mut matrix = DMatrix::<f64>::zeros(dim, dim);
    let mut unit = DVector::<f64>::zeros(dim);
    let mut column = DVector::<f64>::zeros(dim);
    for j in 0..dim {
        unit[j] = 1.0;
        apply(&unit, &mut column);
        matrix.set_column(j, &column);
        unit[j] = 0.0;
    }
    let (value, vector) = lowest_of(matrix)?;
    Ok(Eigenpair {
        value,
        vector,
        iterations: dim,
    })
}

fn tridiagonal_lowest(alphas: &[f64], betas: &[f64]) -> Result<(f64, DVector<f64>), TfimError> {
    let n = alphas.len();
    let mut t = DMatrix::<f64>::zeros(n, n);
    for (i, alpha) in alphas.iter().enumerate() {
        t[(i, i)] = *alpha;
    }
    for (i, beta) in betas.iter().enumerate().take(n.saturating_sub(1)) {
        t[(i, i + 1)] = *beta;
        t[(i + 1, i)] = *beta;
    }
    lowest_of(t)
}

fn lowest_of(matrix: DMatrix<f64>) -> Result<(f64, DVector<f64>), TfimError> {
    let eigen = SymmetricEigen::new(matrix);
    let (index, value) = eigen
        .eigenvalues
        .iter()
        .copied()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| TfimError::solver("lanczos.empty_spectrum", "no eigenvalues"))?;
    if !value.is_finite() {
        return Err(TfimError::solver(
            "lanczos.non_finite",
            "eigensolver produced a non-finite eigenvalue",
        ));
    }
    Ok((value, eigen.eigenvectors.column(index).into_owned()))
}

fn ritz_vector(basis: &[DVector<f64>], coefficients: &DVector<f64>) -> DVector<f64> {
    let mut vector = DVector::<f64>::zeros(basis[0].len());
    for (v, c) in basis.iter().zip(coefficients.iter()) {
        vector.axpy(*c, v, 1.0);
    }
    let norm = vector.norm();
    if norm > 0.0 {
        vector /= norm;
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_laplacian(dim: usize) -> impl Fn(&DVector<f64>, &mut DVector<f64>) {
        move |x, y| {
            for i in 0..dim {
                let mut acc = 2.0 * x[i];
                if i > 0 {
                    acc -= x[i - 1];
                }
                if i + 1 < dim {
                    acc -= x[i + 1];
                }
                y[i] = acc;
            }
        }
    }

    #[test]
    fn dense_path_matches_closed_form() {
        let dim = 10;
        let pair = lowest_eigenpair(dim, path_laplacian(dim), &LanczosOptions::default())
            .expect("eigenpair");
        let expected = 2.0 - 2.0 * (std::f64::consts::PI / (dim as f64 + 1.0)).cos();
        assert!((pair.value - expected).abs() < 1e-10);
        assert!((pair.vector.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn krylov_path_matches_closed_form() {
        let dim = 200;
        let pair = lowest_eigenpair(dim, path_laplacian(dim), &LanczosOptions::default())
            .expect("eigenpair");
        let expected = 2.0 - 2.0 * (std::f64::consts::PI / (dim as f64 + 1.0)).cos();
        assert!((pair.value - expected).abs() < 1e-8, "{}", pair.value);

        let mut hv = DVector::zeros(dim);
        path_laplacian(dim)(&pair.vector, &mut hv);
        let residual = (&hv - &pair.vector * pair.value).norm();
        assert!(residual < 1e-4, "residual {residual}");
    }

    #[test]
    fn diagonal_operator_breaks_down_cleanly() {
        let dim = 128;
        let apply = |x: &DVector<f64>, y: &mut DVector<f64>| {
            for i in 0..x.len() {
                let sign = if i % 2 == 0 { -1.0 } else { 1.0 };
                y[i] = sign * x[i];
            }
        };
        let pair = lowest_eigenpair(dim, apply, &LanczosOptions::default()).expect("eigenpair");
        assert!((pair.value + 1.0).abs() < 1e-12);
        assert!(pair.iterations <= 3);
    }

    #[test]
    fn empty_space_is_rejected() {
        let apply = |_: &DVector<f64>, _: &mut DVector<f64>| {};
        let err = lowest_eigenpair(0, apply, &LanczosOptions::default()).expect_err("empty");
        assert!(err.is_validation());
    }

    #[test]
    fn iteration_cap_reports_solver_error() {
        let dim = 200;
        let opts = LanczosOptions {
            max_iterations: 3,
            ..LanczosOptions::default()
        };
        let err = lowest_eigenpair(dim, path_laplacian(dim), &opts).expect_err("cap");
        assert_eq!(err.info().code, "lanczos.no_convergence");
    }
}
