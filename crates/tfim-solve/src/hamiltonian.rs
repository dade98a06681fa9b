use nalgebra::DVector;
use tfim_core::{ensure_chain_length, ModelParameters, TfimError};

/// Matrix-free periodic transverse-field Ising chain,
/// `H = -J sum_i Z_i Z_{i+1} - h sum_i X_i`, in the computational basis.
///
/// Bit `i` of a basis index set means spin `i` points down (`Z_i = -1`).
#[derive(Debug, Clone)]
pub struct PeriodicChain {
    sites: u32,
    field: f64,
    diagonal: Vec<f64>,
}

impl PeriodicChain {
    /// Builds the chain; rejects lengths above the diagonalization ceiling.
    pub fn new(model: &ModelParameters) -> Result<Self, TfimError> {
        model.ensure_diagonalizable()?;
        let sites = model.length();
        ensure_chain_length(sites)?;
        let dim = 1usize << sites;
        let coupling = model.coupling_j();
        let diagonal = (0..dim)
            .map(|state| -coupling * bond_sum(state, sites))
            .collect();
        Ok(Self {
            sites,
            field: model.transverse_field(),
            diagonal,
        })
    }

    /// Number of sites.
    pub fn sites(&self) -> u32 {
        self.sites
    }

    /// Hilbert space dimension `2^L`.
    pub fn dim(&self) -> usize {
        self.diagonal.len()
    }

    /// Overwrites `y` with `H x`.
    pub fn apply(&self, x: &DVector<f64>, y: &mut DVector<f64>) {
        for state in 0..self.dim() {
            let mut acc = self.diagonal[state] * x[state];
            for site in 0..self.sites {
                acc -= self.field * x[state ^ (1usize << site)];
            }
            y[state] = acc;
        }
    }

    /// Mean single-site `<X_i>` in the normalized state `psi`.
    pub fn magnetization_x(&self, psi: &DVector<f64>) -> f64 {
        let mut total = 0.0;
        for state in 0..self.dim() {
            for site in 0..self.sites {
                total += psi[state] * psi[state ^ (1usize << site)];
            }
        }
        total / f64::from(self.sites)
    }

    /// Mean nearest-neighbour `<Z_i Z_{i+1}>` in the normalized state `psi`.
    pub fn correlation_zz_nn(&self, psi: &DVector<f64>) -> f64 {
        let total: f64 = (0..self.dim())
            .map(|state| psi[state] * psi[state] * bond_sum(state, self.sites))
            .sum();
        total / f64::from(self.sites)
    }
}

fn spin(state: usize, site: u32) -> f64 {
    if (state >> site) & 1 == 1 {
        -1.0
    } else {
        1.0
    }
}

fn bond_sum(state: usize, sites: u32) -> f64 {
    (0..sites)
        .map(|site| spin(state, site) * spin(state, (site + 1) % sites))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_free_chain_is_diagonal() {
        let model = ModelParameters::new(1.0, 0.0, 4).expect("model");
        let chain = PeriodicChain::new(&model).expect("chain");
        assert_eq!(chain.dim(), 16);
        let mut x = DVector::zeros(16);
        x[0] = 1.0;
        let mut y = DVector::zeros(16);
        chain.apply(&x, &mut y);
        assert_eq!(y[0], -4.0);
        assert_eq!(y.iter().filter(|v| **v != 0.0).count(), 1);
    }

    #[test]
    fn refuses_long_chains() {
        let model = ModelParameters::new(1.0, 0.5, 13).expect("model");
        assert!(PeriodicChain::new(&model).is_err());
    }
}
