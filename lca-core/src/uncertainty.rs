//! Uncertainty sampling: turns an
//! [`Uncertainty`](lca_schemas::uncertainty::Uncertainty) distribution
//! descriptor into a drawn sample, for the Monte-Carlo simulator (C10).

use lca_schemas::uncertainty::Uncertainty;
use rand::Rng;
use rand_distr::{Distribution, LogNormal as RdLogNormal, Normal as RdNormal, Triangular, Uniform};

use crate::error::{LcaError, Result};

/// Draws one sample from `dist` using `rng`. Returns an error if the
/// distribution's parameters don't describe a valid distribution (e.g. a
/// non-positive geometric standard deviation).
pub fn sample<R: Rng + ?Sized>(dist: &Uncertainty, rng: &mut R) -> Result<f64> {
    match *dist {
        Uncertainty::LogNormal { geomean, geo_sd } => {
            if geomean <= 0.0 || geo_sd <= 1.0 {
                return Err(LcaError::ConfigError(format!(
                    "invalid log-normal parameters: geomean={geomean}, geo_sd={geo_sd}"
                )));
            }
            let mu = geomean.ln();
            let sigma = geo_sd.ln();
            let d = RdLogNormal::new(mu, sigma).map_err(|e| {
                LcaError::ConfigError(format!("log-normal distribution error: {e}"))
            })?;
            Ok(d.sample(rng))
        }
        Uncertainty::Normal { mean, sd } => {
            if sd < 0.0 {
                return Err(LcaError::ConfigError(format!(
                    "invalid normal parameters: sd={sd}"
                )));
            }
            let d = RdNormal::new(mean, sd)
                .map_err(|e| LcaError::ConfigError(format!("normal distribution error: {e}")))?;
            Ok(d.sample(rng))
        }
        Uncertainty::Triangle { min, mode, max } => {
            let d = Triangular::new(min, max, mode).map_err(|e| {
                LcaError::ConfigError(format!("triangular distribution error: {e}"))
            })?;
            Ok(d.sample(rng))
        }
        Uncertainty::Uniform { min, max } => {
            if min >= max {
                return Err(LcaError::ConfigError(format!(
                    "invalid uniform parameters: min={min}, max={max}"
                )));
            }
            let d = Uniform::new(min, max);
            Ok(d.sample(rng))
        }
    }
}
