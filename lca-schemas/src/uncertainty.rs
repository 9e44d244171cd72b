use serde::{Deserialize, Serialize};

/// The standard LCA uncertainty distribution shapes. Sampling itself lives
/// in `lca-core::uncertainty` (it needs an RNG); this crate only carries the
/// distribution parameters, since they are pure persisted data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Uncertainty {
    LogNormal { geomean: f64, geo_sd: f64 },
    Normal { mean: f64, sd: f64 },
    Triangle { min: f64, mode: f64, max: f64 },
    Uniform { min: f64, max: f64 },
}
