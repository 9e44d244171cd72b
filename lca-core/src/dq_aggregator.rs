//! Data-quality aggregator (C9, §4.6): rolls up per-exchange pedigree-matrix
//! scores into one aggregated score per elementary flow, per indicator, and
//! further rolls those per-flow scores up into one score per impact
//! category, weighted by each flow's characterization contribution.

use lca_schemas::dq::{DqAggregationPolicy, DqNaHandling, DqRounding, DqSystem};

/// A dense `rows × cols` grid of DQ scores (`0..=score_count`, `0` = NA).
/// Kept separate from [`crate::matrix::DenseMatrix`] because scores are
/// small non-negative integers, not `f64`.
#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    rows: usize,
    cols: usize,
    data: Vec<i32>,
}

impl ScoreMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: i32) {
        self.data[row * self.cols + col] = value;
    }
}

/// `process_data[k]`: one DQ score per tech column, for indicator `k`.
pub type ProcessScores = Vec<i32>;

fn effective_score(raw: i32, score_count: u32, na_handling: DqNaHandling) -> Option<i32> {
    if raw == 0 {
        match na_handling {
            DqNaHandling::Exclude => None,
            DqNaHandling::UseMax => Some(score_count as i32),
        }
    } else {
        Some(raw)
    }
}

fn round_value(value: f64, rounding: DqRounding) -> i32 {
    match rounding {
        DqRounding::Nearest => value.round() as i32,
        DqRounding::AlwaysUp => value.ceil() as i32,
    }
}

fn clamp(value: i32, score_count: u32) -> i32 {
    value.clamp(0, score_count as i32)
}

/// Rolls up a set of `(score, weight)` pairs per `policy`, clamped to
/// `[0, score_count]`. Shared by the per-flow and the impact-category
/// rollup (§4.6) — both reduce to "combine these scores by these weights".
fn combine(weighted: &[(i32, f64)], score_count: u32, policy: DqAggregationPolicy, rounding: DqRounding) -> i32 {
    match policy {
        DqAggregationPolicy::None => 0,
        DqAggregationPolicy::Maximum => {
            let max = weighted.iter().map(|(s, _)| *s).max().unwrap_or(0);
            clamp(max, score_count)
        }
        DqAggregationPolicy::WeightedAverage => {
            let (num, den) = weighted
                .iter()
                .fold((0.0, 0.0), |(n, d), (s, w)| (n + (*s as f64) * w, d + w));
            if den == 0.0 {
                0
            } else {
                clamp(round_value(num / den, rounding), score_count)
            }
        }
        DqAggregationPolicy::WeightedSquaredAverage => {
            let (num, den) = weighted
                .iter()
                .fold((0.0, 0.0), |(n, d), (s, w)| (n + (*s as f64) * w * w, d + w * w));
            if den == 0.0 {
                0
            } else {
                clamp(round_value(num / den, rounding), score_count)
            }
        }
    }
}

/// Aggregates one indicator's `m × n` exchange score matrix into an
/// `m`-length per-flow result, weighting by the matching entry of
/// `contributions` (the absolute direct-flow contribution `|G[i,j]|`).
///
/// `NONE` is not handled here — callers skip flow-result computation
/// entirely for that policy (§4.6).
pub fn aggregate_indicator(
    scores: &ScoreMatrix,
    contributions: &crate::matrix::DenseMatrix,
    score_count: u32,
    policy: DqAggregationPolicy,
    na_handling: DqNaHandling,
    rounding: DqRounding,
) -> Vec<i32> {
    let rows = scores.rows();
    let cols = scores.cols();
    let mut result = vec![0; rows];

    for i in 0..rows {
        let weighted: Vec<(i32, f64)> = (0..cols)
            .filter_map(|j| {
                let raw = scores.get(i, j);
                let score = effective_score(raw, score_count, na_handling)?;
                Some((score, contributions.get(i, j).abs()))
            })
            .collect();

        result[i] = combine(&weighted, score_count, policy, rounding);
    }
    result
}

/// Rolls `flow_result` (one per-indicator, per-flow vector, as produced by
/// [`aggregate_indicator`]/[`aggregate_all`]) up across flows into one
/// per-indicator score for an impact category, weighting flow `i` by
/// `flow_weights[i]` — the flow's characterization-factor contribution to
/// that category (§4.6). `flow_weights` has one entry per flow and is
/// shared across indicators, the same way `contributions` is shared across
/// indicators in [`aggregate_indicator`].
pub fn aggregate_impact_category(
    flow_result: &[i32],
    flow_weights: &[f64],
    score_count: u32,
    policy: DqAggregationPolicy,
    rounding: DqRounding,
) -> i32 {
    let weighted: Vec<(i32, f64)> = flow_result
        .iter()
        .zip(flow_weights)
        .map(|(&s, &w)| (s, w.abs()))
        .collect();
    combine(&weighted, score_count, policy, rounding)
}

/// Runs [`aggregate_impact_category`] once per indicator, given `flow_results`
/// as produced by [`aggregate_all`] (`indicator × flow`).
pub fn aggregate_impact_all(
    flow_results: &[Vec<i32>],
    flow_weights: &[f64],
    score_count: u32,
    policy: DqAggregationPolicy,
    rounding: DqRounding,
) -> Vec<i32> {
    flow_results
        .iter()
        .map(|flow_result| aggregate_impact_category(flow_result, flow_weights, score_count, policy, rounding))
        .collect()
}

/// Runs [`aggregate_indicator`] once per indicator in `dq_system`, given one
/// `exchange_data[k]` score matrix and one `contributions` matrix (shared
/// across indicators — contribution is a property of the flow/column pair,
/// not of any one indicator).
pub fn aggregate_all(
    dq_system: &DqSystem,
    exchange_data: &[ScoreMatrix],
    contributions: &crate::matrix::DenseMatrix,
    policy: DqAggregationPolicy,
    na_handling: DqNaHandling,
    rounding: DqRounding,
) -> Vec<Vec<i32>> {
    dq_system
        .indicators
        .iter()
        .zip(exchange_data)
        .map(|(indicator, scores)| {
            aggregate_indicator(
                scores,
                contributions,
                indicator.score_count,
                policy,
                na_handling,
                rounding,
            )
        })
        .collect()
}
