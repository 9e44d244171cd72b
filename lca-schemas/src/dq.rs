use serde::{Deserialize, Serialize};

/// One data-quality indicator: an ordinal scale `1..=score_count`, `0`
/// meaning "not assessed" (NA).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqIndicator {
    pub id: u64,
    pub name: String,
    pub score_count: u32,
}

/// An ordered set of indicators shared by a process's and an exchange's
/// pedigree-matrix style data-quality entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DqSystem {
    pub indicators: Vec<DqIndicator>,
}

impl DqSystem {
    pub fn new(indicators: Vec<DqIndicator>) -> Self {
        Self { indicators }
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn score_count(&self, indicator_index: usize) -> u32 {
        self.indicators
            .get(indicator_index)
            .map(|i| i.score_count)
            .unwrap_or(0)
    }
}

/// Error returned by [`parse_dq_entry`] on malformed input. Per §7, callers
/// recover from this by treating the entry as all-NA rather than aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DqEntryError(pub String);

impl std::fmt::Display for DqEntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid DQ entry: {}", self.0)
    }
}

impl std::error::Error for DqEntryError {}

/// Parse a persisted DQ entry of the form `"(v1;v2;...;vk)"` into up to
/// `indicator_count` scores, padding missing trailing indicators with `0`
/// (NA) and trimming whitespace around each value, per §6.
pub fn parse_dq_entry(entry: &str, indicator_count: usize) -> Result<Vec<i32>, DqEntryError> {
    let trimmed = entry.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| DqEntryError(entry.to_string()))?;

    let mut values = Vec::with_capacity(indicator_count);
    if !inner.trim().is_empty() {
        for part in inner.split(';') {
            let v: i32 = part
                .trim()
                .parse()
                .map_err(|_| DqEntryError(entry.to_string()))?;
            values.push(v);
        }
    }
    if values.len() > indicator_count {
        return Err(DqEntryError(entry.to_string()));
    }
    values.resize(indicator_count, 0);
    Ok(values)
}

/// Format a score vector back into the persisted `"(v1;v2;...;vk)"` shape.
pub fn format_dq_entry(values: &[i32]) -> String {
    let body = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(";");
    format!("({body})")
}

/// How an indicator's per-column scores are rolled up into a per-flow score
/// in the DQ aggregator (C9, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DqAggregationPolicy {
    None,
    Maximum,
    WeightedAverage,
    WeightedSquaredAverage,
}

/// How a `0` (NA) score is handled before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DqNaHandling {
    Exclude,
    UseMax,
}

impl Default for DqNaHandling {
    fn default() -> Self {
        DqNaHandling::Exclude
    }
}

/// Rounding applied to the final weighted average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DqRounding {
    Nearest,
    AlwaysUp,
}

impl Default for DqRounding {
    fn default() -> Self {
        DqRounding::Nearest
    }
}
