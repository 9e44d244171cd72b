use serde::{Deserialize, Serialize};

use crate::process_product::ProcessType;

/// How the tech-index builder (C5) should resolve an unlinked technosphere
/// exchange to a provider (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderLinking {
    /// Never prefer the persisted default provider; always fall through to
    /// the general tie-break rules.
    Ignore,
    /// Prefer the persisted default provider when present, otherwise fall
    /// back to the general tie-break rules.
    PreferDefaults,
    /// Only ever link to the persisted default provider; leave the exchange
    /// unlinked otherwise.
    OnlyDefaults,
}

/// Tie-breaker used when more than one candidate remains and no default
/// applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredType {
    UnitProcess,
    LciResult,
}

impl PreferredType {
    pub fn matches(self, process_type: ProcessType) -> bool {
        matches!(
            (self, process_type),
            (PreferredType::UnitProcess, ProcessType::UnitProcess)
                | (PreferredType::LciResult, ProcessType::LciResult)
        )
    }
}

/// A candidate provider as seen by provider search: the `ProcessProduct`
/// plus the metadata needed to apply the linking policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCandidate {
    pub process_id: u64,
    pub flow_id: u64,
    pub process_type: ProcessType,
}

impl ProviderCandidate {
    pub fn product(&self) -> crate::process_product::ProcessProduct {
        crate::process_product::ProcessProduct::new(self.process_id, self.flow_id)
    }
}

/// Optional capability: a caller-installed callback that can narrow or
/// cancel the candidate set for a given exchange (§4.1, step 1 and step 6).
pub trait LinkingCallback {
    /// Return `None` to cancel the exchange entirely, or `Some(subset)` —
    /// possibly unchanged — to continue with a (potentially narrowed) set
    /// of candidates.
    fn select(
        &self,
        exchange: &crate::exchange::CalcExchange,
        candidates: &[ProviderCandidate],
    ) -> Option<Vec<ProviderCandidate>>;
}

/// The full linking policy passed into the tech-index builder.
#[derive(Default)]
pub struct LinkingConfig {
    pub provider_linking: ProviderLinking,
    pub preferred_type: PreferredType,
    pub callback: Option<Box<dyn LinkingCallback + Send + Sync>>,
}

impl Default for ProviderLinking {
    fn default() -> Self {
        ProviderLinking::PreferDefaults
    }
}

impl Default for PreferredType {
    fn default() -> Self {
        PreferredType::UnitProcess
    }
}

impl std::fmt::Debug for LinkingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkingConfig")
            .field("provider_linking", &self.provider_linking)
            .field("preferred_type", &self.preferred_type)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
