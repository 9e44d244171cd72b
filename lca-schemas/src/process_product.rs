use serde::{Deserialize, Serialize};

/// Primary key of the technology matrix: a `(process, reference flow)` pair.
///
/// A product system used as a sub-system is represented the same way, with
/// the system id standing in for `process_id` and the system's reference
/// flow for `flow_id` (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessProduct {
    pub process_id: u64,
    pub flow_id: u64,
}

impl ProcessProduct {
    pub fn new(process_id: u64, flow_id: u64) -> Self {
        Self {
            process_id,
            flow_id,
        }
    }
}

/// The process-type tag used by provider search to tie-break multiple
/// candidates (§4.1) and by the Monte-Carlo simulator to detect sub-system
/// links (§4.7: a `ProcessLink` whose provider is itself a `SYSTEM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
    UnitProcess,
    LciResult,
    System,
}

/// An author-declared edge of a product system: the recipient's exchange is
/// explicitly wired to `provider` rather than left for the provider search
/// (C4) to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessLink {
    pub recipient_process_id: u64,
    pub exchange_id: u64,
    pub provider: ProcessProduct,
}

/// `(recipient_process_id, exchange_id)` — the key of `TechIndex::links`.
pub type ExchangeKey = (u64, u64);
