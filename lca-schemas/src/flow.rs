use serde::{Deserialize, Serialize};

/// The three flow kinds a calc exchange can carry.
///
/// `PRODUCT` and `WASTE` participate in technosphere linking; `ELEMENTARY`
/// flows never do and always land in the intervention matrix `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    Product,
    Waste,
    Elementary,
}

impl FlowType {
    pub fn is_elementary(self) -> bool {
        matches!(self, FlowType::Elementary)
    }
}

/// Identity of an elementary or intermediate flow.
///
/// Equality and hashing include `location_id` so that the same physical flow
/// in two different regions is tracked as two distinct rows once the flow
/// index is regionalised (see [`crate::impact::ImpactIndex`] and
/// `FlowIndex` in `lca-core`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowRef {
    pub flow_id: u64,
    pub flow_type: FlowType,
    pub is_input: bool,
    pub location_id: Option<u64>,
}

impl FlowRef {
    pub fn new(flow_id: u64, flow_type: FlowType, is_input: bool) -> Self {
        Self {
            flow_id,
            flow_type,
            is_input,
            location_id: None,
        }
    }

    pub fn with_location(mut self, location_id: u64) -> Self {
        self.location_id = Some(location_id);
        self
    }

    /// True iff this flow can appear as a technosphere link candidate:
    /// an input product, or an output waste.
    pub fn is_link_candidate(&self) -> bool {
        match self.flow_type {
            FlowType::Elementary => false,
            FlowType::Product => self.is_input,
            FlowType::Waste => !self.is_input,
        }
    }
}
