use serde::{Deserialize, Serialize};

use crate::flow::FlowType;
use crate::uncertainty::Uncertainty;

/// A ready-to-assemble exchange, as handed to the matrix assembler (C6) by
/// the data-source adapter. One `CalcExchange` is one row of a process's
/// exchange table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcExchange {
    pub owner_process_id: u64,
    pub exchange_id: u64,
    pub flow_id: u64,
    pub flow_type: FlowType,
    pub is_input: bool,
    pub amount: f64,
    pub formula: Option<String>,
    pub allocation_factor: f64,
    pub default_provider_id: u64,
    pub location_id: Option<u64>,
    pub uncertainty: Option<Uncertainty>,
    pub cost_formula: Option<String>,
    pub cost_amount: Option<f64>,
    /// True iff this exchange is the process's declared quantitative
    /// reference (the one that lands on the tech matrix diagonal).
    pub is_quantitative_reference: bool,
}

impl CalcExchange {
    /// An exchange is a technosphere link candidate iff it is not
    /// elementary and is either an input product or an output waste
    /// (§4.1 link-candidate filter), and it is not the owning process's own
    /// quantitative reference.
    pub fn is_link_candidate(&self) -> bool {
        if self.is_quantitative_reference || self.flow_type.is_elementary() {
            return false;
        }
        match self.flow_type {
            FlowType::Product => self.is_input,
            FlowType::Waste => !self.is_input,
            FlowType::Elementary => false,
        }
    }
}
