use serde::{Deserialize, Serialize};

/// One characterization factor: a flow's contribution to an impact
/// category, optionally specific to a location. Location-specific factors
/// take precedence over a global factor for the same flow (§4.5
/// regionalisation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterizationFactor {
    pub flow_id: u64,
    pub location_id: Option<u64>,
    pub factor: f64,
}

/// A single impact category descriptor: an id, display name, and its
/// characterization factors over elementary flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactCategory {
    pub id: u64,
    pub name: String,
    pub reference_unit: String,
    pub factors: Vec<CharacterizationFactor>,
}

/// Ordered list of impact categories — the row index of the impact matrix
/// `C`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactIndex {
    categories: Vec<ImpactCategory>,
}

impl ImpactIndex {
    pub fn new(categories: Vec<ImpactCategory>) -> Self {
        Self { categories }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ImpactCategory)> {
        self.categories.iter().enumerate()
    }

    pub fn get(&self, row: usize) -> Option<&ImpactCategory> {
        self.categories.get(row)
    }

    /// Find the best factor for `flow_id` in category `row`: a
    /// location-specific factor for `location_id` if present, otherwise the
    /// global (`location_id: None`) factor.
    pub fn factor_for(
        &self,
        row: usize,
        flow_id: u64,
        location_id: Option<u64>,
    ) -> Option<f64> {
        let category = self.categories.get(row)?;
        let mut global = None;
        for f in &category.factors {
            if f.flow_id != flow_id {
                continue;
            }
            if location_id.is_some() && f.location_id == location_id {
                return Some(f.factor);
            }
            if f.location_id.is_none() {
                global = Some(f.factor);
            }
        }
        global
    }
}
