//! `FlowIndex` (C1): the ordered row index of the intervention matrix `B`
//! and the impact matrix `C`'s column index.

use std::collections::HashMap;

use lca_schemas::flow::FlowRef;

/// Ordered list of `FlowRef`s. If any entry carries a `location_id` the
/// index is regionalised and lookups key on `(flow_id, location_id)`;
/// otherwise lookups key on `flow_id` alone. The two modes are mutually
/// exclusive for a given index (§3).
#[derive(Debug, Clone, Default)]
pub struct FlowIndex {
    entries: Vec<FlowRef>,
    position: HashMap<(u64, Option<u64>), u32>,
    regionalized: bool,
}

impl FlowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_regionalized(&self) -> bool {
        self.regionalized
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<FlowRef> {
        self.entries.get(row).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &FlowRef)> {
        self.entries.iter().enumerate()
    }

    fn key_for(&self, flow_id: u64, location_id: Option<u64>) -> (u64, Option<u64>) {
        if self.regionalized {
            (flow_id, location_id)
        } else {
            (flow_id, None)
        }
    }

    pub fn row_of(&self, flow_id: u64, location_id: Option<u64>) -> Option<usize> {
        self.position
            .get(&self.key_for(flow_id, location_id))
            .map(|&p| p as usize)
    }

    /// Appends the flow if not already present (by the index's current
    /// lookup mode); the first entry carrying a `location_id` switches the
    /// whole index into regionalised mode.
    pub fn push(&mut self, flow: FlowRef) -> usize {
        if flow.location_id.is_some() && !self.regionalized {
            self.regionalized = true;
            self.position.clear();
            for (i, existing) in self.entries.iter().enumerate() {
                self.position
                    .insert((existing.flow_id, existing.location_id), i as u32);
            }
        }
        let key = self.key_for(flow.flow_id, flow.location_id);
        if let Some(&pos) = self.position.get(&key) {
            return pos as usize;
        }
        let pos = self.entries.len() as u32;
        self.entries.push(flow);
        self.position.insert(key, pos);
        pos as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lca_schemas::flow::FlowType;

    #[test]
    fn non_regionalized_lookup_keys_on_flow_id_only() {
        let mut index = FlowIndex::new();
        let row = index.push(FlowRef::new(5, FlowType::Elementary, true));
        assert_eq!(index.row_of(5, None), Some(row));
        assert!(!index.is_regionalized());
    }

    #[test]
    fn regionalized_lookup_requires_matching_location() {
        let mut index = FlowIndex::new();
        let row_a = index.push(FlowRef::new(5, FlowType::Elementary, true).with_location(1));
        let row_b = index.push(FlowRef::new(5, FlowType::Elementary, true).with_location(2));
        assert!(index.is_regionalized());
        assert_ne!(row_a, row_b);
        assert_eq!(index.row_of(5, Some(1)), Some(row_a));
        assert_eq!(index.row_of(5, Some(2)), Some(row_b));
        assert_eq!(index.row_of(5, None), None);
    }
}
