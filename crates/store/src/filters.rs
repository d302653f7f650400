//! Filter criteria owned by the list view.

use resreg_core::{FilterCriteria, FilterField};

/// Four optional filter fields; no validation, the backend decides what matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    criteria: FilterCriteria,
}

impl FilterState {
    pub fn new() -> Self { Self::default() }

    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        *self.criteria.get_mut(field) = value.into();
    }

    pub fn get(&self, field: FilterField) -> &str { self.criteria.get(field) }

    pub fn clear(&mut self) { self.criteria = FilterCriteria::default(); }

    pub fn criteria(&self) -> &FilterCriteria { &self.criteria }

    /// Non-empty fields as ordered `key=value` pairs.
    pub fn to_query_params(&self) -> Vec<(&'static str, &str)> { self.criteria.query_params() }
}

impl From<FilterCriteria> for FilterState {
    fn from(criteria: FilterCriteria) -> Self { Self { criteria } }
}
