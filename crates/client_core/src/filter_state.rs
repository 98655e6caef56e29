use std::collections::BTreeMap;

use shared::{
    domain::FilterName,
    error::FilterError,
    protocol::{EntityFilter, EntityFilterDelta, GeneralFilter, GeneralFilterDelta},
};

use crate::sort::SortController;

/// A container's own copy of the query criteria: the general filter plus one
/// slot per entity filter it hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    general: GeneralFilter,
    entity: BTreeMap<FilterName, EntityFilter>,
}

impl FilterState {
    pub fn new(
        defaults: &GeneralFilter,
        sort: &SortController,
        entity_filters: impl IntoIterator<Item = EntityFilter>,
    ) -> Self {
        let mut state = Self {
            general: defaults.clone(),
            entity: entity_filters
                .into_iter()
                .map(|filter| (filter.name(), filter))
                .collect(),
        };
        state.reset(defaults, sort);
        state
    }

    pub fn general(&self) -> &GeneralFilter {
        &self.general
    }

    pub fn entity(&self, name: FilterName) -> Option<&EntityFilter> {
        self.entity.get(&name)
    }

    pub fn entity_filters(&self) -> &BTreeMap<FilterName, EntityFilter> {
        &self.entity
    }

    pub fn merge_general(&mut self, delta: GeneralFilterDelta) -> &GeneralFilter {
        self.general.apply(delta);
        &self.general
    }

    pub fn merge_entity(
        &mut self,
        name: FilterName,
        delta: EntityFilterDelta,
    ) -> Result<&EntityFilter, FilterError> {
        if delta.name() != name {
            return Err(FilterError::KindMismatch {
                target: name,
                delta: delta.name(),
            });
        }
        let slot = self
            .entity
            .get_mut(&name)
            .ok_or(FilterError::UnknownSlot(name))?;
        slot.apply(delta)?;
        Ok(&*slot)
    }

    /// Restores the general filter to `defaults` and re-derives the sort.
    /// Entity slots keep their values.
    pub fn reset(&mut self, defaults: &GeneralFilter, sort: &SortController) {
        let order_by_field = sort.default_field().to_string();
        self.general = defaults.clone();
        self.general.direction = sort.default_direction(&order_by_field).to_string();
        self.general.order_by_field = order_by_field;
    }
}

#[cfg(test)]
#[path = "tests/filter_state_tests.rs"]
mod tests;
