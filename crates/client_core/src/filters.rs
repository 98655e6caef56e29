//! Filter widgets that translate input into container events.

use anyhow::Result;
use shared::{
    domain::{FilterName, NetworkId},
    protocol::{
        ContactFilterDelta, DateRange, EmailFilterDelta, EntityFilterDelta, SelectOption,
        WidgetEvent,
    },
};
use tracing::error;

use crate::{
    date_range::{DateChange, DateRangePicker},
    debounce::SearchDebouncer,
    definitions::DefinitionCache,
    FilterDefinitionService, OptionsService,
};

fn contact_change(delta: ContactFilterDelta) -> WidgetEvent {
    WidgetEvent::UniqueFilterChange {
        filter_name: FilterName::ContactFilter,
        delta: EntityFilterDelta::Contact(delta),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

pub struct ContactFilterPanel {
    title_options: Vec<SelectOption>,
    network_options: Vec<SelectOption>,
    county: SearchDebouncer,
}

impl ContactFilterPanel {
    pub fn new(county: SearchDebouncer) -> Self {
        Self {
            title_options: vec![SelectOption::blank()],
            network_options: vec![SelectOption::blank()],
            county,
        }
    }

    /// Fills the title and network pickers. A failed lookup leaves only the
    /// blank option.
    pub async fn load_options(&mut self, service: &dyn OptionsService) {
        match service.title_options().await {
            Ok(options) => self.title_options.extend(options),
            Err(err) => error!("filters: failed to load title options: {err:#}"),
        }
        match service.network_options().await {
            Ok(options) => self.network_options.extend(options),
            Err(err) => error!("filters: failed to load network options: {err:#}"),
        }
    }

    pub fn title_options(&self) -> &[SelectOption] {
        &self.title_options
    }

    pub fn network_options(&self) -> &[SelectOption] {
        &self.network_options
    }

    pub fn title_changed(&self, value: &str) -> WidgetEvent {
        contact_change(ContactFilterDelta {
            title: Some(non_empty(value)),
            ..ContactFilterDelta::default()
        })
    }

    pub fn network_changed(&self, value: &str) -> WidgetEvent {
        contact_change(ContactFilterDelta {
            network_id: Some(non_empty(value).map(NetworkId)),
            ..ContactFilterDelta::default()
        })
    }

    pub fn fqhc_changed(&self, checked: bool) -> WidgetEvent {
        contact_change(ContactFilterDelta {
            fqhc: Some(checked),
            ..ContactFilterDelta::default()
        })
    }

    pub fn cad_changed(&self, checked: bool) -> WidgetEvent {
        contact_change(ContactFilterDelta {
            cad: Some(checked),
            ..ContactFilterDelta::default()
        })
    }

    /// Debounced; the event arrives on the debouncer's sink.
    pub fn county_input(&mut self, text: &str) -> bool {
        self.county.on_input(text)
    }
}

/// Email list filter: a date range picker feeding the `emailFilter` slot.
pub struct EmailFilterPanel {
    picker: DateRangePicker,
}

impl EmailFilterPanel {
    pub fn new(defaults: DateRange) -> Self {
        Self {
            picker: DateRangePicker::new(defaults),
        }
    }

    /// Seeds the picker from the service's date range definition.
    pub async fn load(
        service: &dyn FilterDefinitionService,
        cache: &DefinitionCache,
    ) -> Result<Self> {
        Ok(Self::new(cache.date_range(service).await?))
    }

    pub fn picker(&self) -> &DateRangePicker {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut DateRangePicker {
        &mut self.picker
    }

    /// Converts a picker result into a filter event; invalid and partial
    /// ranges yield none.
    pub fn date_changed(change: &DateChange) -> Option<WidgetEvent> {
        let DateChange::Changed(range) = change else {
            return None;
        };
        Some(WidgetEvent::UniqueFilterChange {
            filter_name: FilterName::EmailFilter,
            delta: EntityFilterDelta::Email(EmailFilterDelta {
                date_range: Some(*range),
            }),
        })
    }
}

#[cfg(test)]
#[path = "tests/filters_tests.rs"]
mod tests;
