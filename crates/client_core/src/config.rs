use std::time::Duration;

use shared::protocol::CREATED_DATE;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Per-container tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Quiet period before a search input is sent.
    pub search_debounce: Duration,
    /// Order-by field that defaults to descending.
    pub recency_field: String,
    pub event_capacity: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            recency_field: CREATED_DATE.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
