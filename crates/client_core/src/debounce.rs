use std::time::Duration;

use shared::{
    domain::FilterName,
    protocol::{
        is_searchable, ContactFilterDelta, EntityFilterDelta, GeneralFilterDelta, WidgetEvent,
    },
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

/// Coalesces keystrokes into one delayed [`WidgetEvent`].
///
/// Every input cancels the pending timer. Single-character input is dropped
/// without re-arming because the free-text search rejects one-letter tokens.
pub struct SearchDebouncer {
    delay: Duration,
    sink: mpsc::UnboundedSender<WidgetEvent>,
    make_event: fn(String) -> WidgetEvent,
    pending: Option<JoinHandle<()>>,
}

impl SearchDebouncer {
    pub fn new(
        delay: Duration,
        sink: mpsc::UnboundedSender<WidgetEvent>,
        make_event: fn(String) -> WidgetEvent,
    ) -> Self {
        Self {
            delay,
            sink,
            make_event,
            pending: None,
        }
    }

    /// General search box: new text and back to the first page.
    pub fn general_search(delay: Duration, sink: mpsc::UnboundedSender<WidgetEvent>) -> Self {
        Self::new(delay, sink, |text| WidgetEvent::GeneralFilterChange {
            delta: GeneralFilterDelta::search(text),
        })
    }

    pub fn county_search(delay: Duration, sink: mpsc::UnboundedSender<WidgetEvent>) -> Self {
        Self::new(delay, sink, |text| WidgetEvent::UniqueFilterChange {
            filter_name: FilterName::ContactFilter,
            delta: EntityFilterDelta::Contact(ContactFilterDelta {
                county: Some((!text.is_empty()).then_some(text)),
                ..ContactFilterDelta::default()
            }),
        })
    }

    /// Returns whether a timer was armed for `text`.
    pub fn on_input(&mut self, text: &str) -> bool {
        self.cancel();

        if !is_searchable(text) {
            debug!("search: dropping single-character input");
            return false;
        }

        let event = (self.make_event)(text.to_string());
        let sink = self.sink.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sink.send(event).is_err() {
                warn!("search: event receiver dropped before debounce fired");
            }
        }));
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
