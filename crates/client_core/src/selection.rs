use std::collections::BTreeSet;

use shared::{
    domain::{RecordId, RecordView},
    protocol::WidgetEvent,
};

pub type SelectionSet = BTreeSet<RecordId>;

pub fn selection_of(records: &[RecordView]) -> SelectionSet {
    records.iter().filter_map(RecordView::id).collect()
}

/// Sets each record's `selected` flag from its membership in `selection`.
pub fn mark_selection(records: &mut [RecordView], selection: &SelectionSet) {
    for record in records {
        let selected = record.id().is_some_and(|id| selection.contains(&id));
        record.set_selected(selected);
    }
}

/// True when the page is non-empty and every row is checked.
pub fn all_selected(records: &[RecordView]) -> bool {
    !records.is_empty() && records.iter().all(RecordView::is_selected)
}

/// Row checkbox toggled in a list.
pub fn select(records: &[RecordView], id: &RecordId, checked: bool) -> WidgetEvent {
    selection_event(records, vec![id.clone()], checked)
}

/// Header checkbox toggled; only rows whose state actually changes are sent.
pub fn select_all(records: &[RecordView], checked: bool) -> Option<WidgetEvent> {
    let changed: Vec<RecordId> = records
        .iter()
        .filter(|record| record.is_selected() != checked)
        .filter_map(RecordView::id)
        .collect();
    if changed.is_empty() {
        return None;
    }
    Some(selection_event(records, changed, checked))
}

fn selection_event(records: &[RecordView], changed: Vec<RecordId>, checked: bool) -> WidgetEvent {
    if checked {
        let records = records
            .iter()
            .filter(|record| record.id().is_some_and(|id| changed.contains(&id)))
            .cloned()
            .collect();
        WidgetEvent::SelectionAdded { records }
    } else {
        WidgetEvent::SelectionRemoved { ids: changed }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountTrend {
    Unchanged,
    Increase,
    Decrease,
}

/// Records picked across pages, shown as a cart next to the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionCart {
    records: Vec<RecordView>,
}

impl SelectionCart {
    pub fn records(&self) -> &[RecordView] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn set_records(&mut self, records: Vec<RecordView>) -> CountTrend {
        let trend = match records.len().cmp(&self.records.len()) {
            std::cmp::Ordering::Equal => CountTrend::Unchanged,
            std::cmp::Ordering::Greater => CountTrend::Increase,
            std::cmp::Ordering::Less => CountTrend::Decrease,
        };
        self.records = records;
        trend
    }

    /// Applies a list selection event; records already in the cart are kept once.
    pub fn apply(&mut self, event: &WidgetEvent) -> CountTrend {
        let mut records = self.records.clone();
        match event {
            WidgetEvent::SelectionAdded { records: added } => {
                let mut present = selection_of(&records);
                for record in added {
                    if let Some(id) = record.id() {
                        if present.insert(id) {
                            records.push(record.clone());
                        }
                    }
                }
            }
            WidgetEvent::SelectionRemoved { ids } => {
                records.retain(|record| record.id().map_or(true, |id| !ids.contains(&id)));
            }
            _ => return CountTrend::Unchanged,
        }
        self.set_records(records)
    }

    /// Cart row removed by the user.
    pub fn remove(&self, id: &RecordId) -> WidgetEvent {
        WidgetEvent::SelectionRemoved {
            ids: vec![id.clone()],
        }
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
