use super::*;
use crate::support::record;

fn page() -> Vec<RecordView> {
    vec![record("c-1", "Ada"), record("c-2", "Grace"), record("c-3", "Linus")]
}

fn ids(values: &[&str]) -> Vec<RecordId> {
    values.iter().map(|value| RecordId::new(*value)).collect()
}

#[test]
fn mark_selection_checks_members_only() {
    let mut records = page();
    let selection = ids(&["c-2"]).into_iter().collect();
    mark_selection(&mut records, &selection);

    let flags: Vec<bool> = records.iter().map(RecordView::is_selected).collect();
    assert_eq!(flags, [false, true, false]);
    assert!(!all_selected(&records));
}

#[test]
fn all_selected_is_false_for_an_empty_page() {
    assert!(!all_selected(&[]));
}

#[test]
fn select_builds_added_and_removed_events() {
    let records = page();
    let added = select(&records, &RecordId::new("c-1"), true);
    assert_eq!(
        added,
        WidgetEvent::SelectionAdded {
            records: vec![records[0].clone()],
        }
    );

    let removed = select(&records, &RecordId::new("c-1"), false);
    assert_eq!(
        removed,
        WidgetEvent::SelectionRemoved {
            ids: ids(&["c-1"]),
        }
    );
}

#[test]
fn select_all_sends_only_changed_rows() {
    let mut records = page();
    records[1].set_selected(true);

    let Some(WidgetEvent::SelectionAdded { records: added }) = select_all(&records, true) else {
        panic!("expected selection-added");
    };
    let added: Vec<_> = added.iter().filter_map(RecordView::id).collect();
    assert_eq!(added, ids(&["c-1", "c-3"]));

    assert_eq!(
        select_all(&records, false),
        Some(WidgetEvent::SelectionRemoved { ids: ids(&["c-2"]) })
    );

    mark_selection(&mut records, &selection_of(&page()));
    assert!(all_selected(&records));
    assert_eq!(select_all(&records, true), None);
}

#[test]
fn cart_dedupes_and_reports_trend() {
    let mut cart = SelectionCart::default();
    let records = page();

    let trend = cart.apply(&WidgetEvent::SelectionAdded {
        records: records[..2].to_vec(),
    });
    assert_eq!(trend, CountTrend::Increase);
    assert_eq!(cart.len(), 2);

    let trend = cart.apply(&WidgetEvent::SelectionAdded {
        records: vec![records[1].clone()],
    });
    assert_eq!(trend, CountTrend::Unchanged);
    assert_eq!(cart.len(), 2);

    let removal = cart.remove(&RecordId::new("c-1"));
    assert_eq!(cart.apply(&removal), CountTrend::Decrease);
    assert_eq!(cart.records()[0].id(), Some(RecordId::new("c-2")));
}

#[test]
fn cart_ignores_non_selection_events() {
    let mut cart = SelectionCart::default();
    assert_eq!(
        cart.apply(&WidgetEvent::PageTurn { current_page: 2 }),
        CountTrend::Unchanged
    );
    assert!(cart.is_empty());
}
