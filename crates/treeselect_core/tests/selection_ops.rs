use std::cell::RefCell;
use std::rc::Rc;
use treeselect_core::{
    IdentityResolver, ItemId, ItemTree, MemorySelectionStore, NotificationProxy, Position,
    PositionSelectionStore, PositionSet, SelectionError, SelectionEvent, SelectionSet,
    SelectionSynchronizer, StoreEvent, TreeViewModel,
};
use uuid::Uuid;

type EventLog = Rc<RefCell<Vec<SelectionEvent>>>;

struct Fixture {
    tree: Rc<RefCell<ItemTree>>,
    model: Rc<TreeViewModel>,
    sync: SelectionSynchronizer,
    items: Vec<ItemId>,
}

fn setup() -> Fixture {
    setup_with_store(MemorySelectionStore::new())
}

fn setup_with_store(store: impl PositionSelectionStore + 'static) -> Fixture {
    let tree = Rc::new(RefCell::new(ItemTree::new()));
    let items = {
        let mut tree = tree.borrow_mut();
        let root = tree.insert(None, "root").unwrap();
        let docs = tree.insert(Some(root), "docs").unwrap();
        let mut items = vec![root, docs];
        for index in 0..6 {
            items.push(tree.insert(Some(docs), format!("doc-{index}.txt")).unwrap());
        }
        items
    };
    let model = Rc::new(TreeViewModel::new(Rc::clone(&tree)));
    let sync = SelectionSynchronizer::new(model.clone(), store);
    Fixture {
        tree,
        model,
        sync,
        items,
    }
}

fn recording_proxy(sync: &SelectionSynchronizer, label: &str) -> (NotificationProxy, EventLog) {
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let proxy = sync.proxy(label, move |event| sink.borrow_mut().push(event.clone()));
    (proxy, log)
}

fn event_names(log: &EventLog) -> Vec<&'static str> {
    log.borrow().iter().map(SelectionEvent::name).collect()
}

#[test]
fn select_none_clears_but_extend_none_is_a_no_op() {
    let fx = setup();
    let (_proxy, log) = recording_proxy(&fx.sync, "view");
    fx.sync
        .set_selected_items([fx.items[2], fx.items[3]])
        .unwrap();

    log.borrow_mut().clear();
    fx.sync.extend_selection(None, false).unwrap();
    assert_eq!(
        fx.sync.selected_items(),
        SelectionSet::from([fx.items[2], fx.items[3]])
    );
    assert!(log.borrow().is_empty());

    fx.sync.select_item(None).unwrap();
    assert!(fx.sync.selected_items().is_empty());
    assert!(event_names(&log).contains(&"selected_items_changed"));
}

#[test]
fn extend_with_clear_behaves_like_select() {
    let fx = setup();
    fx.sync
        .set_selected_items([fx.items[2], fx.items[3]])
        .unwrap();

    fx.sync.extend_selection(Some(fx.items[4]), true).unwrap();
    assert_eq!(fx.sync.selected_items(), SelectionSet::from([fx.items[4]]));

    fx.sync.extend_selection(None, true).unwrap();
    assert!(fx.sync.selected_items().is_empty());
}

#[test]
fn selection_operations_leave_current_item_alone() {
    let fx = setup();
    fx.sync.set_current_item(Some(fx.items[2]), false).unwrap();

    fx.sync.select_item(Some(fx.items[3])).unwrap();
    fx.sync.extend_selection(Some(fx.items[4]), false).unwrap();
    fx.sync.set_selected_items([fx.items[5]]).unwrap();
    fx.sync.select_item(None).unwrap();

    assert_eq!(fx.sync.current_item(), Some(fx.items[2]));
}

#[test]
fn current_with_select_is_published_as_one_coherent_unit() {
    let fx = setup();
    let (x, y) = (fx.items[3], fx.items[6]);
    fx.sync.set_current_item(Some(y), true).unwrap();
    assert_eq!(fx.sync.selected_items(), SelectionSet::from([y]));
    assert_eq!(fx.sync.current_item(), Some(y));

    let snapshots: Rc<RefCell<Vec<(SelectionEvent, Option<ItemId>, SelectionSet)>>> =
        Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&snapshots);
    let reader = fx.sync.clone();
    let _proxy = fx.sync.proxy("observer", move |event| {
        sink.borrow_mut().push((
            event.clone(),
            reader.current_item(),
            reader.selected_items(),
        ));
    });

    fx.sync.set_current_item(Some(x), true).unwrap();

    let snapshots = snapshots.borrow();
    assert!(!snapshots.is_empty());
    for (event, current, selected) in snapshots.iter() {
        assert_eq!(*current, Some(x), "incoherent current during {event:?}");
        assert_eq!(
            *selected,
            SelectionSet::from([x]),
            "incoherent selection during {event:?}"
        );
    }

    let current_events: Vec<_> = snapshots
        .iter()
        .filter(|(event, _, _)| matches!(event, SelectionEvent::CurrentItemChanged { .. }))
        .map(|(event, _, _)| event.clone())
        .collect();
    assert_eq!(
        current_events,
        vec![SelectionEvent::CurrentItemChanged {
            current: Some(x),
            previous: Some(y),
        }]
    );

    let item_events: Vec<_> = snapshots
        .iter()
        .filter(|(event, _, _)| matches!(event, SelectionEvent::SelectedItemsChanged { .. }))
        .map(|(event, _, _)| event.clone())
        .collect();
    assert_eq!(
        item_events,
        vec![SelectionEvent::SelectedItemsChanged {
            items: SelectionSet::from([x]),
        }]
    );
}

#[test]
fn current_only_change_is_still_notified() {
    let fx = setup();
    fx.sync.select_item(Some(fx.items[2])).unwrap();
    let (_proxy, log) = recording_proxy(&fx.sync, "view");

    fx.sync.set_current_item(Some(fx.items[5]), false).unwrap();

    assert_eq!(
        event_names(&log),
        vec!["current_position_changed", "current_item_changed"]
    );
    assert_eq!(fx.sync.selected_items(), SelectionSet::from([fx.items[2]]));

    log.borrow_mut().clear();
    fx.sync.set_current_item(None, false).unwrap();
    assert_eq!(
        log.borrow().last(),
        Some(&SelectionEvent::CurrentItemChanged {
            current: None,
            previous: Some(fx.items[5]),
        })
    );
}

#[test]
fn unchanged_state_emits_nothing() {
    let fx = setup();
    fx.sync.set_current_item(Some(fx.items[2]), true).unwrap();
    let (_proxy, log) = recording_proxy(&fx.sync, "view");

    fx.sync.select_item(Some(fx.items[2])).unwrap();
    fx.sync.extend_selection(Some(fx.items[2]), false).unwrap();
    fx.sync.set_current_item(Some(fx.items[2]), true).unwrap();
    fx.sync.set_selected_items([fx.items[2], fx.items[2]]).unwrap();

    assert!(log.borrow().is_empty());
}

#[test]
fn unresolvable_identities_are_dropped_silently() {
    let fx = setup();
    let (a, b) = (fx.items[2], fx.items[3]);
    fx.tree.borrow_mut().remove(b).unwrap();
    let never_inserted = Uuid::new_v4();

    fx.sync.set_selected_items([a, b, never_inserted]).unwrap();
    assert_eq!(fx.sync.selected_items(), SelectionSet::from([a]));

    fx.sync.select_item(Some(never_inserted)).unwrap();
    assert!(fx.sync.selected_items().is_empty());

    fx.sync.set_current_item(Some(b), false).unwrap();
    assert_eq!(fx.sync.current_item(), None);
}

#[test]
fn set_then_read_round_trips() {
    let fx = setup();
    let wanted: SelectionSet = fx.items[1..7].iter().copied().collect();

    let mut with_duplicates: Vec<ItemId> = wanted.iter().rev().copied().collect();
    with_duplicates.extend(wanted.iter().take(3).copied());
    fx.sync.set_selected_items(with_duplicates).unwrap();

    assert_eq!(fx.sync.selected_items(), wanted);

    fx.sync.set_selected_items(Vec::new()).unwrap();
    assert!(fx.sync.selected_items().is_empty());
}

#[test]
fn handlers_see_the_recomputed_selection() {
    let fx = setup();
    let seen: Rc<RefCell<Vec<SelectionSet>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let reader = fx.sync.clone();
    let _proxy = fx.sync.proxy("reader", move |event| {
        if matches!(event, SelectionEvent::SelectionChanged) {
            sink.borrow_mut().push(reader.selected_items());
        }
    });

    fx.sync.select_item(Some(fx.items[2])).unwrap();
    fx.sync.extend_selection(Some(fx.items[4]), false).unwrap();
    fx.sync.select_item(None).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            SelectionSet::from([fx.items[2]]),
            SelectionSet::from([fx.items[2], fx.items[4]]),
            SelectionSet::new(),
        ]
    );
}

#[test]
fn position_events_precede_identity_events() {
    let fx = setup();
    let (_proxy, log) = recording_proxy(&fx.sync, "view");

    fx.sync.set_current_item(Some(fx.items[3]), true).unwrap();

    assert_eq!(
        event_names(&log),
        vec![
            "position_selection_changed",
            "current_position_changed",
            "selection_changed",
            "selected_items_changed",
            "current_item_changed",
        ]
    );
}

#[test]
fn view_edits_are_published_like_internal_ones() {
    let fx = setup();
    let (_proxy, log) = recording_proxy(&fx.sync, "view");
    let position = fx.model.position_of(fx.items[4]).unwrap();

    fx.sync.apply_view_edit(|store| {
        store.toggle(position);
        store.set_current(Some(position));
    });

    assert_eq!(fx.sync.selected_items(), SelectionSet::from([fx.items[4]]));
    assert_eq!(fx.sync.current_item(), Some(fx.items[4]));
    assert!(event_names(&log).contains(&"selected_items_changed"));
    assert!(event_names(&log).contains(&"current_item_changed"));

    log.borrow_mut().clear();
    let untouched = fx.sync.apply_view_edit(|store| store.selected_positions().len());
    assert_eq!(untouched, 1);
    assert!(log.borrow().is_empty());
}

#[test]
fn extra_columns_collapse_to_one_identity() {
    let tree = Rc::new(RefCell::new(ItemTree::new()));
    let item = tree.borrow_mut().insert(None, "wide").unwrap();
    let model = Rc::new(TreeViewModel::with_columns(Rc::clone(&tree), 3));
    let sync = SelectionSynchronizer::new(model.clone(), MemorySelectionStore::new());
    let position = model.position_of(item).unwrap();

    sync.apply_view_edit(|store| {
        let row: PositionSet = (0..3)
            .map(|column| Position::new(position.row(), column, position.generation()))
            .collect();
        store.replace_selection(row);
    });

    assert_eq!(sync.with_store(|store| store.selected_positions().len()), 3);
    assert_eq!(sync.selected_items(), SelectionSet::from([item]));
}

#[test]
fn model_reset_followed_by_store_clear_drops_everything() {
    let fx = setup();
    fx.sync.set_current_item(Some(fx.items[2]), true).unwrap();
    fx.sync.extend_selection(Some(fx.items[3]), false).unwrap();
    let (_proxy, log) = recording_proxy(&fx.sync, "view");

    fx.model.reset();
    fx.sync.apply_view_edit(|store| store.clear());

    assert!(fx.sync.selected_items().is_empty());
    assert_eq!(fx.sync.current_item(), None);
    assert!(log.borrow().contains(&SelectionEvent::CurrentItemChanged {
        current: None,
        previous: Some(fx.items[2]),
    }));

    fx.sync.select_item(Some(fx.items[3])).unwrap();
    assert_eq!(fx.sync.selected_items(), SelectionSet::from([fx.items[3]]));
    let generation = fx
        .sync
        .with_store(|store| store.selected_positions().iter().next().map(Position::generation));
    assert_eq!(generation, Some(fx.model.generation()));
}

/// Store that silently ignores additions.
#[derive(Default)]
struct IgnoresAdds(MemorySelectionStore);

impl PositionSelectionStore for IgnoresAdds {
    fn replace_selection(&mut self, positions: PositionSet) {
        self.0.replace_selection(positions);
    }
    fn add_to_selection(&mut self, _positions: PositionSet) {}
    fn selected_positions(&self) -> PositionSet {
        self.0.selected_positions()
    }
    fn set_current(&mut self, position: Option<Position>) {
        self.0.set_current(position);
    }
    fn current(&self) -> Option<Position> {
        self.0.current()
    }
    fn take_events(&mut self) -> Vec<StoreEvent> {
        self.0.take_events()
    }
}

#[test]
fn inconsistent_store_fails_fast() {
    let fx = setup_with_store(IgnoresAdds::default());
    let (_proxy, log) = recording_proxy(&fx.sync, "view");
    fx.sync.select_item(Some(fx.items[2])).unwrap();
    log.borrow_mut().clear();

    let err = fx
        .sync
        .extend_selection(Some(fx.items[3]), false)
        .unwrap_err();
    assert!(matches!(
        err,
        SelectionError::StoreInconsistent {
            operation: "extend_selection",
            ..
        }
    ));
    assert!(log.borrow().is_empty());
    assert_eq!(fx.sync.selected_items(), SelectionSet::from([fx.items[2]]));
}

#[test]
fn events_serialize_with_snake_case_tags() {
    let item = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();

    let json = serde_json::to_value(SelectionEvent::SelectedItemsChanged {
        items: SelectionSet::from([item]),
    })
    .unwrap();
    assert_eq!(json["event"], "selected_items_changed");
    assert_eq!(json["items"][0], item.to_string());

    let json = serde_json::to_value(SelectionEvent::CurrentItemChanged {
        current: Some(item),
        previous: None,
    })
    .unwrap();
    assert_eq!(json["event"], "current_item_changed");
    assert_eq!(json["current"], item.to_string());
    assert!(json["previous"].is_null());

    let json = serde_json::to_value(SelectionEvent::CurrentPositionChanged {
        current: Some(Position::new(3, 1, 2)),
        previous: None,
    })
    .unwrap();
    assert_eq!(json["current"]["row"], 3);
    assert_eq!(json["current"]["column"], 1);
    assert_eq!(json["current"]["generation"], 2);

    let json = serde_json::to_value(SelectionEvent::SelectionChanged).unwrap();
    assert_eq!(json, serde_json::json!({ "event": "selection_changed" }));
}

/// Store that silently ignores focus changes.
#[derive(Default)]
struct IgnoresCurrent(MemorySelectionStore);

impl PositionSelectionStore for IgnoresCurrent {
    fn replace_selection(&mut self, positions: PositionSet) {
        self.0.replace_selection(positions);
    }
    fn add_to_selection(&mut self, positions: PositionSet) {
        self.0.add_to_selection(positions);
    }
    fn selected_positions(&self) -> PositionSet {
        self.0.selected_positions()
    }
    fn set_current(&mut self, _position: Option<Position>) {}
    fn current(&self) -> Option<Position> {
        None
    }
    fn take_events(&mut self) -> Vec<StoreEvent> {
        self.0.take_events()
    }
}

#[test]
fn writes_applied_before_a_failure_are_still_published() {
    let fx = setup_with_store(IgnoresCurrent::default());
    let (_proxy, log) = recording_proxy(&fx.sync, "view");
    let target = fx.items[4];

    let err = fx.sync.set_current_item(Some(target), true).unwrap_err();

    assert!(matches!(
        err,
        SelectionError::StoreInconsistent {
            operation: "set_current_item",
            ..
        }
    ));
    assert_eq!(fx.sync.selected_items(), SelectionSet::from([target]));
    assert_eq!(fx.sync.current_item(), None);
    assert_eq!(
        event_names(&log),
        vec![
            "position_selection_changed",
            "selection_changed",
            "selected_items_changed",
        ]
    );
    assert!(log.borrow().contains(&SelectionEvent::SelectedItemsChanged {
        items: SelectionSet::from([target]),
    }));
}
