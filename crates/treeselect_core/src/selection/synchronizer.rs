//! Selection synchronizer between position-based and identity-based views.
//!
//! # Responsibility
//! - Translate identity-level selection commands into position-store writes.
//! - Translate the store's position-level change events back into
//!   identity-level events and fan them out to every bound proxy.
//! - Own the dirty-flag cache that maps the store's selection to identities.
//!
//! # Invariants
//! - Store writes complete, then the cache is invalidated, then events are
//!   emitted. Handlers never observe a stale cache.
//! - Every event of one operation is emitted after the whole operation was
//!   applied, so no observer sees the new current item with the old
//!   selection or the reverse.
//! - Writes that leave the store unchanged emit nothing.
//! - No `RefCell` borrow is held while observers run, so handlers may read
//!   or mutate the selection re-entrantly.
//! - Events published from inside a handler are queued and delivered after
//!   the running broadcast, so the last payload every observer receives
//!   matches the final state.
//! - Items that left the domain tree are never reported as selected or
//!   current.

use crate::model::item::{ItemId, SelectionSet};
use crate::model::position::{Position, PositionSet};
use crate::selection::cache::SelectionCache;
use crate::selection::error::{SelectionError, SelectionResult};
use crate::selection::event::SelectionEvent;
use crate::selection::proxy::{NotificationProxy, ProxyCore};
use crate::selection::resolver::IdentityResolver;
use crate::selection::store::{PositionSelectionStore, StoreEvent};
use log::{debug, error, trace};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

/// Shared state behind every `SelectionSynchronizer` handle.
pub(crate) struct SyncCore {
    resolver: Rc<dyn IdentityResolver>,
    store: RefCell<Box<dyn PositionSelectionStore>>,
    cache: RefCell<SelectionCache>,
    current_item: Cell<Option<ItemId>>,
    proxies: RefCell<Vec<Weak<ProxyCore>>>,
    dispatching: Cell<bool>,
    queued: RefCell<VecDeque<Broadcast>>,
}

/// Events of one operation and every live proxy with its mute state at the
/// time the operation was published.
struct Broadcast {
    events: Vec<SelectionEvent>,
    recipients: Vec<(Rc<ProxyCore>, bool)>,
}

/// Ends a dispatch loop, unwinding included.
struct DispatchGuard<'a> {
    core: &'a SyncCore,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.core.queued.borrow_mut().clear();
        self.core.dispatching.set(false);
    }
}

/// Central authority over one view binding's selection.
///
/// Cloning creates another handle to the same synchronizer. All handles and
/// proxies must stay on one thread.
#[derive(Clone)]
pub struct SelectionSynchronizer {
    core: Rc<SyncCore>,
}

/// One write issued to the position store.
enum StoreWrite {
    Replace(PositionSet),
    Add(PositionSet),
    Current(Option<Position>),
}

impl StoreWrite {
    fn apply(&self, store: &mut dyn PositionSelectionStore) {
        match self {
            Self::Replace(positions) => store.replace_selection(positions.clone()),
            Self::Add(positions) => store.add_to_selection(positions.clone()),
            Self::Current(position) => store.set_current(*position),
        }
    }

    /// Checks the store now reflects this write.
    fn verify(&self, store: &dyn PositionSelectionStore) -> Result<(), String> {
        match self {
            Self::Replace(expected) => {
                let actual = store.selected_positions();
                if actual != *expected {
                    return Err(format!(
                        "replaced {} positions, store holds {}",
                        expected.len(),
                        actual.len()
                    ));
                }
            }
            Self::Add(added) => {
                let actual = store.selected_positions();
                let missing = added.difference(&actual).count();
                if missing > 0 {
                    return Err(format!("{missing} added positions missing from store"));
                }
            }
            Self::Current(expected) => {
                let actual = store.current();
                if actual != *expected {
                    return Err(format!(
                        "current set to {}, store reports {}",
                        describe_position(*expected),
                        describe_position(actual)
                    ));
                }
            }
        }
        Ok(())
    }
}

impl SelectionSynchronizer {
    /// Binds a synchronizer to one resolver and one position store.
    ///
    /// Events already queued in `store` are discarded; the initial current
    /// item is resolved from the store's current position.
    pub fn new(
        resolver: Rc<dyn IdentityResolver>,
        store: impl PositionSelectionStore + 'static,
    ) -> Self {
        let mut store: Box<dyn PositionSelectionStore> = Box::new(store);
        let discarded = store.take_events().len();
        let current_item = store
            .current()
            .and_then(|position| resolver.item_at(position));

        debug!(
            "event=selection_bind module=selection status=ok discarded_events={} current={}",
            discarded,
            describe_item(current_item)
        );

        Self {
            core: Rc::new(SyncCore {
                resolver,
                store: RefCell::new(store),
                cache: RefCell::new(SelectionCache::new()),
                current_item: Cell::new(current_item),
                proxies: RefCell::new(Vec::new()),
                dispatching: Cell::new(false),
                queued: RefCell::new(VecDeque::new()),
            }),
        }
    }

    pub(crate) fn from_core(core: Rc<SyncCore>) -> Self {
        Self { core }
    }

    pub(crate) fn downgrade(&self) -> Weak<SyncCore> {
        Rc::downgrade(&self.core)
    }

    pub(crate) fn attach(&self, proxy: &Rc<ProxyCore>) {
        self.core.proxies.borrow_mut().push(Rc::downgrade(proxy));
    }

    /// Creates a proxy bound to this synchronizer.
    pub fn proxy(
        &self,
        label: impl Into<String>,
        handler: impl Fn(&SelectionEvent) + 'static,
    ) -> NotificationProxy {
        NotificationProxy::new(self, label, handler)
    }

    /// Number of proxies that are still alive.
    pub fn proxy_count(&self) -> usize {
        self.core
            .proxies
            .borrow()
            .iter()
            .filter(|proxy| proxy.strong_count() > 0)
            .count()
    }

    /// Shared resolver handle this binding translates through.
    pub fn resolver(&self) -> Rc<dyn IdentityResolver> {
        Rc::clone(&self.core.resolver)
    }

    /// Replaces the selection with `item` alone.
    ///
    /// `None`, or an item that does not resolve, clears the selection.
    /// The current item is not changed.
    pub fn select_item(&self, item: Option<ItemId>) -> SelectionResult<()> {
        let positions = item
            .and_then(|id| self.position_of(id))
            .into_iter()
            .collect();
        self.commit("select_item", vec![StoreWrite::Replace(positions)])
    }

    /// Adds `item` to the selection.
    ///
    /// With `clear` this is `select_item`. Without it, `None` or an
    /// unresolvable item leaves the selection untouched. The current item is
    /// not changed.
    pub fn extend_selection(&self, item: Option<ItemId>, clear: bool) -> SelectionResult<()> {
        if clear {
            return self.select_item(item);
        }
        let Some(position) = item.and_then(|id| self.position_of(id)) else {
            debug!(
                "event=selection_extend module=selection status=skipped item={}",
                describe_item(item)
            );
            return Ok(());
        };
        self.commit(
            "extend_selection",
            vec![StoreWrite::Add(PositionSet::from([position]))],
        )
    }

    /// Replaces the selection with exactly `items`.
    ///
    /// Duplicates collapse; items that do not resolve are dropped.
    pub fn set_selected_items(
        &self,
        items: impl IntoIterator<Item = ItemId>,
    ) -> SelectionResult<()> {
        let mut requested = 0usize;
        let mut positions = PositionSet::new();
        for item in items {
            requested += 1;
            if let Some(position) = self.position_of(item) {
                positions.insert(position);
            }
        }
        if positions.len() < requested {
            debug!(
                "event=selection_set module=selection status=partial requested={} resolved={}",
                requested,
                positions.len()
            );
        }
        self.commit("set_selected_items", vec![StoreWrite::Replace(positions)])
    }

    /// Makes `item` the current item.
    ///
    /// With `select`, the selection is also replaced with `{item}` and both
    /// changes are published as one unit.
    pub fn set_current_item(&self, item: Option<ItemId>, select: bool) -> SelectionResult<()> {
        let position = item.and_then(|id| self.position_of(id));
        let mut writes = Vec::with_capacity(2);
        if select {
            writes.push(StoreWrite::Replace(position.into_iter().collect()));
        }
        writes.push(StoreWrite::Current(position));
        self.commit("set_current_item", writes)
    }

    /// Currently selected items.
    pub fn selected_items(&self) -> SelectionSet {
        let store = self.core.store.borrow();
        let mut cache = self.core.cache.borrow_mut();
        let resolver = &*self.core.resolver;
        cache
            .get(&**store, resolver)
            .iter()
            .copied()
            .filter(|item| resolver.exists(*item))
            .collect()
    }

    pub fn is_selected(&self, item: ItemId) -> bool {
        let store = self.core.store.borrow();
        let mut cache = self.core.cache.borrow_mut();
        let resolver = &*self.core.resolver;
        cache.get(&**store, resolver).contains(&item) && resolver.exists(item)
    }

    /// Item holding the focus, if any.
    pub fn current_item(&self) -> Option<ItemId> {
        self.core
            .current_item
            .get()
            .filter(|item| self.core.resolver.exists(*item))
    }

    /// Re-resolves the selection and the current item after the domain tree
    /// or the view model changed without a store write, such as an item
    /// removal or a model reset, and publishes any identity-level difference.
    ///
    /// Only identity events are emitted; the store is left untouched.
    pub fn revalidate(&self) {
        let before = self.core.cache.borrow().last_computed().clone();
        let previous_item = self.core.current_item.get();
        self.core.cache.borrow_mut().invalidate();
        self.resync_current();

        let current_item = self.core.current_item.get();
        let items = self.selected_items();
        let selection_changed = items != before;
        let current_changed = current_item != previous_item;
        debug!(
            "event=selection_revalidate module=selection status=ok selection_changed={} current_changed={} selected={}",
            selection_changed,
            current_changed,
            items.len()
        );

        let mut events = Vec::with_capacity(3);
        if selection_changed {
            events.push(SelectionEvent::SelectionChanged);
            events.push(SelectionEvent::SelectedItemsChanged { items });
        }
        if current_changed {
            events.push(SelectionEvent::CurrentItemChanged {
                current: current_item,
                previous: previous_item,
            });
        }
        self.dispatch(events);
    }

    /// Number of times the selection cache walked the store.
    pub fn cache_recomputations(&self) -> u64 {
        self.core.cache.borrow().recomputations()
    }

    /// Read-only access to the position store.
    pub fn with_store<R>(&self, read: impl FnOnce(&dyn PositionSelectionStore) -> R) -> R {
        let store = self.core.store.borrow();
        read(&**store)
    }

    /// Runs an edit the view framework performs on the store directly, such
    /// as a click in a tree view, then publishes whatever it changed.
    ///
    /// `edit` must not call back into this synchronizer.
    pub fn apply_view_edit<R>(&self, edit: impl FnOnce(&mut dyn PositionSelectionStore) -> R) -> R {
        let (result, events) = {
            let mut store = self.core.store.borrow_mut();
            let result = edit(&mut **store);
            (result, store.take_events())
        };
        if !events.is_empty() {
            self.core.cache.borrow_mut().invalidate();
            debug!(
                "event=selection_view_edit module=selection status=ok store_events={}",
                events.len()
            );
        }
        self.publish(events);
        result
    }

    /// Logs the current item and every selected item at debug level.
    pub fn dump_selected_items(&self) {
        let items = self.selected_items();
        debug!(
            "event=selection_dump module=selection current={} selected={}",
            describe_item(self.current_item()),
            items.len()
        );
        for item in &items {
            debug!("event=selection_dump_item module=selection item={item}");
        }
    }

    fn position_of(&self, item: ItemId) -> Option<Position> {
        if !self.core.resolver.exists(item) {
            return None;
        }
        self.core.resolver.position_of(item)
    }

    fn commit(&self, operation: &'static str, writes: Vec<StoreWrite>) -> SelectionResult<()> {
        let (events, violation) = {
            let mut store = self.core.store.borrow_mut();
            let mut violation = None;
            for write in &writes {
                write.apply(&mut **store);
                if let Err(detail) = write.verify(&**store) {
                    violation = Some(detail);
                    break;
                }
            }
            (store.take_events(), violation)
        };
        self.core.cache.borrow_mut().invalidate();

        if let Some(detail) = violation {
            error!(
                "event=selection_commit module=selection status=error op={} applied_events={} detail={}",
                operation,
                events.len(),
                detail
            );
            // Writes that did land stay in the store; observers follow them.
            self.publish(events);
            self.revalidate();
            return Err(SelectionError::StoreInconsistent { operation, detail });
        }

        debug!(
            "event=selection_commit module=selection status=ok op={} store_events={}",
            operation,
            events.len()
        );
        self.publish(events);
        Ok(())
    }

    /// Applies store events to the cached state, then emits them.
    fn publish(&self, events: Vec<StoreEvent>) {
        if events.is_empty() {
            return;
        }

        let previous_item = self.core.current_item.get();
        let mut selection_changed = false;
        let mut current_changed = false;
        for event in &events {
            match event {
                StoreEvent::SelectionChanged { .. } => selection_changed = true,
                StoreEvent::CurrentChanged { current, .. } => {
                    current_changed = true;
                    self.core.current_item.set(self.item_at(*current));
                }
            }
        }
        if selection_changed {
            self.core.cache.borrow_mut().invalidate();
        }
        let current_item = self.core.current_item.get();

        let mut outgoing: Vec<SelectionEvent> = events.iter().map(SelectionEvent::from).collect();
        if selection_changed {
            outgoing.push(SelectionEvent::SelectionChanged);
            outgoing.push(SelectionEvent::SelectedItemsChanged {
                items: self.selected_items(),
            });
        }
        if current_changed {
            outgoing.push(SelectionEvent::CurrentItemChanged {
                current: current_item,
                previous: previous_item,
            });
        }
        self.dispatch(outgoing);
    }

    /// Delivers `events` to every live proxy, or queues them behind the
    /// broadcast already running when called from inside a handler.
    fn dispatch(&self, events: Vec<SelectionEvent>) {
        if events.is_empty() {
            return;
        }
        let recipients = self
            .live_proxies()
            .into_iter()
            .map(|proxy| {
                let muted = proxy.is_muted();
                (proxy, muted)
            })
            .collect();
        self.core
            .queued
            .borrow_mut()
            .push_back(Broadcast { events, recipients });

        if self.core.dispatching.replace(true) {
            trace!(
                "event=selection_dispatch module=selection status=deferred queued={}",
                self.core.queued.borrow().len()
            );
            return;
        }
        let _guard = DispatchGuard { core: &self.core };
        loop {
            let next = self.core.queued.borrow_mut().pop_front();
            let Some(broadcast) = next else {
                break;
            };
            for event in &broadcast.events {
                for (proxy, muted) in &broadcast.recipients {
                    proxy.deliver(event, *muted);
                }
            }
        }
    }

    fn resync_current(&self) {
        let position = self.core.store.borrow().current();
        self.core.current_item.set(self.item_at(position));
    }

    fn item_at(&self, position: Option<Position>) -> Option<ItemId> {
        let resolver = &*self.core.resolver;
        position
            .and_then(|position| resolver.item_at(position))
            .filter(|item| resolver.exists(*item))
    }

    /// Prunes dropped proxies and returns strong handles to the rest.
    fn live_proxies(&self) -> Vec<Rc<ProxyCore>> {
        let mut proxies = self.core.proxies.borrow_mut();
        proxies.retain(|proxy| proxy.strong_count() > 0);
        proxies.iter().filter_map(Weak::upgrade).collect()
    }
}

impl Debug for SelectionSynchronizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionSynchronizer")
            .field("current_item", &self.core.current_item.get())
            .field("cache", &self.core.cache.borrow())
            .field("proxies", &self.proxy_count())
            .finish()
    }
}

fn describe_item(item: Option<ItemId>) -> String {
    item.map_or_else(|| "none".to_string(), |id| id.to_string())
}

fn describe_position(position: Option<Position>) -> String {
    position.map_or_else(|| "none".to_string(), |position| position.to_string())
}
