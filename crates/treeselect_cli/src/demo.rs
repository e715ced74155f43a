//! Demo session: one sample tree, one synchronizer, three bound views.
//!
//! # Responsibility
//! - Build the sample tree and bind views `v1`..`v3` through proxies.
//! - Execute parsed script lines, muting the issuing view when a line carries
//!   an `@vN` prefix.
//! - Render every delivered event as one JSON line tagged with its view.
//!
//! # Invariants
//! - Items are addressed by name or `/path` and rendered by path.
//! - After any tree structure change the model is reset and the synchronizer
//!   revalidated. Positions issued before the reset stay in the store but
//!   never resolve again.

use crate::script::{Command, ScriptError, ScriptLine};
use log::{debug, warn};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use treeselect_core::{
    ItemId, ItemTree, MemorySelectionStore, NotificationProxy, SelectionEvent,
    SelectionSynchronizer, TreeError, TreeViewModel,
};

const VIEW_COUNT: usize = 3;

type OutputBuffer = Rc<RefCell<Vec<String>>>;

pub struct Session {
    tree: Rc<RefCell<ItemTree>>,
    model: Rc<TreeViewModel>,
    sync: SelectionSynchronizer,
    views: Vec<NotificationProxy>,
    output: OutputBuffer,
}

impl Session {
    /// Builds the sample session. With `with_positions` the raw
    /// position-level events are rendered too.
    pub fn new(with_positions: bool) -> Result<Self, TreeError> {
        let tree = Rc::new(RefCell::new(sample_tree()?));
        let model = Rc::new(TreeViewModel::new(Rc::clone(&tree)));
        let sync = SelectionSynchronizer::new(model.clone(), MemorySelectionStore::new());
        let output: OutputBuffer = Rc::new(RefCell::new(Vec::new()));

        let views = (1..=VIEW_COUNT)
            .map(|index| {
                let label = format!("v{index}");
                let tree = Rc::clone(&tree);
                let output = Rc::clone(&output);
                let view = label.clone();
                sync.proxy(label, move |event| {
                    if !with_positions && !event.is_identity_event() {
                        return;
                    }
                    let rendered = render_event(&view, event, &tree.borrow());
                    output.borrow_mut().push(rendered.to_string());
                })
            })
            .collect();

        debug!(
            "event=demo_session module=cli status=ok items={} views={}",
            tree.borrow().len(),
            VIEW_COUNT
        );
        Ok(Self {
            tree,
            model,
            sync,
            views,
            output,
        })
    }

    /// Executes one line, as the issuing view when the line names one.
    pub fn execute(&self, line: &ScriptLine) -> Result<(), ScriptError> {
        let Some(index) = line.view else {
            return self.run(&self.sync, &line.command);
        };
        let proxy = self
            .views
            .get(index.wrapping_sub(1))
            .ok_or(ScriptError::UnknownView(index))?;
        let _mute = proxy.mute();
        let sync = proxy.synchronizer()?;
        self.run(&sync, &line.command)
    }

    /// Takes the rendered lines produced since the previous call.
    pub fn drain_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    fn run(&self, sync: &SelectionSynchronizer, command: &Command) -> Result<(), ScriptError> {
        match command {
            Command::Select(target) => sync.select_item(self.lookup_opt(target.as_deref())?)?,
            Command::Extend { target, clear } => {
                sync.extend_selection(self.lookup_opt(target.as_deref())?, *clear)?
            }
            Command::Set(names) => {
                let items = names
                    .iter()
                    .map(|name| self.lookup(name))
                    .collect::<Result<Vec<_>, _>>()?;
                sync.set_selected_items(items)?
            }
            Command::Current { target, select } => {
                sync.set_current_item(self.lookup_opt(target.as_deref())?, *select)?
            }
            Command::Remove(name) => {
                let item = self.lookup(name)?;
                let removed = self.tree.borrow_mut().remove(item)?;
                debug!(
                    "event=demo_remove module=cli status=ok item={} removed={}",
                    name,
                    removed.len()
                );
                self.rebuild(sync);
            }
            Command::Reset => self.rebuild(sync),
            Command::Show => self.show(sync),
        }
        Ok(())
    }

    fn rebuild(&self, sync: &SelectionSynchronizer) {
        self.model.reset();
        sync.revalidate();
    }

    fn show(&self, sync: &SelectionSynchronizer) {
        sync.dump_selected_items();
        let tree = self.tree.borrow();
        let selected: Vec<Value> = sync
            .selected_items()
            .iter()
            .map(|item| item_value(*item, &tree))
            .collect();
        let current = sync.current_item();
        let line = json!({
            "view": "session",
            "event": "state",
            "generation": self.model.generation(),
            "rows": self.model.row_count(),
            "current": optional_item(current, &tree),
            "current_selected": current.is_some_and(|item| sync.is_selected(item)),
            "selected": selected,
        });
        self.output.borrow_mut().push(line.to_string());
    }

    fn lookup(&self, name: &str) -> Result<ItemId, ScriptError> {
        self.tree
            .borrow()
            .find(name)
            .ok_or_else(|| ScriptError::UnknownItem(name.to_string()))
    }

    fn lookup_opt(&self, name: Option<&str>) -> Result<Option<ItemId>, ScriptError> {
        name.map(|name| self.lookup(name)).transpose()
    }
}

fn sample_tree() -> Result<ItemTree, TreeError> {
    let mut tree = ItemTree::new();
    let home = tree.insert(None, "home")?;
    let docs = tree.insert(Some(home), "docs")?;
    tree.insert(Some(docs), "report.txt")?;
    tree.insert(Some(docs), "notes.md")?;
    let photos = tree.insert(Some(home), "photos")?;
    tree.insert(Some(photos), "img-2019.jpg")?;
    tree.insert(Some(photos), "img-2020.jpg")?;
    let var = tree.insert(None, "var")?;
    let log = tree.insert(Some(var), "log")?;
    tree.insert(Some(log), "syslog")?;
    Ok(tree)
}

/// Path of `item`, or its raw id once it left the tree.
fn item_value(item: ItemId, tree: &ItemTree) -> Value {
    Value::String(tree.path_of(item).unwrap_or_else(|| item.to_string()))
}

fn optional_item(item: Option<ItemId>, tree: &ItemTree) -> Value {
    item.map_or(Value::Null, |item| item_value(item, tree))
}

fn render_event(view: &str, event: &SelectionEvent, tree: &ItemTree) -> Value {
    match event {
        SelectionEvent::SelectionChanged => json!({ "view": view, "event": event.name() }),
        SelectionEvent::SelectedItemsChanged { items } => json!({
            "view": view,
            "event": event.name(),
            "items": items.iter().map(|item| item_value(*item, tree)).collect::<Vec<_>>(),
        }),
        SelectionEvent::CurrentItemChanged { current, previous } => json!({
            "view": view,
            "event": event.name(),
            "current": optional_item(*current, tree),
            "previous": optional_item(*previous, tree),
        }),
        SelectionEvent::PositionSelectionChanged { .. }
        | SelectionEvent::CurrentPositionChanged { .. } => match serde_json::to_value(event) {
            Ok(Value::Object(mut fields)) => {
                fields.insert("view".to_string(), Value::from(view));
                Value::Object(fields)
            }
            Ok(other) => other,
            Err(err) => {
                warn!(
                    "event=demo_render module=cli status=error kind={} error={}",
                    event.name(),
                    err
                );
                json!({ "view": view, "event": event.name() })
            }
        },
    }
}
