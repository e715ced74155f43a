//! In-memory domain tree.
//!
//! # Responsibility
//! - Hold named items with parent/child links for standalone bindings,
//!   demos and tests.
//! - Answer the existence checks identity resolution depends on.
//!
//! # Invariants
//! - Every child id listed under a parent exists in the tree.
//! - Sibling order is insertion order unless changed by `move_item`.
//! - Moves never create parent-child cycles.
//! - Removing an item removes its whole subtree.

use crate::model::item::ItemId;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from domain tree edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Item name is blank after trim.
    InvalidName,
    /// Target item does not exist.
    ItemNotFound(ItemId),
    /// Parent item does not exist.
    ParentNotFound(ItemId),
    /// Caller-provided id is already in use.
    DuplicateId(ItemId),
    /// Move would place an item below itself.
    CycleDetected { item: ItemId, parent: ItemId },
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "item name must not be blank"),
            Self::ItemNotFound(id) => write!(f, "tree item not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "tree parent not found: {id}"),
            Self::DuplicateId(id) => write!(f, "tree item id already in use: {id}"),
            Self::CycleDetected { item, parent } => {
                write!(f, "move would create cycle: item {item} under parent {parent}")
            }
        }
    }
}

impl Error for TreeError {}

/// One node of the domain tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    /// Stable identity.
    pub id: ItemId,
    /// User-facing label, unique only by convention.
    pub name: String,
    /// Parent id. `None` means top-level item.
    pub parent: Option<ItemId>,
    children: Vec<ItemId>,
}

impl TreeItem {
    /// Child ids in sibling order.
    pub fn children(&self) -> &[ItemId] {
        &self.children
    }
}

/// Hierarchical item store keyed by identity.
#[derive(Debug, Default)]
pub struct ItemTree {
    items: HashMap<ItemId, TreeItem>,
    roots: Vec<ItemId>,
}

impl ItemTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn get(&self, id: ItemId) -> Option<&TreeItem> {
        self.items.get(&id)
    }

    /// Inserts one item with a generated id under optional parent.
    pub fn insert(
        &mut self,
        parent: Option<ItemId>,
        name: impl Into<String>,
    ) -> Result<ItemId, TreeError> {
        self.insert_with_id(Uuid::new_v4(), parent, name)
    }

    /// Inserts one item with a caller-provided id.
    ///
    /// Used where identity already exists outside this tree.
    pub fn insert_with_id(
        &mut self,
        id: ItemId,
        parent: Option<ItemId>,
        name: impl Into<String>,
    ) -> Result<ItemId, TreeError> {
        let name = normalize_name(name.into())?;
        if self.items.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        match parent {
            Some(parent_id) => self
                .items
                .get_mut(&parent_id)
                .ok_or(TreeError::ParentNotFound(parent_id))?
                .children
                .push(id),
            None => self.roots.push(id),
        }
        self.items.insert(
            id,
            TreeItem {
                id,
                name,
                parent,
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Lists direct children of optional parent. `None` lists top-level items.
    pub fn children(&self, parent: Option<ItemId>) -> &[ItemId] {
        match parent {
            Some(parent_id) => self
                .items
                .get(&parent_id)
                .map(|item| item.children.as_slice())
                .unwrap_or(&[]),
            None => &self.roots,
        }
    }

    /// Removes one item and its whole subtree.
    ///
    /// Returns removed ids in preorder, starting with `id`.
    pub fn remove(&mut self, id: ItemId) -> Result<Vec<ItemId>, TreeError> {
        let parent = self.items.get(&id).ok_or(TreeError::ItemNotFound(id))?.parent;
        self.detach(id, parent);

        let removed = self.subtree(id);
        for removed_id in &removed {
            self.items.remove(removed_id);
        }
        Ok(removed)
    }

    /// Moves one item to the end of another parent's children.
    pub fn move_item(&mut self, id: ItemId, new_parent: Option<ItemId>) -> Result<(), TreeError> {
        let old_parent = self.items.get(&id).ok_or(TreeError::ItemNotFound(id))?.parent;

        if let Some(parent_id) = new_parent {
            if !self.items.contains_key(&parent_id) {
                return Err(TreeError::ParentNotFound(parent_id));
            }
            if self.would_create_cycle(id, parent_id) {
                return Err(TreeError::CycleDetected {
                    item: id,
                    parent: parent_id,
                });
            }
        }

        self.detach(id, old_parent);
        match new_parent {
            Some(parent_id) => {
                if let Some(parent) = self.items.get_mut(&parent_id) {
                    parent.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        if let Some(item) = self.items.get_mut(&id) {
            item.parent = new_parent;
        }
        Ok(())
    }

    /// All item ids in depth-first preorder.
    pub fn preorder(&self) -> Vec<ItemId> {
        let mut out = Vec::with_capacity(self.items.len());
        for root in &self.roots {
            self.walk(*root, &mut out);
        }
        out
    }

    /// Slash-separated path of names from the top level down to `id`.
    pub fn path_of(&self, id: ItemId) -> Option<String> {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let item = self.items.get(&current)?;
            names.push(item.name.as_str());
            cursor = item.parent;
        }
        names.reverse();
        Some(format!("/{}", names.join("/")))
    }

    /// Finds an item by `/a/b/c` path or, failing that, by first name match
    /// in preorder.
    pub fn find(&self, query: &str) -> Option<ItemId> {
        let query = query.trim();
        if query.starts_with('/') {
            return self.find_by_path(query);
        }
        self.preorder()
            .into_iter()
            .find(|id| self.items.get(id).is_some_and(|item| item.name == query))
    }

    fn find_by_path(&self, path: &str) -> Option<ItemId> {
        let mut parent = None;
        let mut found = None;
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            let next = self
                .children(parent)
                .iter()
                .copied()
                .find(|id| self.items.get(id).is_some_and(|item| item.name == segment))?;
            parent = Some(next);
            found = Some(next);
        }
        found
    }

    fn walk(&self, id: ItemId, out: &mut Vec<ItemId>) {
        let Some(item) = self.items.get(&id) else {
            return;
        };
        out.push(id);
        for child in &item.children {
            self.walk(*child, out);
        }
    }

    fn subtree(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        self.walk(id, &mut out);
        out
    }

    fn detach(&mut self, id: ItemId, parent: Option<ItemId>) {
        match parent {
            Some(parent_id) => {
                if let Some(parent) = self.items.get_mut(&parent_id) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
    }

    fn would_create_cycle(&self, id: ItemId, candidate_parent: ItemId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent);
        while let Some(current) = cursor {
            if current == id || !visited.insert(current) {
                return true;
            }
            cursor = self.items.get(&current).and_then(|item| item.parent);
        }
        false
    }
}

fn normalize_name(value: String) -> Result<String, TreeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TreeError::InvalidName);
    }
    Ok(trimmed.to_string())
}
