use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A node of the tag hierarchy as delivered by the tags endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNode {
    pub key: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub children: BTreeMap<String, TagNode>,
}

impl TagNode {
    pub fn leaf(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            active: false,
            children: BTreeMap::new(),
        }
    }

    pub fn with_child(mut self, child: TagNode) -> Self {
        self.children.insert(child.key.clone(), child);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    pub key: String,
    pub active: bool,
}

/// Flat tag filter list, at most one entry per key, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TagFilter>", into = "Vec<TagFilter>")]
pub struct TagFilters {
    entries: Vec<TagFilter>,
    index: HashMap<String, usize>,
}

impl TagFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key` if unseen, otherwise updates the existing entry in place.
    pub fn upsert(&mut self, key: &str, active: bool) {
        match self.index.get(key) {
            Some(&ix) => self.entries[ix].active = active,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(TagFilter {
                    key: key.to_string(),
                    active,
                });
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&TagFilter> {
        self.index.get(key).map(|&ix| &self.entries[ix])
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.get(key).is_some_and(|f| f.active)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagFilter> {
        self.entries.iter()
    }

    pub fn active_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|f| f.active)
            .map(|f| f.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

impl From<Vec<TagFilter>> for TagFilters {
    fn from(value: Vec<TagFilter>) -> Self {
        let mut filters = TagFilters::new();
        for f in value {
            filters.upsert(&f.key, f.active);
        }
        filters
    }
}

impl From<TagFilters> for Vec<TagFilter> {
    fn from(value: TagFilters) -> Self {
        value.entries
    }
}

#[derive(Debug, Clone)]
struct TagSlot {
    key: String,
    active: bool,
    children: Vec<usize>,
}

/// Arena form of a tag forest. Nodes are addressed by index and looked up
/// by key; the first node seen with a given key owns the key.
#[derive(Debug, Clone, Default)]
pub struct TagTree {
    slots: Vec<TagSlot>,
    roots: Vec<usize>,
    by_key: HashMap<String, usize>,
}

impl TagTree {
    pub fn from_node(node: &TagNode) -> Self {
        Self::from_roots(std::slice::from_ref(node))
    }

    pub fn from_roots(roots: &[TagNode]) -> Self {
        let mut tree = TagTree::default();
        for root in roots {
            let ix = tree.insert_subtree(root);
            tree.roots.push(ix);
        }
        tree
    }

    fn insert_subtree(&mut self, root: &TagNode) -> usize {
        let root_ix = self.push_slot(root);
        let mut pending = vec![(root_ix, root)];
        while let Some((parent_ix, node)) = pending.pop() {
            for child in node.children.values() {
                let child_ix = self.push_slot(child);
                self.slots[parent_ix].children.push(child_ix);
                pending.push((child_ix, child));
            }
        }
        root_ix
    }

    fn push_slot(&mut self, node: &TagNode) -> usize {
        let ix = self.slots.len();
        self.slots.push(TagSlot {
            key: node.key.clone(),
            active: node.active,
            children: Vec::new(),
        });
        self.by_key.entry(node.key.clone()).or_insert(ix);
        ix
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_active(&self, key: &str) -> Option<bool> {
        self.by_key.get(key).map(|&ix| self.slots[ix].active)
    }

    /// Sets `active` on the node named `key` and every descendant, upserting
    /// each visited node into `filters` in pre-order. Returns the number of
    /// nodes visited, or `None` when the key is unknown.
    pub fn cascade(&mut self, key: &str, active: bool, filters: &mut TagFilters) -> Option<usize> {
        let start = *self.by_key.get(key)?;
        Some(self.cascade_from(start, active, filters))
    }

    /// Cascades from every root of the forest.
    pub fn cascade_all(&mut self, active: bool, filters: &mut TagFilters) -> usize {
        let roots = self.roots.clone();
        roots
            .into_iter()
            .map(|ix| self.cascade_from(ix, active, filters))
            .sum()
    }

    fn cascade_from(&mut self, start: usize, active: bool, filters: &mut TagFilters) -> usize {
        let mut stack = vec![start];
        let mut visited = 0;
        while let Some(ix) = stack.pop() {
            let slot = &mut self.slots[ix];
            slot.active = active;
            filters.upsert(&slot.key, active);
            stack.extend(slot.children.iter().rev().copied());
            visited += 1;
        }
        visited
    }

    /// Rebuilds the owned node for the subtree rooted at `key`.
    pub fn to_node(&self, key: &str) -> Option<TagNode> {
        let ix = *self.by_key.get(key)?;
        Some(self.build_node(ix))
    }

    fn build_node(&self, ix: usize) -> TagNode {
        let slot = &self.slots[ix];
        let children = slot
            .children
            .iter()
            .map(|&c| {
                let node = self.build_node(c);
                (node.key.clone(), node)
            })
            .collect();
        TagNode {
            key: slot.key.clone(),
            active: slot.active,
            children,
        }
    }
}
