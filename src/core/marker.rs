//! Hierarchical tag markers attached to log records
//!
//! A marker is a named node that may contain child markers. Nodes are
//! shared (`Arc`) and may be added under several parents; nothing here
//! enforces acyclicity, so every traversal carries an identity-keyed
//! visited set and terminates even on cyclic graphs.

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A named, shareable tag node with an ordered list of children.
///
/// Equality is node identity, not name equality: two markers named the same
/// are still distinct nodes. Cloning a `Marker` clones the handle, not the
/// node.
///
/// # Example
///
/// ```
/// use reclog::Marker;
///
/// let io = Marker::new("io");
/// let disk = Marker::new("disk");
/// io.add(&disk);
///
/// assert!(io.is_or_contains(&disk));
/// assert!(io.is_or_contains_named("disk"));
/// assert_eq!(io.to_string(), "io [ disk ]");
/// ```
#[derive(Clone)]
pub struct Marker {
    inner: Arc<MarkerInner>,
}

struct MarkerInner {
    name: String,
    children: RwLock<Vec<Marker>>,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Marker {
        Marker {
            inner: Arc::new(MarkerInner {
                name: name.into(),
                children: RwLock::new(Vec::new()),
            }),
        }
    }

    /// The shared "no marker" sentinel carried by records without a marker.
    ///
    /// The sentinel is process-wide; `add`/`remove` on it are no-ops so tags
    /// cannot leak into every unmarked record.
    pub fn none() -> Marker {
        static NONE: OnceLock<Marker> = OnceLock::new();
        NONE.get_or_init(|| Marker::new("")).clone()
    }

    /// True when this handle refers to the sentinel.
    pub fn is_none(&self) -> bool {
        self.same_marker(&Marker::none())
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// True when both handles refer to the same node.
    pub fn same_marker(&self, other: &Marker) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Appends `child` unless it is already a direct child of this node.
    /// Returns whether an insertion happened.
    pub fn add(&self, child: &Marker) -> bool {
        if self.is_none() {
            return false;
        }
        let mut children = self.inner.children.write();
        if children.iter().any(|c| c.same_marker(child)) {
            return false;
        }
        children.push(child.clone());
        true
    }

    /// Removes `child` from the direct children. Returns whether a removal
    /// happened.
    pub fn remove(&self, child: &Marker) -> bool {
        if self.is_none() {
            return false;
        }
        let mut children = self.inner.children.write();
        let before = children.len();
        children.retain(|c| !c.same_marker(child));
        children.len() != before
    }

    /// True when this node is `target` or any reachable descendant is.
    /// Terminates on cyclic graphs.
    pub fn is_or_contains(&self, target: &Marker) -> bool {
        self.search(&mut HashSet::new(), &|marker| marker.same_marker(target))
    }

    /// True when this node or any reachable descendant is named `name`.
    pub fn is_or_contains_named(&self, name: &str) -> bool {
        self.search(&mut HashSet::new(), &|marker| marker.name() == name)
    }

    fn search(&self, visited: &mut HashSet<usize>, matches: &dyn Fn(&Marker) -> bool) -> bool {
        if matches(self) {
            return true;
        }
        if !visited.insert(self.id()) {
            return false;
        }
        for child in self.children() {
            if child.search(visited, matches) {
                return true;
            }
        }
        false
    }

    /// Snapshot of the direct children in insertion order.
    ///
    /// Each call takes a fresh snapshot, so iteration is restartable and
    /// unaffected by concurrent mutation; mutations made after the call are
    /// not reflected in it.
    pub fn children(&self) -> Vec<Marker> {
        self.inner.children.read().clone()
    }

    pub fn has_children(&self) -> bool {
        !self.inner.children.read().is_empty()
    }

    /// Appends this marker's name to `out`, followed by a bracketed
    /// rendering of the child subtree when `include_children` is set.
    /// Returns `out` for chaining. Cycle edges render as a bare name.
    pub fn render_to<'a>(&self, out: &'a mut String, include_children: bool) -> &'a mut String {
        out.push_str(self.name());
        if include_children {
            let mut visited = HashSet::new();
            visited.insert(self.id());
            self.render_children(out, &mut visited);
        }
        out
    }

    fn render_children(&self, out: &mut String, visited: &mut HashSet<usize>) {
        let children = self.children();
        if children.is_empty() {
            return;
        }
        out.push_str(" [ ");
        for (index, child) in children.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            out.push_str(child.name());
            if visited.insert(child.id()) {
                child.render_children(out, visited);
            }
        }
        out.push_str(" ]");
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn to_node(&self, visited: &mut HashSet<usize>) -> MarkerNode {
        visited.insert(self.id());
        let children = self
            .children()
            .iter()
            .map(|child| {
                if visited.contains(&child.id()) {
                    MarkerNode {
                        name: child.name().to_string(),
                        children: Vec::new(),
                    }
                } else {
                    child.to_node(visited)
                }
            })
            .collect();
        MarkerNode {
            name: self.name().to_string(),
            children,
        }
    }

    fn from_node(node: &MarkerNode) -> Marker {
        let marker = Marker::new(node.name.clone());
        for child in &node.children {
            marker.add(&Marker::from_node(child));
        }
        marker
    }
}

impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.same_marker(other)
    }
}

impl Eq for Marker {}

// Iterates a snapshot of the direct children, like `children()`.
impl IntoIterator for &Marker {
    type Item = Marker;
    type IntoIter = std::vec::IntoIter<Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.children().into_iter()
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::new();
        self.render_to(&mut buf, true);
        f.write_str(&buf)
    }
}

// Hand-written: a derived Debug would recurse forever on cyclic graphs.
impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let child_names: Vec<String> = self
            .inner
            .children
            .read()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        f.debug_struct("Marker")
            .field("name", &self.name())
            .field("children", &child_names)
            .finish()
    }
}

/// Plain tree mirror used for (de)serialization. Shared nodes and cycle
/// edges flatten to name-only leaves; deserialization rebuilds fresh nodes.
#[derive(Serialize, Deserialize)]
struct MarkerNode {
    name: String,
    #[serde(default)]
    children: Vec<MarkerNode>,
}

impl Serialize for Marker {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_node(&mut HashSet::new()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Marker {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let node = MarkerNode::deserialize(deserializer)?;
        Ok(Marker::from_node(&node))
    }
}
