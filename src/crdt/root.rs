//! Document root: the arena of every element a replica has seen.
//!
//! The root owns the top-level object plus a registry from creation ticket to
//! element. Tombstoned elements stay registered so operations still in flight
//! from slower replicas can resolve them, until garbage collection purges them.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::crdt::array::ArrayElement;
use crate::crdt::element::{CounterElement, Element, ElementNode, TextElement};
use crate::crdt::object::ObjectElement;
use crate::crdt::types::{ActorId, TimeTicket};
use crate::error::{Error, Result};

/// Registry of every live and tombstoned element of one document replica.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    root_created_at: TimeTicket,
    elements: HashMap<TimeTicket, ElementNode>,
    removed: HashSet<TimeTicket>,
}

impl Default for Root {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! typed_accessors {
    ($($name:ident, $name_mut:ident, $variant:ident, $ty:ty, $label:literal;)*) => {
        $(
            #[doc = concat!("Resolves `created_at` to a ", $label, " element.")]
            pub fn $name(&self, created_at: &TimeTicket) -> Result<&$ty> {
                match &self.get(created_at)?.element {
                    Element::$variant(inner) => Ok(inner),
                    _ => Err(Error::UnexpectedElementType {
                        ticket: *created_at,
                        expected: $label,
                    }),
                }
            }

            pub(crate) fn $name_mut(&mut self, created_at: &TimeTicket) -> Result<&mut $ty> {
                match &mut self.get_mut(created_at)?.element {
                    Element::$variant(inner) => Ok(inner),
                    _ => Err(Error::UnexpectedElementType {
                        ticket: *created_at,
                        expected: $label,
                    }),
                }
            }
        )*
    };
}

impl Root {
    /// Creates a root holding an empty top-level object.
    pub fn new() -> Self {
        let root_created_at = TimeTicket::INITIAL;
        let mut elements = HashMap::new();
        elements.insert(
            root_created_at,
            ElementNode::new(root_created_at, None, Element::Object(ObjectElement::new())),
        );
        Root {
            root_created_at,
            elements,
            removed: HashSet::new(),
        }
    }

    /// Creation ticket of the top-level object.
    pub fn root_created_at(&self) -> TimeTicket {
        self.root_created_at
    }

    /// Looks up an element by its creation ticket, tombstones included.
    pub fn find_by_created_at(&self, created_at: &TimeTicket) -> Option<&ElementNode> {
        self.elements.get(created_at)
    }

    fn get(&self, created_at: &TimeTicket) -> Result<&ElementNode> {
        self.elements
            .get(created_at)
            .ok_or(Error::ElementNotFound(*created_at))
    }

    pub(crate) fn get_mut(&mut self, created_at: &TimeTicket) -> Result<&mut ElementNode> {
        self.elements
            .get_mut(created_at)
            .ok_or(Error::ElementNotFound(*created_at))
    }

    typed_accessors! {
        array, array_mut, Array, ArrayElement, "array";
        object, object_mut, Object, ObjectElement, "object";
        text, text_mut, Text, TextElement, "text";
        counter, counter_mut, Counter, CounterElement, "counter";
    }

    /// Adds an element to the registry.
    ///
    /// Creation tickets are unique by construction, so a duplicate means a
    /// replica issued the same ticket twice.
    pub fn register_element(&mut self, node: ElementNode) -> Result<()> {
        if self.elements.contains_key(&node.created_at) {
            return Err(Error::DuplicateTicket(node.created_at));
        }
        if node.is_removed() {
            self.removed.insert(node.created_at);
        }
        self.elements.insert(node.created_at, node);
        Ok(())
    }

    /// Marks an element removed at `removed_at`, keeping it registered.
    ///
    /// Returns true if the tombstone changed. The root object cannot be removed.
    pub fn tombstone(&mut self, created_at: &TimeTicket, removed_at: TimeTicket) -> Result<bool> {
        if *created_at == self.root_created_at {
            return Ok(false);
        }
        let changed = self.get_mut(created_at)?.remove(removed_at);
        if changed {
            self.removed.insert(*created_at);
        }
        Ok(changed)
    }

    /// Assigns `actor` to every ticket issued before the replica knew its
    /// actor, arena keys included.
    pub fn set_actor(&mut self, actor: ActorId) {
        self.elements = std::mem::take(&mut self.elements)
            .into_iter()
            .map(|(created_at, mut node)| {
                node.set_actor(actor);
                (created_at.claimed_by(actor), node)
            })
            .collect();
        self.removed = std::mem::take(&mut self.removed)
            .into_iter()
            .map(|t| t.claimed_by(actor))
            .collect();
    }

    /// Lazy depth-first walk over every element below the root object.
    ///
    /// Each call starts a fresh traversal.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            root: self,
            stack: self.children_of(&self.root_created_at),
        }
    }

    fn children_of(&self, created_at: &TimeTicket) -> Vec<TimeTicket> {
        let mut children = self
            .elements
            .get(created_at)
            .map(|node| node.element.children())
            .unwrap_or_default();
        children.reverse();
        children
    }

    /// Number of registered elements, root and tombstones included.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of tombstoned elements awaiting collection.
    pub fn tombstone_count(&self) -> usize {
        self.removed.len()
    }

    /// Returns an independent copy of the whole tree.
    pub fn deepcopy(&self) -> Root {
        self.clone()
    }

    /// Purges tombstones removed at or before `min_synced` together with
    /// everything below them. Returns the number of purged elements.
    pub fn garbage_collect(&mut self, min_synced: &TimeTicket) -> usize {
        let mut candidates: Vec<TimeTicket> = self
            .removed
            .iter()
            .filter(|t| {
                self.elements
                    .get(*t)
                    .and_then(|node| node.removed_at)
                    .is_some_and(|removed_at| !removed_at.after(min_synced))
            })
            .copied()
            .collect();
        candidates.sort();

        let mut purged = 0;
        for created_at in candidates {
            let Some(node) = self.elements.get(&created_at) else {
                continue;
            };
            if let Some(parent) = node.parent {
                if let Some(parent_node) = self.elements.get_mut(&parent) {
                    match &mut parent_node.element {
                        Element::Array(array) => array.purge(&created_at),
                        Element::Object(object) => object.purge(&created_at),
                        _ => {}
                    }
                }
            }

            let mut stack = vec![created_at];
            while let Some(ticket) = stack.pop() {
                if let Some(node) = self.elements.remove(&ticket) {
                    stack.extend(node.element.children());
                    self.removed.remove(&ticket);
                    purged += 1;
                }
            }
        }

        if purged > 0 {
            debug!("purged {} elements up to {}", purged, min_synced.structure());
        }
        purged
    }

    /// Renders the visible document as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.value_of(&self.root_created_at)
    }

    fn value_of(&self, created_at: &TimeTicket) -> serde_json::Value {
        let Some(node) = self.elements.get(created_at) else {
            return serde_json::Value::Null;
        };
        match &node.element {
            Element::Primitive(p) => p.to_json(),
            Element::Text(text) => serde_json::Value::String(text.content.clone()),
            Element::Counter(counter) => serde_json::Value::from(counter.value),
            Element::Array(array) => serde_json::Value::Array(
                array
                    .tickets()
                    .filter(|t| self.is_live(t))
                    .map(|t| self.value_of(&t))
                    .collect(),
            ),
            Element::Object(object) => serde_json::Value::Object(
                object
                    .winners()
                    .into_iter()
                    .filter(|(_, t)| self.is_live(t))
                    .map(|(key, t)| (key.to_owned(), self.value_of(&t)))
                    .collect(),
            ),
        }
    }

    fn is_live(&self, created_at: &TimeTicket) -> bool {
        self.elements
            .get(created_at)
            .is_some_and(|node| !node.is_removed())
    }
}

/// Iterator returned by [`Root::descendants`].
pub struct Descendants<'a> {
    root: &'a Root,
    stack: Vec<TimeTicket>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a ElementNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ticket) = self.stack.pop() {
            if let Some(node) = self.root.elements.get(&ticket) {
                self.stack.extend(self.root.children_of(&ticket));
                return Some(node);
            }
        }
        None
    }
}
