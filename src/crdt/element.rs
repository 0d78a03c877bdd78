//! Element definitions for the document tree.
//!
//! Every element lives in the [`Root`](crate::crdt::Root) arena keyed by its
//! creation ticket. Containers refer to their children by ticket instead of
//! owning them, so the registry and the hierarchy never fight over ownership.

use serde::{Deserialize, Serialize};

use crate::crdt::array::ArrayElement;
use crate::crdt::object::ObjectElement;
use crate::crdt::types::{ActorId, TimeTicket};

/// A scalar JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl Primitive {
    /// Converts the value into its JSON form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Primitive::Null => serde_json::Value::Null,
            Primitive::Bool(b) => serde_json::Value::Bool(*b),
            Primitive::Integer(i) => serde_json::Value::from(*i),
            Primitive::Double(d) => serde_json::Value::from(*d),
            Primitive::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Bool(value)
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Primitive::Integer(value)
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Primitive::Double(value)
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::String(value.to_owned())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::String(value)
    }
}

/// Plain text held as a whole-value register.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub content: String,
    /// Ticket of the edit that produced `content`
    pub updated_at: TimeTicket,
}

/// A counter whose increments commute.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterElement {
    pub value: i64,
}

/// The payload of one element.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Primitive(Primitive),
    Array(ArrayElement),
    Object(ObjectElement),
    Text(TextElement),
    Counter(CounterElement),
}

impl Element {
    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Primitive(_) => "primitive",
            Element::Array(_) => "array",
            Element::Object(_) => "object",
            Element::Text(_) => "text",
            Element::Counter(_) => "counter",
        }
    }

    /// Returns true for arrays and objects.
    pub fn is_container(&self) -> bool {
        matches!(self, Element::Array(_) | Element::Object(_))
    }

    pub(crate) fn set_actor(&mut self, actor: ActorId) {
        match self {
            Element::Array(array) => array.set_actor(actor),
            Element::Object(object) => object.set_actor(actor),
            Element::Text(text) => text.updated_at = text.updated_at.claimed_by(actor),
            Element::Primitive(_) | Element::Counter(_) => {}
        }
    }

    /// Direct children of a container in traversal order, tombstones included.
    pub fn children(&self) -> Vec<TimeTicket> {
        match self {
            Element::Array(array) => array.tickets().collect(),
            Element::Object(object) => object.tickets().collect(),
            _ => Vec::new(),
        }
    }
}

/// Describes an element to be created by a `Set` or `Add` operation.
///
/// Containers always start empty; their content arrives through later
/// operations that name them as parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ElementValue {
    Primitive(Primitive),
    Array,
    Object,
    Text(String),
    Counter(i64),
}

impl ElementValue {
    /// Builds the element payload for a value created at `created_at`.
    pub fn into_element(self, created_at: TimeTicket) -> Element {
        match self {
            ElementValue::Primitive(p) => Element::Primitive(p),
            ElementValue::Array => Element::Array(ArrayElement::default()),
            ElementValue::Object => Element::Object(ObjectElement::default()),
            ElementValue::Text(content) => Element::Text(TextElement {
                content,
                updated_at: created_at,
            }),
            ElementValue::Counter(value) => Element::Counter(CounterElement { value }),
        }
    }
}

macro_rules! impl_primitive_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ElementValue {
                fn from(value: $ty) -> Self {
                    ElementValue::Primitive(value.into())
                }
            }
        )*
    };
}

impl_primitive_value!(bool, i64, f64, &str, String, Primitive);

/// One registered element together with its CRDT metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    /// Immutable identity of this element
    pub created_at: TimeTicket,
    /// Set once the element has been removed (tombstone)
    pub removed_at: Option<TimeTicket>,
    /// The container holding this element; `None` only for the root
    pub parent: Option<TimeTicket>,
    pub element: Element,
}

impl ElementNode {
    /// Creates a live element.
    pub fn new(created_at: TimeTicket, parent: Option<TimeTicket>, element: Element) -> Self {
        ElementNode {
            created_at,
            removed_at: None,
            parent,
            element,
        }
    }

    /// Returns true if this element has been tombstoned.
    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    /// Moves every ticket this node holds from the unassigned actor to `actor`.
    pub(crate) fn set_actor(&mut self, actor: ActorId) {
        self.created_at = self.created_at.claimed_by(actor);
        self.removed_at = self.removed_at.map(|t| t.claimed_by(actor));
        self.parent = self.parent.map(|t| t.claimed_by(actor));
        self.element.set_actor(actor);
    }

    /// Marks the element removed unless an equal or later removal already won.
    ///
    /// Returns true if `removed_at` changed.
    pub fn remove(&mut self, removed_at: TimeTicket) -> bool {
        match self.removed_at {
            Some(current) if !removed_at.after(&current) => false,
            _ => {
                self.removed_at = Some(removed_at);
                true
            }
        }
    }
}
