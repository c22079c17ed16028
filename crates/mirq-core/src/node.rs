//! Runtime value model for the target graph.
//!
//! `Data` wraps plain JSON and answers attribute reads structurally.
//! `Host` wraps a live object that resolves its own attributes and
//! methods, possibly asynchronously. `Seq` is a collection that may mix
//! the two. `Missing` is the absent value — distinct from JSON `null`,
//! which is a present value like any other.

use crate::error::InvokeError;
use crate::eventual::Eventual;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// A value flowing through the interpreter.
#[derive(Clone)]
pub enum Node {
    Data(Value),
    Host(Rc<dyn HostObject>),
    Seq(Rc<Vec<Node>>),
    Missing,
}

/// Capability set of a live target object.
///
/// Every hook has a default, so hosts implement only what their object
/// actually answers: an attribute-only view can skip the method hooks,
/// a service facade can skip `attr`.
pub trait HostObject {
    /// Attribute read; yield [`Node::Missing`] when the attribute is
    /// absent. The result may be deferred.
    fn attr(&self, key: &str) -> Eventual<Node> {
        let _ = key;
        Eventual::ready(Node::Missing)
    }

    /// Whether a method named `key` exists on this object. Consulted
    /// before authorization, so a missing method never reaches the
    /// policy hook.
    fn has_method(&self, key: &str) -> bool {
        let _ = key;
        false
    }

    /// Invoke a method with this object as the receiver.
    fn call(&self, key: &str, params: &[Value], context: Option<&Value>) -> Eventual<Node> {
        let _ = (params, context);
        Eventual::fail(InvokeError::method_not_found(key))
    }

    /// Plain-value rendering used when the object itself lands in a
    /// result leaf.
    fn to_value(&self) -> Value {
        Value::Null
    }
}

impl Node {
    pub fn is_missing(&self) -> bool {
        matches!(self, Node::Missing)
    }

    /// Structural attribute read. Host objects resolve their own; reads
    /// against scalars, sequences, and `Missing` yield `Missing`.
    pub fn attr(&self, key: &str) -> Eventual<Node> {
        match self {
            Node::Data(Value::Object(entries)) => Eventual::ready(
                entries
                    .get(key)
                    .map(|value| Node::Data(value.clone()))
                    .unwrap_or(Node::Missing),
            ),
            Node::Host(host) => host.attr(key),
            _ => Eventual::ready(Node::Missing),
        }
    }

    /// View this node as a collection, if it is one.
    pub fn elements(&self) -> Option<Vec<Node>> {
        match self {
            Node::Data(Value::Array(items)) => {
                Some(items.iter().cloned().map(Node::Data).collect())
            }
            Node::Seq(items) => Some((**items).clone()),
            _ => None,
        }
    }

    /// Render this node into a result slot. `None` is the absent value:
    /// parent objects omit it, sequences keep it as `null`.
    pub fn into_slot(self) -> Option<Value> {
        match self {
            Node::Data(value) => Some(value),
            Node::Host(host) => Some(host.to_value()),
            Node::Seq(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| item.clone().into_slot().unwrap_or(Value::Null))
                    .collect(),
            )),
            Node::Missing => None,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Data(value)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Node::Host(_) => f.write_str("Host(..)"),
            Node::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Node::Missing => f.write_str("Missing"),
        }
    }
}
