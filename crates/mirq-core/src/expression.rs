//! Compiled query IR — the parser's output and the interpreter's input.
//!
//! Surface markers are gone after parsing: every reserved key of the query
//! grammar lands in a dedicated field, and the parallel/sequential
//! distinction is a variant tag on the sibling list, not an in-band node.

use serde_json::Value;
use std::rc::Rc;

/// A compiled query.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Node(Rc<ExpressionNode>),
    /// Sibling fan-out, evaluated in order: element *k+1* starts only
    /// after element *k* resolved.
    Sequence(Rc<Vec<Expression>>),
    /// Sibling fan-out started all at once (`||`). Result order is
    /// positional regardless of completion order.
    Parallel(Rc<Vec<Expression>>),
}

/// One node of the execution tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpressionNode {
    /// Attribute or method name on the current target; empty means "use
    /// the current target as-is".
    pub source_key: String,
    /// `?` suffix: a missing attribute or method yields the absent value
    /// instead of an error.
    pub is_optional: bool,
    /// Ordered literal parameters (`()`); presence turns the key into a
    /// method call.
    pub params: Option<Vec<Value>>,
    /// Collection selector (`[]`).
    pub selector: Option<ElementSelector>,
    /// Literal replacing the resolved target before descending (`<=`).
    pub source_value: Option<Value>,
    /// The single empty-target child (`=>`); replaces the output slot.
    /// Mutually exclusive with `nested`.
    pub next: Option<Expression>,
    /// Named children in query insertion order.
    pub nested: Vec<(String, Expression)>,
}

/// Element selection for `[]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementSelector {
    /// A single element; negatives count from the end.
    Index(i64),
    /// An end-exclusive slice. `[]` = all, `[a]` = from `a`, `[a, b]`.
    Slice { start: Option<i64>, end: Option<i64> },
}

impl ExpressionNode {
    /// A node carrying only a traversal frame.
    pub fn leaf(source_key: impl Into<String>, is_optional: bool) -> Self {
        Self {
            source_key: source_key.into(),
            is_optional,
            ..Self::default()
        }
    }

    /// Whether this node carries no children.
    pub fn is_leaf(&self) -> bool {
        self.next.is_none() && self.nested.is_empty()
    }

    /// Children-only copy evaluated against each element of a slice:
    /// the target is already selected, so the frame empties.
    pub(crate) fn remainder(&self) -> Self {
        Self {
            source_key: String::new(),
            is_optional: self.is_optional,
            params: None,
            selector: None,
            source_value: None,
            next: self.next.clone(),
            nested: self.nested.clone(),
        }
    }
}

impl Expression {
    pub fn node(node: ExpressionNode) -> Self {
        Expression::Node(Rc::new(node))
    }
}
