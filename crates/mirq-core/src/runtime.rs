//! Expression interpreter.
//!
//! Walks an [`Expression`] against a target graph, dispatching attribute
//! reads and method calls, slicing collections, fanning out siblings, and
//! routing recoverable failures through the error recovery hook. Every
//! interior step goes through [`Eventual`], so a synchronous target graph
//! is evaluated without ever touching a future, while an asynchronous one
//! suspends transparently.
//!
//! The interpreter never mutates the target graph; methods invoked on the
//! graph may do whatever they want.

use crate::error::InvokeError;
use crate::eventual::Eventual;
use crate::expression::{ElementSelector, Expression, ExpressionNode};
use crate::node::Node;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, trace};

/// Access kind submitted to the authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Call,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Call => "call",
        }
    }
}

/// Method implementation attached to plain-data targets.
///
/// Receives the receiver value, the literal call parameters, and the
/// invocation context.
pub type Method = Rc<dyn Fn(&Value, &[Value], Option<&Value>) -> Eventual<Node>>;

/// Access policy consulted before every attribute read and method call.
pub type Authorizer = dyn Fn(&str, Operation, Option<&[Value]>) -> Eventual<bool>;

/// Recovery hook replacing a failed expression node's result.
pub type ErrorHandler = dyn Fn(InvokeError) -> Value;

/// Name → method registry consulted when a call lands on a [`Node::Data`]
/// target. Host objects resolve their own methods instead.
#[derive(Clone, Default)]
pub struct Methods {
    map: HashMap<String, Method>,
}

impl Methods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a method. Returns the previous one if present.
    pub fn register<F>(&mut self, name: impl Into<String>, method: F) -> Option<Method>
    where
        F: Fn(&Value, &[Value], Option<&Value>) -> Eventual<Node> + 'static,
    {
        self.map.insert(name.into(), Rc::new(method))
    }

    pub fn get(&self, name: &str) -> Option<Method> {
        self.map.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }
}

/// Invocation-time options.
#[derive(Clone, Default)]
pub struct InvokeOptions {
    /// Passed to every method call as the trailing context argument.
    pub context: Option<Value>,
    /// Method registry for plain-data targets.
    pub methods: Methods,
    /// Access policy; absent means allow everything.
    pub authorizer: Option<Rc<Authorizer>>,
    /// Error recovery hook; absent means failures propagate.
    pub error_handler: Option<Rc<ErrorHandler>>,
}

impl InvokeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_methods(mut self, methods: Methods) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_authorizer<F>(mut self, authorizer: F) -> Self
    where
        F: Fn(&str, Operation, Option<&[Value]>) -> Eventual<bool> + 'static,
    {
        self.authorizer = Some(Rc::new(authorizer));
        self
    }

    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(InvokeError) -> Value + 'static,
    {
        self.error_handler = Some(Rc::new(handler));
        self
    }
}

/// Result slot: `None` is the absent value. Parent objects omit absent
/// children; sequences render them as `null`.
type Slot = Option<Value>;

/// Evaluate a compiled expression against `target`.
///
/// Synchronous when every step of the walk is synchronous; suspends into
/// a future at the first asynchronous attribute, method, or authorizer
/// answer. An absent top-level result renders as `null`.
pub fn invoke_expression(
    target: Node,
    expression: &Expression,
    options: &InvokeOptions,
) -> Eventual<Value> {
    trace!("invoking expression");
    eval_recovered(target, expression.clone(), options.clone())
        .map(|slot| slot.unwrap_or(Value::Null))
}

fn eval(target: Node, expression: Expression, options: InvokeOptions) -> Eventual<Slot> {
    match expression {
        Expression::Node(node) => eval_node(target, node, options),
        Expression::Sequence(children) => {
            let items: Vec<Expression> = (*children).clone();
            Eventual::map_in_order(items, move |child| {
                eval_slot_value(target.clone(), child, options.clone())
            })
            .map(|values| Some(Value::Array(values)))
        }
        Expression::Parallel(children) => {
            // every branch starts right here; suspended branches are then
            // polled together
            let branches = children
                .iter()
                .map(|child| eval_slot_value(target.clone(), child.clone(), options.clone()))
                .collect();
            Eventual::all(branches).map(|values| Some(Value::Array(values)))
        }
    }
}

fn eval_slot_value(target: Node, expression: Expression, options: InvokeOptions) -> Eventual<Value> {
    eval_recovered(target, expression, options).map(|slot| slot.unwrap_or(Value::Null))
}

/// Apply the recovery hook at this slot. The innermost recovered slot
/// wins; denied authorization always propagates.
fn eval_recovered(target: Node, expression: Expression, options: InvokeOptions) -> Eventual<Slot> {
    let handler = options.error_handler.clone();
    eval(target, expression, options).then(move |result| match result {
        Ok(slot) => Eventual::ready(slot),
        Err(error) if error.is_denied() => Eventual::fail(error),
        Err(error) => match handler {
            Some(handler) => Eventual::ready(Some(handler(error))),
            None => Eventual::fail(error),
        },
    })
}

fn eval_node(target: Node, node: Rc<ExpressionNode>, options: InvokeOptions) -> Eventual<Slot> {
    let resolution = resolve_target(target, &node, &options);
    resolution.and_then(move |resolved| {
        // `<=` replaces the resolved target; the authorization for the
        // resolution above has already fired
        let resolved = match &node.source_value {
            Some(literal) => Node::Data(literal.clone()),
            None => resolved,
        };
        if node.is_leaf() {
            return Eventual::ready(resolved.into_slot());
        }
        if resolved.is_missing() {
            return if node.is_optional {
                Eventual::ready(None)
            } else {
                Eventual::fail(InvokeError::undefined_descent(&node.source_key))
            };
        }
        if let Some(selector) = node.selector.clone() {
            return eval_selector(resolved, selector, node, options);
        }
        descend(resolved, node, options)
    })
}

/// Attribute read or method call on the current target.
fn resolve_target(
    target: Node,
    node: &ExpressionNode,
    options: &InvokeOptions,
) -> Eventual<Node> {
    if node.source_key.is_empty() {
        return Eventual::ready(target);
    }
    match &node.params {
        None => {
            let key = node.source_key.clone();
            authorize(&node.source_key, Operation::Get, None, options)
                .and_then(move |_| target.attr(&key))
        }
        Some(params) => {
            let exists = match &target {
                Node::Host(host) => host.has_method(&node.source_key),
                Node::Data(_) => options.methods.contains(&node.source_key),
                _ => false,
            };
            if !exists {
                return if node.is_optional {
                    Eventual::ready(Node::Missing)
                } else {
                    Eventual::fail(InvokeError::method_not_found(&node.source_key))
                };
            }
            let key = node.source_key.clone();
            let params = params.clone();
            let context = options.context.clone();
            let methods = options.methods.clone();
            authorize(&node.source_key, Operation::Call, Some(params.as_slice()), options)
                .and_then(move |_| match &target {
                    Node::Host(host) => host.call(&key, &params, context.as_ref()),
                    Node::Data(receiver) => match methods.get(&key) {
                        Some(method) => method(receiver, &params, context.as_ref()),
                        None => Eventual::fail(InvokeError::method_not_found(&key)),
                    },
                    _ => Eventual::fail(InvokeError::method_not_found(&key)),
                })
        }
    }
}

fn authorize(
    key: &str,
    operation: Operation,
    params: Option<&[Value]>,
    options: &InvokeOptions,
) -> Eventual<()> {
    let Some(authorizer) = &options.authorizer else {
        return Eventual::ready(());
    };
    let key_owned = key.to_string();
    authorizer(key, operation, params).and_then(move |allowed| {
        if allowed {
            Eventual::ready(())
        } else {
            debug!(key = %key_owned, operation = operation.as_str(), "authorization denied");
            Eventual::fail(InvokeError::denied(&key_owned, operation.as_str()))
        }
    })
}

/// `[]` element selection.
fn eval_selector(
    target: Node,
    selector: ElementSelector,
    node: Rc<ExpressionNode>,
    options: InvokeOptions,
) -> Eventual<Slot> {
    let Some(elements) = target.elements() else {
        return Eventual::fail(InvokeError::user(format!(
            "`[]` applied to a non-collection (key: `{}`)",
            node.source_key
        )));
    };
    match selector {
        ElementSelector::Index(index) => {
            let len = elements.len() as i64;
            let at = if index < 0 { index + len } else { index };
            let element = if (0..len).contains(&at) {
                elements[at as usize].clone()
            } else {
                Node::Missing
            };
            if element.is_missing() {
                return if node.is_optional {
                    Eventual::ready(None)
                } else {
                    Eventual::fail(InvokeError::undefined_descent(&node.source_key))
                };
            }
            descend(element, node, options)
        }
        ElementSelector::Slice { start, end } => {
            let slice = slice_elements(&elements, start, end);
            let remainder = Rc::new(node.remainder());
            map_elements(slice, remainder, options, Vec::new())
                .map(|values| Some(Value::Array(values)))
        }
    }
}

/// End-exclusive slice with JS `Array.prototype.slice` bound handling:
/// negatives rebase from the end, everything clamps to the collection.
fn slice_elements(elements: &[Node], start: Option<i64>, end: Option<i64>) -> VecDeque<Node> {
    let len = elements.len() as i64;
    let clamp = |bound: i64| -> usize {
        let rebased = if bound < 0 { bound + len } else { bound };
        rebased.clamp(0, len) as usize
    };
    let from = clamp(start.unwrap_or(0));
    let to = clamp(end.unwrap_or(len));
    if from >= to {
        return VecDeque::new();
    }
    elements[from..to].iter().cloned().collect()
}

/// Evaluate the node remainder against each element, strictly in slice
/// order. A failure recovered by the error handler takes the failing
/// element's place and short-circuits the rest of the map.
fn map_elements(
    mut queue: VecDeque<Node>,
    remainder: Rc<ExpressionNode>,
    options: InvokeOptions,
    mut done: Vec<Value>,
) -> Eventual<Vec<Value>> {
    let Some(element) = queue.pop_front() else {
        return Eventual::ready(done);
    };
    let handler = options.error_handler.clone();
    eval_node(element, remainder.clone(), options.clone()).then(move |result| match result {
        Ok(slot) => {
            done.push(slot.unwrap_or(Value::Null));
            map_elements(queue, remainder, options, done)
        }
        Err(error) if error.is_denied() => Eventual::fail(error),
        Err(error) => match handler {
            Some(handler) => {
                done.push(handler(error));
                Eventual::ready(done)
            }
            None => Eventual::fail(error),
        },
    })
}

/// Named or inline descent below the resolved target.
fn descend(target: Node, node: Rc<ExpressionNode>, options: InvokeOptions) -> Eventual<Slot> {
    if let Some(next) = &node.next {
        return eval_recovered(target, next.clone(), options);
    }
    eval_nested(target, node, 0, Map::new(), options).map(|entries| Some(Value::Object(entries)))
}

fn eval_nested(
    target: Node,
    node: Rc<ExpressionNode>,
    index: usize,
    mut done: Map<String, Value>,
    options: InvokeOptions,
) -> Eventual<Map<String, Value>> {
    let Some((name, child)) = node.nested.get(index) else {
        return Eventual::ready(done);
    };
    let name = name.clone();
    let child = child.clone();
    eval_recovered(target.clone(), child, options.clone()).and_then(move |slot| {
        // absent children leave no key behind
        if let Some(value) = slot {
            done.insert(name, value);
        }
        eval_nested(target, node, index + 1, done, options)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::HostObject;
    use crate::parser::{parse_query, ParseOptions};
    use serde_json::json;
    use std::cell::Cell;
    use std::time::Duration;

    fn run(target: Node, query: Value, options: &InvokeOptions) -> Value {
        invoke(target, query, options)
            .into_ready()
            .expect("synchronous evaluation")
            .expect("invoke")
    }

    fn run_err(target: Node, query: Value, options: &InvokeOptions) -> InvokeError {
        invoke(target, query, options)
            .into_ready()
            .expect("synchronous evaluation")
            .expect_err("invoke error")
    }

    fn invoke(target: Node, query: Value, options: &InvokeOptions) -> Eventual<Value> {
        let expression = parse_query(&query, &ParseOptions::default()).expect("parse");
        invoke_expression(target, &expression, options)
    }

    fn movie_graph() -> Node {
        Node::Data(json!({
            "movie": {"title": "Inception", "year": 2010, "country": "USA"}
        }))
    }

    #[test]
    fn attribute_projection_mirrors_the_query() {
        let result = run(
            movie_graph(),
            json!({"movie": {"title": true, "year": true}}),
            &InvokeOptions::default(),
        );
        assert_eq!(result, json!({"movie": {"title": "Inception", "year": 2010}}));
    }

    #[test]
    fn projection_is_pure_and_repeatable() {
        let query = json!({"movie": {"title": true}});
        let first = run(movie_graph(), query.clone(), &InvokeOptions::default());
        let second = run(movie_graph(), query, &InvokeOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn result_keys_follow_query_insertion_order() {
        let result = run(
            movie_graph(),
            json!({"movie": {"year": true, "title": true}}),
            &InvokeOptions::default(),
        );
        assert_eq!(
            serde_json::to_string(&result).expect("serialize"),
            r#"{"movie":{"year":2010,"title":"Inception"}}"#
        );
    }

    #[test]
    fn rename_method_call_and_slice() {
        let mut methods = Methods::new();
        methods.register("movies", |_, params, _| {
            let genre = params
                .first()
                .and_then(|p| p.pointer("/filter/genre"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let movies = if genre == "action" {
                json!([{"title": "Inception"}, {"title": "The Matrix"}])
            } else {
                json!([])
            };
            Eventual::ready(Node::Data(movies))
        });
        let options = InvokeOptions::new().with_methods(methods);

        let result = run(
            Node::Data(json!({})),
            json!({
                "movies=>actionMovies": {
                    "()": [{"filter": {"genre": "action"}}],
                    "=>": {"[]": [], "title": true}
                }
            }),
            &options,
        );
        assert_eq!(
            result,
            json!({"actionMovies": [{"title": "Inception"}, {"title": "The Matrix"}]})
        );
    }

    #[test]
    fn negative_index_counts_from_the_end() {
        let target = Node::Data(json!({
            "movies": [{"title": "Inception"}, {"title": "The Matrix"}]
        }));
        let result = run(
            target,
            json!({"movies=>movie": {"[]": -1, "title": true}}),
            &InvokeOptions::default(),
        );
        assert_eq!(result, json!({"movie": {"title": "The Matrix"}}));
    }

    #[test]
    fn slice_bounds_follow_js_slice_semantics() {
        let target = Node::Data(json!({"ns": [0, 1, 2, 3, 4]}));
        let options = InvokeOptions::default();

        let all = run(target.clone(), json!({"ns": {"[]": [], "=>": true}}), &options);
        assert_eq!(all, json!({"ns": [0, 1, 2, 3, 4]}));

        let from = run(target.clone(), json!({"ns": {"[]": [3], "=>": true}}), &options);
        assert_eq!(from, json!({"ns": [3, 4]}));

        let window = run(target.clone(), json!({"ns": {"[]": [1, 3], "=>": true}}), &options);
        assert_eq!(window, json!({"ns": [1, 2]}));

        let tail = run(target, json!({"ns": {"[]": [-2], "=>": true}}), &options);
        assert_eq!(tail, json!({"ns": [3, 4]}));
    }

    #[test]
    fn optional_marker_tolerates_missing_values() {
        let target = Node::Data(json!({"movie": {"title": "Inception"}}));
        let result = run(
            target.clone(),
            json!({"movie": {"title": true, "director?": {"fullName": true}}}),
            &InvokeOptions::default(),
        );
        assert_eq!(result, json!({"movie": {"title": "Inception"}}));

        let error = run_err(
            target,
            json!({"movie": {"title": true, "director": {"fullName": true}}}),
            &InvokeOptions::default(),
        );
        assert_eq!(error.code, InvokeError::UNDEFINED);
        assert_eq!(error.key.as_deref(), Some("director"));
    }

    #[test]
    fn optional_marker_tolerates_missing_methods() {
        let result = run(
            Node::Data(json!({})),
            json!({"cleanup?": {"()": []}}),
            &InvokeOptions::default(),
        );
        assert_eq!(result, json!({}));

        let error = run_err(
            Node::Data(json!({})),
            json!({"cleanup": {"()": []}}),
            &InvokeOptions::default(),
        );
        assert_eq!(error.code, InvokeError::NO_METHOD);
    }

    #[test]
    fn source_value_replaces_the_target_before_descent() {
        let mut methods = Methods::new();
        methods.register("save", |receiver, _, _| {
            Eventual::ready(Node::Data(json!({
                "_type": receiver.get("_type").cloned().unwrap_or(Value::Null),
                "id": "X",
                "title": receiver.get("title").cloned().unwrap_or(Value::Null),
                "country": receiver.get("country").cloned().unwrap_or(Value::Null),
            })))
        });
        let options = InvokeOptions::new().with_methods(methods);

        let result = run(
            Node::Data(json!({})),
            json!({
                "<=": {"_type": "Movie", "title": "Avatar", "country": "USA"},
                "save=>movie": {"()": [], "id": true}
            }),
            &options,
        );
        assert_eq!(result, json!({"movie": {"id": "X"}}));
    }

    #[test]
    fn inline_target_replaces_the_slot() {
        let result = run(
            movie_graph(),
            json!({"movie": {"title=>": true}}),
            &InvokeOptions::default(),
        );
        assert_eq!(result, json!({"movie": "Inception"}));
    }

    #[test]
    fn context_reaches_every_method_call() {
        let mut methods = Methods::new();
        methods.register("whoami", |_, _, context| {
            Eventual::ready(Node::Data(context.cloned().unwrap_or(Value::Null)))
        });
        let options = InvokeOptions::new()
            .with_methods(methods)
            .with_context(json!({"user": "admin"}));

        let result = run(Node::Data(json!({})), json!({"whoami": {"()": []}}), &options);
        assert_eq!(result, json!({"whoami": {"user": "admin"}}));
    }

    #[test]
    fn authorizer_gates_reads_and_calls() {
        let options = InvokeOptions::new().with_authorizer(|key, operation, _| {
            Eventual::ready(matches!(
                (key, operation),
                ("user", Operation::Get)
                    | ("username", Operation::Get)
                    | ("publicMethod", Operation::Call)
            ))
        });
        let target = Node::Data(json!({"user": {"username": "alice", "password": "s3cret"}}));

        let result = run(target.clone(), json!({"user": {"username": true}}), &options);
        assert_eq!(result, json!({"user": {"username": "alice"}}));

        let error = run_err(target, json!({"user": {"password": true}}), &options);
        assert_eq!(error.code, InvokeError::DENIED);
    }

    #[test]
    fn denial_is_not_routed_through_the_error_handler() {
        let options = InvokeOptions::new()
            .with_authorizer(|_, _, _| Eventual::ready(false))
            .with_error_handler(|_| json!("recovered"));
        let error = run_err(movie_graph(), json!({"movie": {"title": true}}), &options);
        assert_eq!(error.code, InvokeError::DENIED);
    }

    #[test]
    fn error_handler_replaces_only_the_failing_slot() {
        let mut methods = Methods::new();
        methods.register("boom", |_, _, _| Eventual::fail(InvokeError::user("exploded")));
        let options = InvokeOptions::new()
            .with_methods(methods)
            .with_error_handler(|error| json!({"recovered": error.code}));

        let result = run(
            Node::Data(json!({"a": 1, "c": 3})),
            json!({"a": true, "boom=>b": {"()": []}, "c": true}),
            &options,
        );
        assert_eq!(
            result,
            json!({"a": 1, "b": {"recovered": "MIRQ_E_USER"}, "c": 3})
        );
    }

    #[test]
    fn host_errors_are_not_suppressed_by_the_optional_marker() {
        let mut methods = Methods::new();
        methods.register("boom", |_, _, _| Eventual::fail(InvokeError::user("exploded")));
        let options = InvokeOptions::new().with_methods(methods);

        let error = run_err(Node::Data(json!({})), json!({"boom?": {"()": []}}), &options);
        assert_eq!(error.code, InvokeError::USER);
    }

    #[test]
    fn parallel_and_sequential_fan_out_agree_on_pure_queries() {
        let parallel = run(
            movie_graph(),
            json!({"||": [{"movie": {"title": true}}, {"movie": {"year": true}}]}),
            &InvokeOptions::default(),
        );
        let sequential = run(
            movie_graph(),
            json!([{"movie": {"title": true}}, {"movie": {"year": true}}]),
            &InvokeOptions::default(),
        );
        assert_eq!(parallel, sequential);
        assert_eq!(
            parallel,
            json!([{"movie": {"title": "Inception"}}, {"movie": {"year": 2010}}])
        );
    }

    fn counting_methods(counter: Rc<Cell<i64>>) -> Methods {
        let mut methods = Methods::new();
        methods.register("increment", move |_, _, _| {
            let counter = counter.clone();
            Eventual::later(async move {
                let seen = counter.get();
                tokio::time::sleep(Duration::from_millis(10)).await;
                counter.set(seen + 1);
                Ok(Node::Data(json!(counter.get())))
            })
        });
        methods
    }

    #[tokio::test]
    async fn parallel_siblings_interleave_their_suspensions() {
        let counter = Rc::new(Cell::new(0));
        let options = InvokeOptions::new().with_methods(counting_methods(counter.clone()));

        let result = invoke(
            Node::Data(json!({})),
            json!({"||": [{"increment": {"()": []}}, {"increment": {"()": []}}]}),
            &options,
        );
        assert!(!result.is_ready());
        result.resolve().await.expect("invoke");
        // both branches read the counter before either wrote it back
        assert_eq!(counter.get(), 1);
    }

    #[tokio::test]
    async fn sequential_siblings_observe_each_other() {
        let counter = Rc::new(Cell::new(0));
        let options = InvokeOptions::new().with_methods(counting_methods(counter.clone()));

        let result = invoke(
            Node::Data(json!({})),
            json!([{"increment": {"()": []}}, {"increment": {"()": []}}]),
            &options,
        )
        .resolve()
        .await
        .expect("invoke");
        assert_eq!(counter.get(), 2);
        assert_eq!(result, json!([{"increment": 1}, {"increment": 2}]));
    }

    struct Library;

    impl HostObject for Library {
        fn attr(&self, key: &str) -> Eventual<Node> {
            match key {
                "shelf" => Eventual::ready(Node::Seq(Rc::new(vec![
                    Node::Data(json!({"title": "Dune"})),
                    Node::Missing,
                    Node::Data(json!({"title": "Solaris"})),
                ]))),
                "catalog" => Eventual::later(async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(Node::Data(json!({"name": "midtown"})))
                }),
                _ => Eventual::ready(Node::Missing),
            }
        }

        fn has_method(&self, key: &str) -> bool {
            key == "lookup"
        }

        fn call(&self, key: &str, params: &[Value], _context: Option<&Value>) -> Eventual<Node> {
            match key {
                "lookup" => Eventual::ready(Node::Data(json!({
                    "isbn": params.first().cloned().unwrap_or(Value::Null)
                }))),
                other => Eventual::fail(InvokeError::method_not_found(other)),
            }
        }
    }

    #[tokio::test]
    async fn host_attributes_may_suspend() {
        let result = invoke(
            Node::Host(Rc::new(Library)),
            json!({"catalog": {"name": true}}),
            &InvokeOptions::default(),
        );
        assert!(!result.is_ready());
        assert_eq!(
            result.resolve().await.expect("invoke"),
            json!({"catalog": {"name": "midtown"}})
        );
    }

    #[test]
    fn host_methods_resolve_on_the_object() {
        let result = run(
            Node::Host(Rc::new(Library)),
            json!({"lookup": {"()": ["978-0441013593"]}}),
            &InvokeOptions::default(),
        );
        assert_eq!(result, json!({"lookup": {"isbn": "978-0441013593"}}));
    }

    #[test]
    fn optional_slice_elements_render_missing_as_null() {
        let result = run(
            Node::Host(Rc::new(Library)),
            json!({"shelf?": {"[]": [], "title": true}}),
            &InvokeOptions::default(),
        );
        assert_eq!(
            result,
            json!({"shelf": [{"title": "Dune"}, null, {"title": "Solaris"}]})
        );
    }

    #[test]
    fn recovered_slice_element_short_circuits_the_map() {
        let options =
            InvokeOptions::new().with_error_handler(|error| json!({"recovered": error.code}));
        let result = run(
            Node::Host(Rc::new(Library)),
            json!({"shelf": {"[]": [], "title": true}}),
            &options,
        );
        // the second element failed and was replaced; the third never ran
        assert_eq!(
            result,
            json!({"shelf": [{"title": "Dune"}, {"recovered": "MIRQ_E_UNDEFINED"}]})
        );

        let error = run_err(
            Node::Host(Rc::new(Library)),
            json!({"shelf": {"[]": [], "title": true}}),
            &InvokeOptions::default(),
        );
        assert_eq!(error.code, InvokeError::UNDEFINED);
    }

    #[test]
    fn selector_on_a_non_collection_fails() {
        let error = run_err(
            movie_graph(),
            json!({"movie": {"[]": [], "title": true}}),
            &InvokeOptions::default(),
        );
        assert_eq!(error.code, InvokeError::USER);
    }
}
