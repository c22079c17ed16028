//! # mirq-core
//!
//! Reflexive query runtime for in-memory object graphs: a JSON-shaped
//! query describes which attributes to read and which methods to invoke
//! on a root value, and the result mirrors the query's shape — including
//! key renaming (`source=>target`), optional traversal (`?`), collection
//! slicing (`[]`), method calls (`()`), parallel fan-out (`||`), and
//! literal target substitution (`<=`).
//!
//! ## Module Roles
//!
//! | Module | Responsibility | Public Entry Points |
//! |---|---|---|
//! | `parser` | Query → typed expression tree | [`parse_query`], [`ParseOptions`] |
//! | `expression` | Compiled IR | [`Expression`], [`ExpressionNode`] |
//! | `runtime` | Expression interpreter | [`invoke_expression`], [`InvokeOptions`] |
//! | `node` | Target graph value model | [`Node`], [`HostObject`] |
//! | `eventual` | Possibly-async composition | [`Eventual`] |
//! | `engine` | Instance-scoped facade | [`Engine`] |
//! | `error` | Structured failures | [`ParseError`], [`InvokeError`] |
//!
//! ## Execution Contract
//!
//! 1. Parse a query once with [`parse_query`].
//! 2. Invoke the compiled expression many times with [`invoke_expression`].
//! 3. The result is [`Eventual`]: settled when the whole walk was
//!    synchronous, a future the moment any attribute, method, or
//!    authorizer answer suspended.
//!
//! Access policy (`authorizer`) and error recovery (`error_handler`) are
//! ordinary function values carried by [`InvokeOptions`].
//!
//! ## Hello World
//!
//! ```no_run
//! use mirq_core::{invoke_query, InvokeOptions, Node, ParseOptions};
//! use serde_json::json;
//!
//! let target = Node::Data(json!({"movie": {"title": "Inception", "year": 2010}}));
//! let query = json!({"movie": {"title": true, "year": true}});
//!
//! let result = invoke_query(target, &query, &ParseOptions::default(), &InvokeOptions::default())
//!     .expect("parse")
//!     .into_ready()
//!     .expect("synchronous target")
//!     .expect("invoke");
//! assert_eq!(result, json!({"movie": {"title": "Inception", "year": 2010}}));
//! ```
//!
//! ## Methods, Renaming, Slicing
//!
//! ```no_run
//! use mirq_core::{Engine, Eventual, Node};
//! use serde_json::json;
//!
//! let mut engine = Engine::new();
//! engine.register("movies", |_, _, _| {
//!     Eventual::ready(Node::Data(json!([
//!         {"title": "Inception"},
//!         {"title": "The Matrix"},
//!     ])))
//! });
//!
//! let query = json!({"movies=>titles": {"()": [], "=>": {"[]": [], "title": true}}});
//! let result = engine
//!     .run(Node::Data(json!({})), &query)
//!     .expect("parse")
//!     .into_ready()
//!     .expect("sync")
//!     .expect("invoke");
//! assert_eq!(result, json!({"titles": [{"title": "Inception"}, {"title": "The Matrix"}]}));
//! ```

pub mod engine;
pub mod error;
pub mod eventual;
pub mod expression;
pub mod node;
pub mod parser;
pub mod runtime;

use serde_json::Value;

pub use engine::Engine;
pub use error::{InvokeError, ParseError};
pub use eventual::Eventual;
pub use expression::{ElementSelector, Expression, ExpressionNode};
pub use node::{HostObject, Node};
pub use parser::{parse_query, KeyPattern, ParseOptions};
pub use runtime::{
    invoke_expression, Authorizer, ErrorHandler, InvokeOptions, Method, Methods, Operation,
};

/// Parse a query and invoke it against `target` in one step.
///
/// Grammar violations surface immediately as [`ParseError`]; runtime
/// failures travel inside the returned [`Eventual`].
pub fn invoke_query(
    target: Node,
    query: &Value,
    parse_options: &ParseOptions,
    invoke_options: &InvokeOptions,
) -> Result<Eventual<Value>, ParseError> {
    let expression = parse_query(query, parse_options)?;
    Ok(invoke_expression(target, &expression, invoke_options))
}
