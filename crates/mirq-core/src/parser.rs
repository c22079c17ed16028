//! Query → [`Expression`] parser.
//!
//! A pure structural recursion over the JSON query: no I/O, no access to
//! the target graph. Reserved markers (`()`, `[]`, `<=`, `||`) become
//! dedicated expression fields, user keys go through the
//! `source[?][=>[target]]` grammar, and ignore/accept filtering drops
//! source keys before their subqueries are ever looked at.

use crate::error::ParseError;
use crate::expression::{ElementSelector, Expression, ExpressionNode};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::OnceLock;
use tracing::trace;

/// Marker whose value is the ordered parameter list of a method call.
pub const PARAMS_KEY: &str = "()";
/// Marker whose value selects collection elements.
pub const ELEMENTS_KEY: &str = "[]";
/// Marker whose value replaces the resolved target before descending.
pub const SOURCE_VALUE_KEY: &str = "<=";
/// Marker whose value is a list of queries evaluated in parallel.
pub const PARALLEL_KEY: &str = "||";
/// Separator renaming a source key into a target key.
pub const TARGET_SEPARATOR: &str = "=>";

const OPTIONAL_SUFFIX: char = '?';

/// A source-key filter: literal equality or a regex.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    Exact(String),
    Matches(Regex),
}

impl KeyPattern {
    fn is_match(&self, key: &str) -> bool {
        match self {
            KeyPattern::Exact(literal) => literal == key,
            KeyPattern::Matches(pattern) => pattern.is_match(key),
        }
    }
}

impl From<&str> for KeyPattern {
    fn from(literal: &str) -> Self {
        KeyPattern::Exact(literal.into())
    }
}

impl From<String> for KeyPattern {
    fn from(literal: String) -> Self {
        KeyPattern::Exact(literal)
    }
}

impl From<Regex> for KeyPattern {
    fn from(pattern: Regex) -> Self {
        KeyPattern::Matches(pattern)
    }
}

/// Parse-time options.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Source keys matching any of these are dropped, subquery included.
    pub ignore_keys: Vec<KeyPattern>,
    /// Matches here survive both `ignore_keys` and the built-in set.
    pub accept_keys: Vec<KeyPattern>,
    /// Drop keys colliding with the host built-in key set. Defaults to on.
    pub ignore_builtin_keys: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            ignore_keys: Vec::new(),
            accept_keys: Vec::new(),
            ignore_builtin_keys: true,
        }
    }
}

/// Names every Rust value answers through universal trait impls. A query
/// has no business reaching generic object machinery, so these are
/// filtered unless explicitly accepted. Process-wide, built on first use.
fn builtin_keys() -> &'static HashSet<&'static str> {
    static KEYS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    KEYS.get_or_init(|| {
        [
            "clone",
            "to_string",
            "type_id",
            "fmt",
            "hash",
            "eq",
            "ne",
            "cmp",
            "partial_cmp",
            "borrow",
            "borrow_mut",
            "as_ref",
            "as_mut",
            "into",
            "try_into",
            "drop",
        ]
        .into_iter()
        .collect()
    })
}

/// Compile a query into an executable expression tree.
///
/// Fails with [`ParseError`] on any grammar violation; parse errors are
/// fatal and abort the whole parse.
pub fn parse_query(query: &Value, options: &ParseOptions) -> Result<Expression, ParseError> {
    trace!("parsing query");
    parse_with_frame(query, "", false, options)
}

/// `source_key` and `is_optional` form the frame inherited by array
/// elements and `||` branches: siblings share the traversal position of
/// the key they hang under.
fn parse_with_frame(
    query: &Value,
    source_key: &str,
    is_optional: bool,
    options: &ParseOptions,
) -> Result<Expression, ParseError> {
    match query {
        Value::Array(items) => {
            let children = items
                .iter()
                .map(|item| parse_with_frame(item, source_key, is_optional, options))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expression::Sequence(Rc::new(children)))
        }
        Value::Bool(true) => Ok(Expression::node(ExpressionNode::leaf(
            source_key,
            is_optional,
        ))),
        Value::Object(entries) if entries.contains_key(PARALLEL_KEY) => {
            parse_parallel(entries, source_key, is_optional, options)
        }
        Value::Object(entries) => parse_object(entries, source_key, is_optional, options),
        other => Err(ParseError::new(format!(
            "invalid query: expected `true`, an object, or an array (got `{other}`)"
        ))),
    }
}

fn parse_parallel(
    entries: &Map<String, Value>,
    source_key: &str,
    is_optional: bool,
    options: &ParseOptions,
) -> Result<Expression, ParseError> {
    if entries.len() != 1 {
        return Err(ParseError::for_key(
            "`||` must be the only key of its object",
            PARALLEL_KEY,
        ));
    }
    let branches = entries
        .get(PARALLEL_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::for_key("`||` expects an array of queries", PARALLEL_KEY))?;
    let children = branches
        .iter()
        .map(|branch| parse_with_frame(branch, source_key, is_optional, options))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expression::Parallel(Rc::new(children)))
}

fn parse_object(
    entries: &Map<String, Value>,
    source_key: &str,
    is_optional: bool,
    options: &ParseOptions,
) -> Result<Expression, ParseError> {
    let mut node = ExpressionNode::leaf(source_key, is_optional);

    for (key, value) in entries {
        match key.as_str() {
            PARAMS_KEY => {
                if node.params.is_some() {
                    return Err(duplicate_marker(PARAMS_KEY));
                }
                let params = value.as_array().ok_or_else(|| {
                    ParseError::for_key("`()` expects an array of parameters", PARAMS_KEY)
                })?;
                node.params = Some(params.clone());
            }
            ELEMENTS_KEY => {
                if node.selector.is_some() {
                    return Err(duplicate_marker(ELEMENTS_KEY));
                }
                node.selector = Some(parse_selector(value)?);
            }
            SOURCE_VALUE_KEY => {
                if node.source_value.is_some() {
                    return Err(duplicate_marker(SOURCE_VALUE_KEY));
                }
                node.source_value = Some(value.clone());
            }
            _ => {
                let parts = parse_key(key)?;
                if is_key_ignored(&parts.source, options) {
                    continue;
                }
                let child = parse_with_frame(value, &parts.source, parts.is_optional, options)?;
                if parts.target.is_empty() {
                    if node.next.is_some() {
                        return Err(ParseError::for_key(
                            "an object may hold at most one empty target (`=>`)",
                            key.as_str(),
                        ));
                    }
                    node.next = Some(child);
                } else {
                    node.nested.push((parts.target, child));
                }
            }
        }
    }

    if node.next.is_some() && !node.nested.is_empty() {
        return Err(ParseError::new(
            "cannot mix an empty target (`=>`) with named targets in one object",
        ));
    }

    Ok(Expression::node(node))
}

fn duplicate_marker(marker: &str) -> ParseError {
    ParseError::for_key(format!("duplicate `{marker}` marker"), marker)
}

struct KeyParts {
    source: String,
    target: String,
    is_optional: bool,
}

/// Split a user key along the `source[?][=>[target]]` grammar.
fn parse_key(key: &str) -> Result<KeyParts, ParseError> {
    let mut parts = key.split(TARGET_SEPARATOR);
    let source_part = parts.next().unwrap_or_default();
    let target_part = parts.next();
    if parts.next().is_some() {
        return Err(ParseError::for_key(
            "a key may contain at most one `=>`",
            key,
        ));
    }

    let (source, is_optional) = match source_part.strip_suffix(OPTIONAL_SUFFIX) {
        Some(stripped) => (stripped.to_string(), true),
        None => (source_part.to_string(), false),
    };
    let target = match target_part {
        Some(explicit) => explicit.to_string(),
        None => source.clone(),
    };

    Ok(KeyParts {
        source,
        target,
        is_optional,
    })
}

fn parse_selector(value: &Value) -> Result<ElementSelector, ParseError> {
    match value {
        Value::Number(_) => Ok(ElementSelector::Index(selector_bound(value)?)),
        Value::Array(bounds) => {
            if bounds.len() > 2 {
                return Err(ParseError::for_key(
                    "`[]` expects at most two slice bounds",
                    ELEMENTS_KEY,
                ));
            }
            let start = bounds.first().map(selector_bound).transpose()?;
            let end = bounds.get(1).map(selector_bound).transpose()?;
            Ok(ElementSelector::Slice { start, end })
        }
        _ => Err(ParseError::for_key(
            "`[]` expects an index or an array of slice bounds",
            ELEMENTS_KEY,
        )),
    }
}

fn selector_bound(value: &Value) -> Result<i64, ParseError> {
    value.as_i64().ok_or_else(|| {
        ParseError::for_key("`[]` bounds must be integers", ELEMENTS_KEY)
    })
}

fn is_key_ignored(key: &str, options: &ParseOptions) -> bool {
    if options.accept_keys.iter().any(|p| p.is_match(key)) {
        return false;
    }
    if options.ignore_keys.iter().any(|p| p.is_match(key)) {
        return true;
    }
    options.ignore_builtin_keys && builtin_keys().contains(key)
}
