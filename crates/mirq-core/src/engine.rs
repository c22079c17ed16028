use crate::error::ParseError;
use crate::eventual::Eventual;
use crate::expression::Expression;
use crate::node::Node;
use crate::parser::{parse_query, ParseOptions};
use crate::runtime::{invoke_expression, InvokeOptions, Method};
use serde_json::Value;

/// Instance-scoped query surface.
///
/// Keeps method registration and policy configuration instance-local (no
/// global singleton), so different hosts can expose different graphs with
/// different access rules safely.
#[derive(Default)]
pub struct Engine {
    parse_options: ParseOptions,
    invoke_options: InvokeOptions,
}

impl Engine {
    /// Create an engine with default options: built-in keys filtered,
    /// everything authorized, failures propagated.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(parse_options: ParseOptions, invoke_options: InvokeOptions) -> Self {
        Self {
            parse_options,
            invoke_options,
        }
    }

    /// Register or replace a method for plain-data targets.
    pub fn register<F>(&mut self, name: impl Into<String>, method: F) -> Option<Method>
    where
        F: Fn(&Value, &[Value], Option<&Value>) -> Eventual<Node> + 'static,
    {
        self.invoke_options.methods.register(name, method)
    }

    /// Compile once.
    pub fn parse(&self, query: &Value) -> Result<Expression, ParseError> {
        parse_query(query, &self.parse_options)
    }

    /// Execute a compiled expression, possibly many times.
    pub fn invoke(&self, target: Node, expression: &Expression) -> Eventual<Value> {
        invoke_expression(target, expression, &self.invoke_options)
    }

    /// Parse and execute in one step.
    pub fn run(&self, target: Node, query: &Value) -> Result<Eventual<Value>, ParseError> {
        Ok(self.invoke(target, &self.parse(query)?))
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    pub fn parse_options_mut(&mut self) -> &mut ParseOptions {
        &mut self.parse_options
    }

    pub fn invoke_options(&self) -> &InvokeOptions {
        &self.invoke_options
    }

    pub fn invoke_options_mut(&mut self) -> &mut InvokeOptions {
        &mut self.invoke_options
    }
}
