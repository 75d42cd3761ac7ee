//! Expression evaluation and filter calls.

use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::scope::ScopeChain;
use crate::tag::Expression;
use crate::value::Value;

/// Evaluates tag expressions against a scope chain.
///
/// Only the first component of a dotted path walks the scope chain. Every
/// later `.key` is a keyed lookup on the value resolved so far, so `f(x).y`
/// applies `f` and then looks `y` up in its result.
pub struct FilterInvoker<'a> {
    scope: &'a ScopeChain,
}

impl<'a> FilterInvoker<'a> {
    pub fn new(scope: &'a ScopeChain) -> Self {
        Self { scope }
    }

    /// Resolves `expression` to a value. Missing keys resolve to the empty
    /// value; only filter calls can fail.
    pub fn evaluate(&self, expression: &Expression) -> RenderResult<Value> {
        match expression {
            Expression::Implicit => Ok(self.scope.top()),
            Expression::Identifier(name) => Ok(self.scope.resolve(name)),
            Expression::Scoped { base, key } => {
                let base = self.evaluate(base)?;
                Ok(base.lookup(key).unwrap_or_default())
            }
            Expression::Filtered { filter, argument } => {
                let function = self.evaluate(filter)?;
                let argument = self.evaluate(argument)?;
                Self::invoke(filter, &function, argument)
            }
        }
    }

    /// Calls `function` with `argument`. `expression` names the filter in
    /// errors.
    pub fn invoke(expression: &Expression, function: &Value, argument: Value) -> RenderResult<Value> {
        debug!("Applying filter {}", expression);
        function
            .call_filter(argument)
            .unwrap_or_else(|| {
                Err(RenderError::FilterNotCallable {
                    name: expression.to_string(),
                })
            })
    }
}
