//! The will/did tag observation protocol.
//!
//! Every tag render is bracketed by the hooks registered in its scope chain:
//!
//! 1. **Will phase**: hooks are visited from the innermost node to the root.
//!    Each will function receives the current candidate value and returns its
//!    replacement. The visited hooks form the tag's observer stack.
//! 2. **Rendering** of the final candidate.
//! 3. **Did phase**: did functions run in the exact reverse of the will
//!    order, outermost first, with the rendered text or `None` on failure.
//!    This phase always completes before a failure propagates.
//!
//! With k nested hooks around one tag, will runs k..1 and did runs 1..k.

use tracing::debug;

use crate::error::RenderResult;
use crate::scope::ScopeChain;
use crate::tag::TagDescriptor;
use crate::value::{Observer, Value};

/// Runs the hook protocol for one tag instance.
pub struct HookCoordinator<'a> {
    tag: &'a TagDescriptor,
}

impl<'a> HookCoordinator<'a> {
    pub fn new(tag: &'a TagDescriptor) -> Self {
        Self { tag }
    }

    /// Renders `candidate` with `render`, inside the will and did phases of
    /// every hook registered in `scope`.
    pub fn observe<F>(&self, scope: &ScopeChain, candidate: Value, render: F) -> RenderResult<String>
    where
        F: FnOnce(&Value) -> RenderResult<String>,
    {
        let (value, observers) = self.will_render(scope, candidate);
        let result = render(&value);
        self.did_render(&observers, &value, result.as_deref().ok());
        result
    }

    /// Runs the will phase, returning the final candidate and the observer
    /// stack in invocation order.
    pub fn will_render<'s>(&self, scope: &'s ScopeChain, candidate: Value) -> (Value, Vec<&'s Observer>) {
        let mut value = candidate;
        let mut observers = Vec::new();
        for observer in scope.hooks() {
            value = observer.will_render(self.tag, value);
            observers.push(observer);
        }
        if !observers.is_empty() {
            debug!(
                "{} hooks observing {} tag {}",
                observers.len(),
                self.tag.kind,
                self.tag.expression
            );
        }
        (value, observers)
    }

    /// Runs the did phase over `observers` in reverse invocation order.
    pub fn did_render(&self, observers: &[&Observer], value: &Value, text: Option<&str>) {
        for observer in observers.iter().rev() {
            observer.did_render(self.tag, value, text);
        }
    }
}
