//! Persistent scope chains.
//!
//! A [`ScopeChain`] is a linked list of immutable nodes, innermost first. Each
//! node may push a scope value for lookups and may register a hook. Extending
//! a chain allocates one new node pointing at the existing one, so any number
//! of chains can share a tail and a chain handed to a closure stays valid
//! after rendering moves on.

use std::fmt;
use std::sync::Arc;

use crate::stdlib::standard_library;
use crate::value::{Observer, Position, Value};

struct ScopeNode {
    parent: Option<Arc<ScopeNode>>,
    scope: Option<Value>,
    hook: Option<Value>,
}

/// An immutable chain of lookup scopes and registered hooks.
#[derive(Clone, Default)]
pub struct ScopeChain {
    head: Option<Arc<ScopeNode>>,
}

impl ScopeChain {
    /// An empty chain: every lookup resolves to the empty value.
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain holding the standard library filters (`each`, `uppercase`...).
    pub fn standard() -> Self {
        Self::new().with_scope(standard_library())
    }

    /// Pushes `value` as the innermost scope.
    ///
    /// A value carrying an observer is registered as a hook on the same node.
    pub fn extended(&self, value: Value) -> Self {
        let hook = value.as_observer().is_some().then(|| value.clone());
        self.push(Some(value), hook)
    }

    /// Pushes `value` for lookups only.
    pub fn with_scope(&self, value: Value) -> Self {
        self.push(Some(value), None)
    }

    /// Registers `hook` without pushing it as a scope.
    pub fn with_hook(&self, hook: Value) -> Self {
        self.push(None, Some(hook))
    }

    fn push(&self, scope: Option<Value>, hook: Option<Value>) -> Self {
        Self {
            head: Some(Arc::new(ScopeNode {
                parent: self.head.clone(),
                scope,
                hook,
            })),
        }
    }

    /// The innermost scope value, what `.` resolves to.
    pub fn top(&self) -> Value {
        self.scopes().next().cloned().unwrap_or_default()
    }

    /// Resolves a single identifier by walking scopes from the innermost out.
    ///
    /// The first scope that has the key wins, whatever its value. Unknown
    /// names resolve to the empty value. `@key`, `@index`, `@first` and
    /// `@last` describe the innermost positioned element (see the `each`
    /// filter) and are empty outside of one.
    pub fn resolve(&self, identifier: &str) -> Value {
        match identifier {
            "@key" => self
                .position()
                .and_then(|position| position.key.as_deref())
                .map(Value::from)
                .unwrap_or_default(),
            "@index" => self
                .position()
                .map(|position| Value::from(position.index))
                .unwrap_or_default(),
            "@first" => self
                .position()
                .map(|position| Value::from(position.first))
                .unwrap_or_default(),
            "@last" => self
                .position()
                .map(|position| Value::from(position.last))
                .unwrap_or_default(),
            name => self
                .scopes()
                .find_map(|scope| scope.lookup(name))
                .unwrap_or_default(),
        }
    }

    /// Position of the innermost element pushed by an `each` iteration.
    pub fn position(&self) -> Option<&Position> {
        self.scopes().find_map(Value::position)
    }

    /// Scope values, innermost first.
    pub fn scopes(&self) -> impl Iterator<Item = &Value> {
        self.nodes().filter_map(|node| node.scope.as_ref())
    }

    /// Registered observers, innermost first.
    pub fn hooks(&self) -> impl Iterator<Item = &Observer> {
        self.nodes()
            .filter_map(|node| node.hook.as_ref())
            .filter_map(Value::as_observer)
    }

    /// Number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    fn nodes(&self) -> Nodes<'_> {
        Nodes {
            next: self.head.as_deref(),
        }
    }
}

struct Nodes<'a> {
    next: Option<&'a ScopeNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a ScopeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.parent.as_deref();
        Some(node)
    }
}

impl fmt::Debug for ScopeChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeChain")
            .field("nodes", &self.len())
            .field("hooks", &self.hooks().count())
            .finish()
    }
}
