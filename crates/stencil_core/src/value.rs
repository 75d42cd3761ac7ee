//! The capability-tagged value model.
//!
//! A [`Value`] is the only datum the engine operates on. It wraps one data
//! shape (scalar, sequence, keyed collection, custom object or nothing at all)
//! and may additionally carry any of three capabilities:
//!
//! - a **render override**, which takes over rendering of the tag it is
//!   resolved by;
//! - a **filter**, which makes it callable as `f(x)` in expressions;
//! - an **observer**, a will/did hook pair registered into the scope chain
//!   whenever the value is pushed.
//!
//! Values never change after construction. Builders such as
//! [`Value::with_filter`] consume the value and return a new one; clones share
//! their storage.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::content::Rendering;
use crate::error::RenderResult;
use crate::render::RenderRequest;
use crate::tag::TagDescriptor;

/// Keyed collection with insertion order preserved.
pub type Map = IndexMap<String, Value>;

/// Render override: `(request) -> (text, content type)`.
pub type RenderFn = Arc<dyn Fn(&RenderRequest<'_>) -> RenderResult<Rendering> + Send + Sync>;

/// Filter: `(argument) -> result`.
pub type FilterFn = Arc<dyn Fn(Value) -> RenderResult<Value> + Send + Sync>;

/// Will-render hook: may substitute the value about to be rendered.
pub type WillRenderFn = Arc<dyn Fn(&TagDescriptor, Value) -> Value + Send + Sync>;

/// Did-render hook: observes the rendered text, or `None` on failure.
pub type DidRenderFn = Arc<dyn Fn(&TagDescriptor, &Value, Option<&str>) + Send + Sync>;

type LookupFn = Arc<dyn Fn(&(dyn Any + Send + Sync), &str) -> Option<Value> + Send + Sync>;

/// Shape of the data carried by a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Empty,
    Bool,
    Integer,
    Float,
    String,
    Sequence,
    Map,
    Custom,
}

#[derive(Clone, Default)]
enum Data {
    #[default]
    Empty,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(Arc<str>),
    Sequence(Arc<[Value]>),
    Map(Arc<Map>),
    Custom(CustomObject),
}

#[derive(Clone)]
struct CustomObject {
    object: Arc<dyn Any + Send + Sync>,
    lookup: Option<LookupFn>,
}

/// Position of an element produced by the `each` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Key of the element when iterating a keyed collection.
    pub key: Option<String>,
    pub index: usize,
    pub first: bool,
    pub last: bool,
}

impl Position {
    pub fn new(index: usize, len: usize) -> Self {
        Self {
            key: None,
            index,
            first: index == 0,
            last: index + 1 == len,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// A will/did hook pair. Either side may be absent.
#[derive(Clone, Default)]
pub struct Observer {
    will: Option<WillRenderFn>,
    did: Option<DidRenderFn>,
}

impl Observer {
    pub fn new(will: Option<WillRenderFn>, did: Option<DidRenderFn>) -> Self {
        Self { will, did }
    }

    pub fn has_will_render(&self) -> bool {
        self.will.is_some()
    }

    pub fn has_did_render(&self) -> bool {
        self.did.is_some()
    }

    /// Runs the will side, returning the substituted value.
    pub fn will_render(&self, tag: &TagDescriptor, value: Value) -> Value {
        match &self.will {
            Some(will) => will(tag, value),
            None => value,
        }
    }

    pub fn did_render(&self, tag: &TagDescriptor, value: &Value, text: Option<&str>) {
        if let Some(did) = &self.did {
            did(tag, value, text);
        }
    }
}

/// The universal datum of the engine.
#[derive(Clone, Default)]
pub struct Value {
    data: Data,
    render: Option<RenderFn>,
    filter: Option<FilterFn>,
    observer: Option<Observer>,
    position: Option<Arc<Position>>,
}

impl Value {
    /// The empty value: falsy, renders as nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An ordered sequence.
    pub fn sequence<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::from_data(Data::Sequence(
            items.into_iter().map(Into::<Value>::into).collect(),
        ))
    }

    /// A keyed collection, keeping the iteration order of `entries`.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map: Map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_data(Data::Map(Arc::new(map)))
    }

    /// A custom object whose keys are resolved by `lookup`.
    pub fn custom<T, F>(object: T, lookup: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &str) -> Option<Value> + Send + Sync + 'static,
    {
        let lookup: LookupFn = Arc::new(move |object: &(dyn Any + Send + Sync), key: &str| {
            object.downcast_ref::<T>().and_then(|object| lookup(object, key))
        });
        Self::from_data(Data::Custom(CustomObject {
            object: Arc::new(object),
            lookup: Some(lookup),
        }))
    }

    /// A custom object without any keys. It is truthy and can be extracted
    /// again with [`Value::downcast_ref`].
    pub fn opaque<T: Any + Send + Sync>(object: T) -> Self {
        Self::from_data(Data::Custom(CustomObject {
            object: Arc::new(object),
            lookup: None,
        }))
    }

    /// A value that renders itself.
    pub fn render_fn<F>(render: F) -> Self
    where
        F: Fn(&RenderRequest<'_>) -> RenderResult<Rendering> + Send + Sync + 'static,
    {
        Self::empty().with_render_fn(render)
    }

    /// A value callable as a filter.
    pub fn filter<F>(filter: F) -> Self
    where
        F: Fn(Value) -> RenderResult<Value> + Send + Sync + 'static,
    {
        Self::empty().with_filter(filter)
    }

    /// A pure observer carrying both hooks. It has no data and is falsy.
    pub fn observer<W, D>(will: W, did: D) -> Self
    where
        W: Fn(&TagDescriptor, Value) -> Value + Send + Sync + 'static,
        D: Fn(&TagDescriptor, &Value, Option<&str>) + Send + Sync + 'static,
    {
        let will: WillRenderFn = Arc::new(will);
        let did: DidRenderFn = Arc::new(did);
        Self::empty().with_observer(Observer::new(Some(will), Some(did)))
    }

    /// A pure observer with only a will-render hook.
    pub fn will_render<W>(will: W) -> Self
    where
        W: Fn(&TagDescriptor, Value) -> Value + Send + Sync + 'static,
    {
        let will: WillRenderFn = Arc::new(will);
        Self::empty().with_observer(Observer::new(Some(will), None))
    }

    /// A pure observer with only a did-render hook.
    pub fn did_render<D>(did: D) -> Self
    where
        D: Fn(&TagDescriptor, &Value, Option<&str>) + Send + Sync + 'static,
    {
        let did: DidRenderFn = Arc::new(did);
        Self::empty().with_observer(Observer::new(None, Some(did)))
    }

    fn from_data(data: Data) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn with_render_fn<F>(mut self, render: F) -> Self
    where
        F: Fn(&RenderRequest<'_>) -> RenderResult<Rendering> + Send + Sync + 'static,
    {
        let render: RenderFn = Arc::new(render);
        self.render = Some(render);
        self
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Value) -> RenderResult<Value> + Send + Sync + 'static,
    {
        let filter: FilterFn = Arc::new(filter);
        self.filter = Some(filter);
        self
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(Arc::new(position));
        self
    }

    pub fn kind(&self) -> ValueKind {
        match &self.data {
            Data::Empty => ValueKind::Empty,
            Data::Bool(_) => ValueKind::Bool,
            Data::Integer(_) => ValueKind::Integer,
            Data::Float(_) => ValueKind::Float,
            Data::String(_) => ValueKind::String,
            Data::Sequence(_) => ValueKind::Sequence,
            Data::Map(_) => ValueKind::Map,
            Data::Custom(_) => ValueKind::Custom,
        }
    }

    /// True when the value carries no data at all.
    pub fn is_empty(&self) -> bool {
        matches!(self.data, Data::Empty)
    }

    /// Empty values, `false`, and empty collections are falsy. Capabilities
    /// never affect truthiness.
    pub fn is_truthy(&self) -> bool {
        match &self.data {
            Data::Empty => false,
            Data::Bool(b) => *b,
            Data::Sequence(items) => !items.is_empty(),
            Data::Map(map) => !map.is_empty(),
            Data::Integer(_) | Data::Float(_) | Data::String(_) | Data::Custom(_) => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            Data::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.data {
            Data::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.data {
            Data::Integer(n) => Some(n as f64),
            Data::Float(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::String(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Sequence(items) => Some(&**items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match &self.data {
            Data::Map(map) => Some(&**map),
            _ => None,
        }
    }

    /// Extracts the payload of a custom value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match &self.data {
            Data::Custom(custom) => custom.object.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_observer(&self) -> Option<&Observer> {
        self.observer.as_ref()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_deref()
    }

    pub fn has_render_override(&self) -> bool {
        self.render.is_some()
    }

    pub fn is_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Keyed lookup on this value.
    ///
    /// `None` means the value has no such key; the scope walk keeps looking
    /// further out in that case. Besides their own entries, strings answer
    /// `length` and sequences answer `count`, `first` and `last`.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        match &self.data {
            Data::Map(map) => map.get(key).cloned(),
            Data::String(s) => match key {
                "length" => Some(Value::from(s.chars().count())),
                _ => None,
            },
            Data::Sequence(items) => match key {
                "count" => Some(Value::from(items.len())),
                "first" => Some(items.first().cloned().unwrap_or_default()),
                "last" => Some(items.last().cloned().unwrap_or_default()),
                _ => None,
            },
            Data::Custom(custom) => custom
                .lookup
                .as_ref()
                .and_then(|lookup| lookup(custom.object.as_ref(), key)),
            Data::Empty | Data::Bool(_) | Data::Integer(_) | Data::Float(_) => None,
        }
    }

    /// Scalar string conversion.
    ///
    /// `None` for sequences, keyed collections and custom objects, which can
    /// only be rendered through iteration or a render override.
    pub fn render_text(&self) -> Option<String> {
        match &self.data {
            Data::Empty => Some(String::new()),
            Data::Bool(b) => Some(b.to_string()),
            Data::Integer(n) => Some(n.to_string()),
            Data::Float(n) => Some(n.to_string()),
            Data::String(s) => Some(s.to_string()),
            Data::Sequence(_) | Data::Map(_) | Data::Custom(_) => None,
        }
    }

    /// Renders the value for the tag described by `request`.
    ///
    /// Uses the render override when there is one, and the default tag
    /// rendering otherwise. Hooks that wrap another value's rendering call
    /// this.
    pub fn render(&self, request: &RenderRequest<'_>) -> RenderResult<Rendering> {
        match &self.render {
            Some(render) => render(request),
            None => request.render_default(self),
        }
    }

    pub(crate) fn render_override(&self) -> Option<&RenderFn> {
        self.render.as_ref()
    }

    /// Calls the filter capability, or `None` if the value has none.
    pub fn call_filter(&self, argument: Value) -> Option<RenderResult<Value>> {
        self.filter.as_ref().map(|filter| filter(argument))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Value");
        match &self.data {
            Data::Empty => debug.field("data", &"empty"),
            Data::Bool(b) => debug.field("data", b),
            Data::Integer(n) => debug.field("data", n),
            Data::Float(n) => debug.field("data", n),
            Data::String(s) => debug.field("data", s),
            Data::Sequence(items) => debug.field("data", items),
            Data::Map(map) => debug.field("data", map),
            Data::Custom(_) => debug.field("data", &"custom"),
        };
        if self.render.is_some() {
            debug.field("render", &true);
        }
        if self.filter.is_some() {
            debug.field("filter", &true);
        }
        if self.observer.is_some() {
            debug.field("observer", &true);
        }
        if let Some(position) = &self.position {
            debug.field("position", position);
        }
        debug.finish()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::from_data(Data::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::from_data(Data::Integer(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::from(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::from(i64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        match i64::try_from(n) {
            Ok(n) => Self::from(n),
            Err(_) => Self::from(n as f64),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::from_data(Data::Float(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::from_data(Data::String(Arc::from(s)))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::from_data(Data::String(Arc::from(s)))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::sequence(items)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Self::sequence(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::from_data(Data::Map(Arc::new(map)))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::sequence(iter)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::map(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::empty().is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(Value::from(true).is_truthy());
        assert!(Value::from(0).is_truthy());
        assert!(Value::from("").is_truthy());
        assert!(!Value::sequence(Vec::<Value>::new()).is_truthy());
        assert!(Value::from([1, 2]).is_truthy());
        assert!(!Value::map(Vec::<(String, Value)>::new()).is_truthy());
        assert!(Value::opaque(42u8).is_truthy());
    }

    #[test]
    fn test_capabilities_do_not_affect_truthiness() {
        let observer = Value::will_render(|_, value| value);
        assert!(observer.is_empty());
        assert!(!observer.is_truthy());
        assert!(observer.as_observer().is_some());
        assert!(Value::from("x").as_observer().is_none());
        assert_eq!(observer.render_text(), Some(String::new()));

        let filter = Value::filter(Ok);
        assert!(!filter.is_truthy());
        assert!(filter.is_filter());

        let truthy_filter = Value::from("x").with_filter(Ok);
        assert!(truthy_filter.is_truthy());
    }

    #[test]
    fn test_render_text() {
        assert_eq!(Value::from(true).render_text().as_deref(), Some("true"));
        assert_eq!(Value::from(42).render_text().as_deref(), Some("42"));
        assert_eq!(Value::from(1.5).render_text().as_deref(), Some("1.5"));
        assert_eq!(Value::from("foo").render_text().as_deref(), Some("foo"));
        assert_eq!(Value::from([1]).render_text(), None);
        assert_eq!(Value::map([("a", 1)]).render_text(), None);
    }

    #[test]
    fn test_lookup() {
        let value = Value::map([("name", Value::from("Arthur"))]);
        assert_eq!(value.lookup("name").unwrap().as_str(), Some("Arthur"));
        assert!(value.lookup("missing").is_none());

        assert_eq!(Value::from("foo").lookup("length").unwrap().as_i64(), Some(3));
        assert!(Value::from("foo").lookup("foo").is_none());

        let items = Value::from([1, 2, 3]);
        assert_eq!(items.lookup("count").unwrap().as_i64(), Some(3));
        assert_eq!(items.lookup("first").unwrap().as_i64(), Some(1));
        assert_eq!(items.lookup("last").unwrap().as_i64(), Some(3));
        assert!(Value::from(1).lookup("count").is_none());
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let value: Value = vec![("z", 1), ("a", 2), ("m", 3)].into_iter().collect();
        let keys: Vec<&str> = value.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_custom_lookup_and_downcast() {
        struct Person {
            name: String,
        }

        let value = Value::custom(
            Person {
                name: "Arthur".to_string(),
            },
            |person, key| match key {
                "name" => Some(Value::from(person.name.as_str())),
                _ => None,
            },
        );

        assert_eq!(value.kind(), ValueKind::Custom);
        assert_eq!(value.lookup("name").unwrap().as_str(), Some("Arthur"));
        assert!(value.lookup("age").is_none());
        assert_eq!(value.downcast_ref::<Person>().unwrap().name, "Arthur");
        assert!(value.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_builders_return_new_values() {
        let original = Value::from("x");
        let filtered = original.clone().with_filter(Ok);
        assert!(!original.is_filter());
        assert!(filtered.is_filter());
        assert_eq!(filtered.as_str(), Some("x"));
    }

    #[test]
    fn test_position() {
        let position = Position::new(0, 2).with_key("a");
        assert!(position.first);
        assert!(!position.last);
        let value = Value::from(1).with_position(position.clone());
        assert_eq!(value.position(), Some(&position));
        assert!(Position::new(1, 2).last);
    }

    #[test]
    fn test_option_conversion() {
        assert!(Value::from(None::<&str>).is_empty());
        assert_eq!(Value::from(Some("x")).as_str(), Some("x"));
    }
}
