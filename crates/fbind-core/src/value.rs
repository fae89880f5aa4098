#![forbid(unsafe_code)]

//! The observable data model.
//!
//! A data object is an [`Object`]: a shared, ordered map from keys to
//! properties. Every property is either a [`ReactiveCell`] (with its own
//! dependency registry) or a [`Computed`] getter (no registry).
//!
//! # Equality
//!
//! [`Value`] equality is strict: scalars compare by value, objects by
//! identity. Two distinct objects with identical contents are unequal, so
//! replacing a sub-object always counts as a change.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::cell::ReactiveCell;
use crate::dep::Capture;
use crate::error::{BindError, Result};
use crate::path::Path;

/// A value stored in a data object.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(Object),
}

impl Value {
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Untracked snapshot as JSON. Computed properties are not included.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Object(obj) => obj.to_json(),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

/// Text rendering used by the view updaters.
///
/// `Null` renders empty; integral numbers render without a fraction;
/// objects render as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) if n.is_nan() => f.write_str("NaN"),
            Self::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Object(obj) => write!(f, "{}", obj.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Self::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Computed properties
// ---------------------------------------------------------------------------

/// Evaluation context handed to a computed getter.
pub struct ComputedScope<'a> {
    data: &'a Object,
    capture: Option<Capture<'a>>,
}

impl ComputedScope<'_> {
    /// The data object the getter is installed on.
    #[must_use]
    pub fn data(&self) -> &Object {
        self.data
    }

    /// Resolve `expr` against the data object.
    ///
    /// Reads are untracked unless the property was defined with tracking on.
    pub fn get(&self, expr: &str) -> Result<Value> {
        let path = Path::parse(expr)?;
        self.data.resolve(&path, self.capture)
    }
}

/// Getter signature for computed properties.
pub type ComputedFn = Rc<dyn Fn(&ComputedScope<'_>) -> Result<Value>>;

/// A read-only derived property. It owns no registry.
#[derive(Clone)]
pub struct Computed {
    getter: ComputedFn,
    tracked: bool,
}

impl Computed {
    pub fn new(getter: impl Fn(&ComputedScope<'_>) -> Result<Value> + 'static) -> Self {
        Self {
            getter: Rc::new(getter),
            tracked: false,
        }
    }

    /// Forward the caller's capture to the getter's own reads.
    #[must_use]
    pub fn tracked(mut self, tracked: bool) -> Self {
        self.tracked = tracked;
        self
    }

    fn evaluate(&self, data: &Object, capture: Option<Capture<'_>>) -> Result<Value> {
        let scope = ComputedScope {
            data,
            capture: if self.tracked { capture } else { None },
        };
        (self.getter)(&scope)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("tracked", &self.tracked)
            .finish_non_exhaustive()
    }
}

/// A property slot on an [`Object`].
#[derive(Clone, Debug)]
pub enum Property {
    Reactive(Rc<ReactiveCell>),
    Computed(Computed),
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

struct ObjectInner {
    id: u64,
    props: RefCell<IndexMap<String, Property>>,
}

/// Shared handle to an intercepted data object.
///
/// Cloning the handle shares the object. Equality is identity.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.inner.id)
            .field("keys", &self.inner.props.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Object {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
                props: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Build an object from `(key, value)` pairs, each becoming a reactive property.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let obj = Self::new();
        for (k, v) in entries {
            obj.define_reactive(k, v);
        }
        obj
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Define (or redefine) `key` as a reactive property holding `value`.
    pub fn define_reactive(&self, key: impl Into<String>, value: impl Into<Value>) -> Rc<ReactiveCell> {
        let cell = Rc::new(ReactiveCell::new(value.into()));
        self.inner
            .props
            .borrow_mut()
            .insert(key.into(), Property::Reactive(Rc::clone(&cell)));
        cell
    }

    /// Define (or redefine) `key` as a read-only computed property.
    pub fn define_computed(&self, key: impl Into<String>, computed: Computed) {
        self.inner
            .props
            .borrow_mut()
            .insert(key.into(), Property::Computed(computed));
    }

    fn property(&self, key: &str) -> Option<Property> {
        self.inner.props.borrow().get(key).cloned()
    }

    /// The reactive cell behind `key`, if it is a reactive property.
    #[must_use]
    pub fn cell(&self, key: &str) -> Option<Rc<ReactiveCell>> {
        match self.property(key)? {
            Property::Reactive(cell) => Some(cell),
            Property::Computed(_) => None,
        }
    }

    /// Read `key` through its read trap. `None` if the key is absent.
    pub fn read(&self, key: &str, capture: Option<Capture<'_>>) -> Option<Result<Value>> {
        Some(match self.property(key)? {
            Property::Reactive(cell) => Ok(cell.read(capture)),
            Property::Computed(computed) => computed.evaluate(self, capture),
        })
    }

    /// Untracked read of a single key.
    pub fn get(&self, key: &str) -> Result<Value> {
        self.read(key, None).unwrap_or_else(|| {
            Err(BindError::MissingPath {
                path: key.to_owned(),
                segment: key.to_owned(),
            })
        })
    }

    /// Write `key` through its write trap. Returns whether the value changed.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<bool> {
        match self.property(key) {
            Some(Property::Reactive(cell)) => cell.write(value.into()),
            Some(Property::Computed(_)) => Err(BindError::ReadOnly {
                key: key.to_owned(),
            }),
            None => Err(BindError::MissingPath {
                path: key.to_owned(),
                segment: key.to_owned(),
            }),
        }
    }

    /// Evaluate `path`, reading every segment under `capture`.
    pub fn resolve(&self, path: &Path, capture: Option<Capture<'_>>) -> Result<Value> {
        let mut current = Value::Object(self.clone());
        for segment in path.segments() {
            current = step(&current, path, segment, capture)?;
        }
        Ok(current)
    }

    /// Assign `value` at `path`. Parent segments are read untracked.
    pub fn assign(&self, path: &Path, value: impl Into<Value>) -> Result<bool> {
        let (parents, last) = path.split_last();
        let mut current = Value::Object(self.clone());
        for segment in parents {
            current = step(&current, path, segment, None)?;
        }
        let Value::Object(target) = current else {
            return Err(not_an_object(path, parents.last().map_or("", String::as_str)));
        };
        match target.set(last, value) {
            Err(BindError::MissingPath { .. }) => Err(BindError::MissingPath {
                path: path.to_string(),
                segment: last.to_owned(),
            }),
            other => other,
        }
    }

    /// Reactive (enumerable) keys, in definition order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .props
            .borrow()
            .iter()
            .filter(|(_, p)| matches!(p, Property::Reactive(_)))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Computed keys, in definition order.
    #[must_use]
    pub fn computed_keys(&self) -> Vec<String> {
        self.inner
            .props
            .borrow()
            .iter()
            .filter(|(_, p)| matches!(p, Property::Computed(_)))
            .map(|(k, _)| k.clone())
            .collect()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.props.borrow().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.props.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.props.borrow().is_empty()
    }

    /// Untracked JSON snapshot of the reactive properties.
    ///
    /// Recurses without cycle detection; an object that contains itself
    /// will not terminate.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let cells: Vec<(String, Rc<ReactiveCell>)> = self
            .inner
            .props
            .borrow()
            .iter()
            .filter_map(|(k, p)| match p {
                Property::Reactive(cell) => Some((k.clone(), Rc::clone(cell))),
                Property::Computed(_) => None,
            })
            .collect();
        let map = cells
            .into_iter()
            .map(|(k, cell)| (k, cell.get().to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

fn step(current: &Value, path: &Path, segment: &str, capture: Option<Capture<'_>>) -> Result<Value> {
    let Value::Object(obj) = current else {
        return Err(not_an_object(path, segment));
    };
    obj.read(segment, capture).unwrap_or_else(|| {
        Err(BindError::MissingPath {
            path: path.to_string(),
            segment: segment.to_owned(),
        })
    })
}

fn not_an_object(path: &Path, segment: &str) -> BindError {
    BindError::NotAnObject {
        path: path.to_string(),
        segment: segment.to_owned(),
    }
}
