//! The host-side tagged value sum used for data bundles and eval results.
//!
//! Replaces the source system's string-keyed `map[string]any` plus runtime
//! type assertions with a closed enum. Conversions at each engine boundary
//! operate on this type; unknown host types are rejected at the boundary.

use std::collections::{BTreeMap, BTreeSet};

/// A single HTTP-request-shaped value, produced by request flattening
/// (spec §4.2) and consumed wherever a script reads `ctx["request"]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestValue {
    pub method: String,
    pub url: String,
    pub host: String,
    pub scheme: String,
    pub path: String,
    pub proto: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
    pub content_length: i64,
    pub remote_addr: String,
    pub query_params: BTreeMap<String, Vec<String>>,
}

/// The closed set of host-representable values.
///
/// `Map`/`Set`/`StringListMap` use `BTreeMap`/`BTreeSet` rather than a hash
/// collection so iteration order is always key-sorted — this is what makes
/// `EvalResult::inspect()`'s "maps use sorted keys for determinism"
/// requirement free, instead of a separate sort pass at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Map(BTreeMap<String, Value>),
    StringListMap(BTreeMap<String, Vec<String>>),
    Set(BTreeSet<String>),
    Request(RequestValue),
    /// Host-to-engine direction only: naming a function by its engine-native
    /// name lets host input reference one without round-tripping the
    /// callable itself. The reverse direction never produces this variant —
    /// an engine value that IS a function and was never called converts to
    /// `ConversionFailed` instead (spec §4.6), since scripts never receive a
    /// callable as host output.
    Function(String),
    /// Descriptive marker only, for the same reason as `Function`.
    Error(String),
}

/// The closed set of runtime type tags stamped onto an [`crate::result::EvalResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    None,
    Bool,
    Int,
    Float,
    String,
    List,
    Tuple,
    Map,
    Set,
    Function,
    Error,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::None => "none",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::String => "string",
            TypeTag::List => "list",
            TypeTag::Tuple => "tuple",
            TypeTag::Map => "map",
            TypeTag::Set => "set",
            TypeTag::Function => "function",
            TypeTag::Error => "error",
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Value {
    /// Derive this value's [`TypeTag`]. `Request` values are represented as
    /// maps on the wire, so they tag as `Map` (there is no `request` tag in
    /// the closed set — see spec §3).
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::None,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::String(_) => TypeTag::String,
            Value::List(_) => TypeTag::List,
            Value::Tuple(_) => TypeTag::Tuple,
            Value::Map(_) | Value::Request(_) | Value::StringListMap(_) | Value::Set(_) => {
                TypeTag::Map
            }
            Value::Function(_) => TypeTag::Function,
            Value::Error(_) => TypeTag::Error,
        }
    }

    /// Language-neutral textual form: strings are quoted, bools lowercase,
    /// maps render with sorted keys (free, since `Map` is a `BTreeMap`).
    pub fn inspect(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => format!("{:?}", s),
            Value::List(items) | Value::Tuple(items) => {
                let rendered: Vec<String> = items.iter().map(Value::inspect).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Map(m) => {
                let rendered: Vec<String> = m
                    .iter()
                    .map(|(k, v)| format!("{:?}: {}", k, v.inspect()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::StringListMap(m) => {
                let rendered: Vec<String> = m
                    .iter()
                    .map(|(k, v)| format!("{:?}: [{}]", k, v.join(", ")))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::Set(s) => {
                let rendered: Vec<String> = s.iter().map(|v| format!("{:?}", v)).collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::Request(r) => format!("<request {} {}>", r.method, r.url),
            Value::Function(name) => format!("<function {}>", name),
            Value::Error(msg) => format!("<error {:?}>", msg),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
