//! The untyped value model, produced when the target type is [`Value`].
use std::any::Any;
use std::fmt;

/// The object representation of an untyped [`Value`].
pub type Map = hashbrown::HashMap<String, Value>;

/// An untyped JSON value.
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),

    /// An object whose type tag named a registered record, parsed as that record.
    Typed(TypedValue),
}

/// A JSON number, kept as its source text so that no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number(String);

impl Number {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    /// Gets the source text of this number.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record selected by a type tag in an untyped parse.
pub struct TypedValue {
    name: &'static str,
    value: Box<dyn Any>,
}

impl TypedValue {
    pub(crate) fn new(name: &'static str, value: Box<dyn Any>) -> Self {
        Self { name, value }
    }

    /// Gets the type name the tag resolved to.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Indicates whether the record has type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Gets the record, if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Takes the record, if it has type `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self {
                name: self.name,
                value,
            }),
        }
    }
}

impl Value {
    /// Gets the member of an object with the given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(name),
            _ => None,
        }
    }

    /// Iterates over the children of an array or object, along with their names. Array
    /// elements have no name; primitives have no children.
    pub fn members(&self) -> Box<dyn Iterator<Item = (Option<&str>, &Value)> + '_> {
        match self {
            Value::Array(items) => Box::new(items.iter().map(|item| (None, item))),
            Value::Object(map) => Box::new(map.iter().map(|(k, v)| (Some(k.as_str()), v))),
            _ => Box::new(std::iter::empty()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Indicates whether this is a null, boolean, number or string.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(number) => Some(number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_typed(&self) -> Option<&TypedValue> {
        match self {
            Value::Typed(typed) => Some(typed),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Typed values are never equal, since their records are opaque.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(value) => write!(f, "Bool({value})"),
            Value::Number(number) => write!(f, "Number({number})"),
            Value::String(value) => write!(f, "String({value:?})"),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Object(map) => f.debug_map().entries(map).finish(),
            Value::Typed(typed) => write!(f, "Typed({})", typed.name),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

#[test]
fn test_accessors() {
    let mut map = Map::new();
    map.insert("a".to_owned(), Value::Array(vec![Value::Null, true.into()]));
    map.insert("b".to_owned(), "text".into());
    let value = Value::Object(map);
    assert!(value.is_object());
    assert!(!value.is_primitive());
    assert_eq!(value.get("b").and_then(Value::as_str), Some("text"));
    let a = value.get("a").unwrap();
    assert!(a.is_array());
    assert_eq!(a.members().count(), 2);
    assert!(a.members().all(|(name, _)| name.is_none()));
    assert_eq!(value.members().count(), 2);
    assert_eq!(value.get("c"), None);
}
