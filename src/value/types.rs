/*!
 * Value Types
 * Dynamic values manipulated by restricted code
 */

use super::collections::{DictRef, IterRef, ListRef};
use super::function::Function;
use smartstring::alias::String as SmartString;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Object provided by the embedding host
///
/// Host objects expose a flat attribute namespace. Reads through restricted
/// code always go through the guarded attribute dispatcher.
pub trait HostObject: Send + Sync + 'static {
    /// Type name used in diagnostics
    fn type_name(&self) -> &'static str;

    /// Native attribute lookup, `None` when the attribute does not exist
    fn get_attr(&self, name: &str) -> Option<Value>;

    /// Concrete type access, used for type identity
    fn as_any(&self) -> &dyn Any;
}

/// Runtime type identity of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    None,
    Bool,
    Int,
    Float,
    Str,
    Tuple,
    List,
    Dict,
    Function,
    Iter,
    Host(TypeId),
}

impl TypeKey {
    /// Type key of a host object type
    pub fn of<T: HostObject>() -> Self {
        TypeKey::Host(TypeId::of::<T>())
    }
}

/// A dynamic value
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmartString),
    Tuple(Arc<[Value]>),
    List(ListRef),
    Dict(DictRef),
    Function(Function),
    Iter(IterRef),
    Object(Arc<dyn HostObject>),
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(SmartString::from(s.as_ref()))
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(ListRef::new(items.into_iter().collect()))
    }

    pub fn object<T: HostObject>(object: T) -> Self {
        Value::Object(Arc::new(object))
    }

    pub fn type_key(&self) -> TypeKey {
        match self {
            Value::None => TypeKey::None,
            Value::Bool(_) => TypeKey::Bool,
            Value::Int(_) => TypeKey::Int,
            Value::Float(_) => TypeKey::Float,
            Value::Str(_) => TypeKey::Str,
            Value::Tuple(_) => TypeKey::Tuple,
            Value::List(_) => TypeKey::List,
            Value::Dict(_) => TypeKey::Dict,
            Value::Function(_) => TypeKey::Function,
            Value::Iter(_) => TypeKey::Iter,
            Value::Object(obj) => TypeKey::Host(obj.as_any().type_id()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Iter(_) => "iterator",
            Value::Object(obj) => obj.type_name(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&DictRef> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Whether the value may be used as a mapping key
    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Dict(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    /// Integral numeric view shared by bool, int and whole floats
    fn integral(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(*b as i64),
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => Some(*f as i64),
            _ => None,
        }
    }

    /// Quoted representation, as used inside containers
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

fn data_ptr<T: ?Sized>(arc: &Arc<T>) -> *const () {
    Arc::as_ptr(arc) as *const ()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (None, None) => true,
            (Str(a), Str(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Float(a), Int(b)) | (Int(b), Float(a)) => *a == *b as f64,
            (Float(a), Bool(b)) | (Bool(b), Float(a)) => *a == *b as i64 as f64,
            (Int(_) | Bool(_), Int(_) | Bool(_)) => self.as_int() == other.as_int(),
            (Tuple(a), Tuple(b)) => a[..] == b[..],
            (List(a), List(b)) => a.ptr_eq(b) || a.snapshot() == b.snapshot(),
            (Dict(a), Dict(b)) => a.ptr_eq(b) || a.content_eq(b),
            (Function(a), Function(b)) => a.ptr_eq(b),
            (Iter(a), Iter(b)) => a.ptr_eq(b),
            (Object(a), Object(b)) => data_ptr(a) == data_ptr(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(i) = self.integral() {
            return i.hash(state);
        }
        match self {
            Value::None => 0u8.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.as_str().hash(state),
            Value::Tuple(items) => {
                items.len().hash(state);
                for item in items.iter() {
                    item.hash(state);
                }
            }
            Value::List(l) => l.as_ptr().hash(state),
            Value::Dict(d) => d.as_ptr().hash(state),
            Value::Function(f) => f.as_ptr().hash(state),
            Value::Iter(it) => it.as_ptr().hash(state),
            Value::Object(obj) => data_ptr(obj).hash(state),
            Value::Bool(_) | Value::Int(_) => self.as_int().hash(state),
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        write!(f, "{:.1}", x)
    } else if x.is_nan() {
        write!(f, "nan")
    } else if x.is_infinite() {
        write!(f, "{}", if x > 0.0 { "inf" } else { "-inf" })
    } else {
        write!(f, "{}", x)
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item.repr())?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write_float(f, *x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::List(l) => {
                write!(f, "[")?;
                write_seq(f, &l.snapshot())?;
                write!(f, "]")
            }
            Value::Dict(d) => {
                write!(f, "{{")?;
                for (i, (k, v)) in d.items().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k.repr(), v.repr())?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Iter(_) => write!(f, "<iterator>"),
            Value::Object(obj) => write!(f, "<{} object>", obj.type_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(SmartString::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(ListRef::new(items))
    }
}
