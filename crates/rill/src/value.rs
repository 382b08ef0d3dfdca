//! Runtime value representation.
//!
//! [`Value`] is the tagged union every expression evaluates to. Small
//! primitives are stored inline; containers and objects hold shared,
//! internally locked interiors so closures and spawned tasks can alias
//! them. Wrapper-class dispatch (`3.abs()`) resolves the class for an
//! immediate value through the registry, so the boxed-primitive surface of
//! the language is preserved without allocating a box per value.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::args::Args;
use crate::ast::{ParamSpec, StmtNode};
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::{ClassDef, EnumDef, InterfaceDef, Modifiers, RecordDef, TypeDesc};
use crate::concurrent::{Channel, CompletableFuture, Promise};

/// Shared, internally locked container interior.
pub type Shared<T> = Arc<RwLock<T>>;

/// Signature of builtin (host-implemented) function and method bodies.
///
/// The scope is the caller's scope, used for position stamping; the
/// receiver, when any, travels in [`Args`].
pub type BuiltinFn = Arc<dyn Fn(&Interp, &Scope, Args) -> RunResult<Value> + Send + Sync>;

/// A function body: user statements or a host function.
#[derive(Clone)]
pub enum FuncBody {
    Ast(Arc<Vec<StmtNode>>),
    Builtin(BuiltinFn),
}

impl fmt::Debug for FuncBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ast(stmts) => write!(f, "Ast({} stmts)", stmts.len()),
            Self::Builtin(_) => write!(f, "Builtin"),
        }
    }
}

/// A function value: declared functions, lambdas, methods, constructors
/// and builtin bodies all share this shape.
#[derive(Debug, Clone)]
pub struct FuncValue {
    pub name: Arc<str>,
    pub params: Vec<ParamSpec>,
    pub return_type: Option<TypeDesc>,
    pub body: FuncBody,
    /// Captured lexical environment, for closures and user methods.
    pub captured: Option<Scope>,
    /// Receiver bound when the function was produced by member access.
    pub bound_this: Option<Value>,
    /// Class that declared this method, for access checks and `super`.
    pub declaring_class: Option<Arc<ClassDef>>,
    pub modifiers: Modifiers,
}

impl FuncValue {
    pub fn new_ast(
        name: impl Into<Arc<str>>,
        params: Vec<ParamSpec>,
        body: Arc<Vec<StmtNode>>,
        captured: Option<Scope>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type: None,
            body: FuncBody::Ast(body),
            captured,
            bound_this: None,
            declaring_class: None,
            modifiers: Modifiers::default(),
        }
    }

    pub fn new_builtin(name: impl Into<Arc<str>>, params: Vec<ParamSpec>, f: BuiltinFn) -> Self {
        Self {
            name: name.into(),
            params,
            return_type: None,
            body: FuncBody::Builtin(f),
            captured: None,
            bound_this: None,
            declaring_class: None,
            modifiers: Modifiers::default(),
        }
    }

    /// Copy of this function with the receiver bound.
    pub fn bind(&self, this: Value) -> Self {
        let mut out = self.clone();
        out.bound_this = Some(this);
        out
    }

    /// True when the final parameter absorbs excess arguments.
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.variadic)
    }
}

/// A class instance: fields in declaration order plus the generic type
/// arguments bound at instantiation. Methods are not copied onto the
/// instance; dispatch searches the class chain at call time.
pub struct Instance {
    pub class: Arc<ClassDef>,
    pub fields: RwLock<IndexMap<String, Value>>,
    pub type_args: Option<Vec<TypeDesc>>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.class.name())
    }
}

/// An immutable record instance.
pub struct RecordInstance {
    pub def: Arc<RecordDef>,
    pub values: IndexMap<String, Value>,
}

impl fmt::Debug for RecordInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordInstance({})", self.def.name())
    }
}

/// A symbolic enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub enum_name: Arc<str>,
    pub variant: Arc<str>,
}

/// A lazy integer range: `start..end step step`. Never materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn new(start: i64, end: i64, step: i64) -> RunResult<Self> {
        if step == 0 {
            return Err(Exception::value_error("range step cannot be zero"));
        }
        Ok(Self { start, end, step })
    }

    /// Number of elements the range yields.
    pub fn len(&self) -> usize {
        if self.step > 0 {
            if self.end <= self.start {
                0
            } else {
                ((self.end - self.start - 1) / self.step + 1) as usize
            }
        } else if self.start <= self.end {
            0
        } else {
            ((self.start - self.end - 1) / (-self.step) + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        (index < self.len()).then(|| self.start + self.step * index as i64)
    }

    pub fn contains(&self, v: i64) -> bool {
        if self.step > 0 {
            v >= self.start && v < self.end && (v - self.start) % self.step == 0
        } else {
            v <= self.start && v > self.end && (self.start - v) % (-self.step) == 0
        }
    }
}

/// Hashable projection of a value, used as Map/Set key. Keeps the original
/// value alongside in the container so iteration sees what was inserted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Nil,
    Bool(bool),
    Int(i64),
    /// Float keyed by raw bits.
    FloatBits(u64),
    Str(Arc<str>),
    Bytes(Arc<Vec<u8>>),
    Enum(Arc<str>, Arc<str>),
}

impl MapKey {
    /// Projects a value to its key form; non-hashable values raise
    /// TypeError.
    pub fn from_value(v: &Value) -> RunResult<Self> {
        match v {
            Value::Nil => Ok(Self::Nil),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Int(i) => Ok(Self::Int(*i)),
            Value::Float(f) => Ok(Self::FloatBits(f.to_bits())),
            Value::Str(s) => Ok(Self::Str(s.clone())),
            Value::Bytes(b) => Ok(Self::Bytes(b.clone())),
            Value::EnumValue(e) => Ok(Self::Enum(e.enum_name.clone(), e.variant.clone())),
            other => Err(Exception::type_error(format!(
                "{} is not usable as a Map or Set key",
                other.builtin_class_name()
            ))),
        }
    }
}

/// Map storage: insertion-ordered, keyed by the hashable projection,
/// holding the original key and the value.
pub type MapStorage = IndexMap<MapKey, (Value, Value)>;

/// Set storage: insertion-ordered, keyed by the hashable projection,
/// holding the original element.
pub type SetStorage = IndexMap<MapKey, Value>;

/// Primary runtime value type.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Bytes(Arc<Vec<u8>>),
    Array(Shared<Vec<Value>>),
    List(Shared<Vec<Value>>),
    Deque(Shared<VecDeque<Value>>),
    Map(Shared<MapStorage>),
    Set(Shared<SetStorage>),
    Range(RangeValue),
    Pair(Arc<(Value, Value)>),
    Func(Arc<FuncValue>),
    Instance(Arc<Instance>),
    Record(Arc<RecordInstance>),
    /// A class definition, addressable for static-member access.
    Class(Arc<ClassDef>),
    Interface(Arc<InterfaceDef>),
    Enum(Arc<EnumDef>),
    RecordDef(Arc<RecordDef>),
    /// A callable class constructor.
    Constructor(Arc<ClassDef>),
    EnumValue(EnumValue),
    Channel(Arc<Channel>),
    Promise(Arc<Promise>),
    Future(Arc<CompletableFuture>),
}

impl Value {
    /// Wraps a Rust string.
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Self::Str(s.into())
    }

    /// Builds a fresh Array value.
    pub fn array(items: Vec<Value>) -> Self {
        Self::Array(Arc::new(RwLock::new(items)))
    }

    /// Builds a fresh List value.
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Arc::new(RwLock::new(items)))
    }

    pub fn pair(first: Value, second: Value) -> Self {
        Self::Pair(Arc::new((first, second)))
    }

    /// Wraps a builtin function as a callable value.
    pub fn builtin_fn(name: &str, params: Vec<ParamSpec>, f: BuiltinFn) -> Self {
        Self::Func(Arc::new(FuncValue::new_builtin(name, params, f)))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// The builtin class name backing this value's wrapper-class dispatch.
    pub fn builtin_class_name(&self) -> &'static str {
        match self {
            Self::Nil => "Nil",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Str(_) => "String",
            Self::Bytes(_) => "Bytes",
            Self::Array(_) => "Array",
            Self::List(_) => "List",
            Self::Deque(_) => "Deque",
            Self::Map(_) => "Map",
            Self::Set(_) => "Set",
            Self::Range(_) => "Range",
            Self::Pair(_) => "Pair",
            Self::Func(_) => "Function",
            Self::Instance(_) => "Instance",
            Self::Record(_) => "Record",
            Self::Class(_) | Self::Constructor(_) => "Class",
            Self::Interface(_) => "Interface",
            Self::Enum(_) => "Enum",
            Self::RecordDef(_) => "RecordDef",
            Self::EnumValue(_) => "EnumValue",
            Self::Channel(_) => "Channel",
            Self::Promise(_) => "Promise",
            Self::Future(_) => "CompletableFuture",
        }
    }

    /// Human-facing type name, class-aware for instances and records.
    pub fn type_name(&self) -> String {
        match self {
            Self::Instance(i) => i.class.name().to_owned(),
            Self::Record(r) => r.def.name().to_owned(),
            Self::EnumValue(e) => e.enum_name.to_string(),
            other => other.builtin_class_name().to_owned(),
        }
    }

    pub fn as_bool(&self) -> RunResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(Exception::type_error(format!(
                "expected Bool, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_int(&self) -> RunResult<i64> {
        match self {
            Self::Int(i) => Ok(*i),
            other => Err(Exception::type_error(format!(
                "expected Int, got {}",
                other.type_name()
            ))),
        }
    }

    /// Numeric coercion used by float-accepting builtins.
    pub fn as_float(&self) -> RunResult<f64> {
        match self {
            Self::Float(f) => Ok(*f),
            Self::Int(i) => Ok(*i as f64),
            other => Err(Exception::type_error(format!(
                "expected Float, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_str(&self) -> RunResult<Arc<str>> {
        match self {
            Self::Str(s) => Ok(s.clone()),
            other => Err(Exception::type_error(format!(
                "expected String, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_func(&self) -> RunResult<Arc<FuncValue>> {
        match self {
            Self::Func(f) => Ok(f.clone()),
            other => Err(Exception::type_error(format!(
                "expected Function, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_channel(&self) -> RunResult<Arc<Channel>> {
        match self {
            Self::Channel(c) => Ok(c.clone()),
            other => Err(Exception::type_error(format!(
                "expected Channel, got {}",
                other.type_name()
            ))),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", repr_value(self))
    }
}

/// Structural equality: primitive values compare by content (Int and Float
/// cross-compare numerically), containers compare elementwise, objects
/// compare by identity.
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => (*x as f64) == *y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::Array(x), Value::Array(y)) | (Value::List(x), Value::List(y)) => {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.read(), y.read());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| value_eq(a, b))
        }
        (Value::Deque(x), Value::Deque(y)) => {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.read(), y.read());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| value_eq(a, b))
        }
        (Value::Map(x), Value::Map(y)) => {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.read(), y.read());
            x.len() == y.len()
                && x.iter()
                    .all(|(k, (_, v))| y.get(k).is_some_and(|(_, w)| value_eq(v, w)))
        }
        (Value::Set(x), Value::Set(y)) => {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.read(), y.read());
            x.len() == y.len() && x.keys().all(|k| y.contains_key(k))
        }
        (Value::Range(x), Value::Range(y)) => x == y,
        (Value::Pair(x), Value::Pair(y)) => {
            Arc::ptr_eq(x, y) || (value_eq(&x.0, &y.0) && value_eq(&x.1, &y.1))
        }
        (Value::EnumValue(x), Value::EnumValue(y)) => x == y,
        (Value::Instance(x), Value::Instance(y)) => Arc::ptr_eq(x, y),
        (Value::Record(x), Value::Record(y)) => {
            Arc::ptr_eq(x, y)
                || (Arc::ptr_eq(&x.def, &y.def)
                    && x.values.len() == y.values.len()
                    && x.values
                        .iter()
                        .all(|(k, v)| y.values.get(k).is_some_and(|w| value_eq(v, w))))
        }
        (Value::Func(x), Value::Func(y)) => Arc::ptr_eq(x, y),
        (Value::Class(x), Value::Class(y)) | (Value::Constructor(x), Value::Constructor(y)) => {
            Arc::ptr_eq(x, y)
        }
        (Value::Enum(x), Value::Enum(y)) => Arc::ptr_eq(x, y),
        (Value::RecordDef(x), Value::RecordDef(y)) => Arc::ptr_eq(x, y),
        (Value::Interface(x), Value::Interface(y)) => Arc::ptr_eq(x, y),
        (Value::Channel(x), Value::Channel(y)) => Arc::ptr_eq(x, y),
        (Value::Promise(x), Value::Promise(y)) => Arc::ptr_eq(x, y),
        (Value::Future(x), Value::Future(y)) => Arc::ptr_eq(x, y),
        _ => false,
    }
}

/// Depth cap for rendering nested or cyclic containers.
const MAX_DISPLAY_DEPTH: usize = 8;

/// Bare rendering, as `println` shows it: strings unquoted at top level.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::Str(s) => s.to_string(),
        other => repr_value_depth(other, 0),
    }
}

/// Quoted rendering, as containers show their elements.
pub fn repr_value(v: &Value) -> String {
    repr_value_depth(v, 0)
}

fn repr_value_depth(v: &Value, depth: usize) -> String {
    if depth > MAX_DISPLAY_DEPTH {
        return "...".to_owned();
    }
    match v {
        Value::Nil => "nil".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 {
                format!("{f:.1}")
            } else {
                f.to_string()
            }
        }
        Value::Str(s) => format!("\"{s}\""),
        Value::Bytes(b) => format!("Bytes({} bytes)", b.len()),
        Value::Array(items) => render_seq("[", "]", items.read().iter(), depth),
        Value::List(items) => render_seq("List[", "]", items.read().iter(), depth),
        Value::Deque(items) => render_seq("Deque[", "]", items.read().iter(), depth),
        Value::Map(entries) => {
            let entries = entries.read();
            let body: Vec<String> = entries
                .values()
                .map(|(k, val)| {
                    format!(
                        "{}: {}",
                        repr_value_depth(k, depth + 1),
                        repr_value_depth(val, depth + 1)
                    )
                })
                .collect();
            format!("{{{}}}", body.join(", "))
        }
        Value::Set(entries) => render_seq("Set{", "}", entries.read().values(), depth),
        Value::Range(r) => {
            if r.step == 1 {
                format!("{}..{}", r.start, r.end)
            } else {
                format!("{}..{} step {}", r.start, r.end, r.step)
            }
        }
        Value::Pair(p) => format!(
            "({}, {})",
            repr_value_depth(&p.0, depth + 1),
            repr_value_depth(&p.1, depth + 1)
        ),
        Value::Func(f) => format!("<function {}>", f.name),
        Value::Instance(i) => format!("<{} instance>", i.class.name()),
        Value::Record(r) => {
            let body: Vec<String> = r
                .values
                .iter()
                .map(|(k, val)| format!("{k}={}", repr_value_depth(val, depth + 1)))
                .collect();
            format!("{}({})", r.def.name(), body.join(", "))
        }
        Value::Class(c) | Value::Constructor(c) => format!("<class {}>", c.name()),
        Value::Interface(i) => format!("<interface {}>", i.name()),
        Value::Enum(e) => format!("<enum {}>", e.name()),
        Value::RecordDef(r) => format!("<record {}>", r.name()),
        Value::EnumValue(e) => format!("{}.{}", e.enum_name, e.variant),
        Value::Channel(_) => "<channel>".to_owned(),
        Value::Promise(p) => format!("<promise {}>", p.state_name()),
        Value::Future(_) => "<future>".to_owned(),
    }
}

fn render_seq<'a>(
    open: &str,
    close: &str,
    items: impl Iterator<Item = &'a Value>,
    depth: usize,
) -> String {
    let body: Vec<String> = items.map(|v| repr_value_depth(v, depth + 1)).collect();
    format!("{open}{}{close}", body.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_equality_is_structural() {
        assert!(value_eq(&Value::Int(3), &Value::Int(3)));
        assert!(value_eq(&Value::Int(3), &Value::Float(3.0)));
        assert!(!value_eq(&Value::Int(3), &Value::Int(4)));
        assert!(value_eq(&Value::str("a"), &Value::str("a")));
        assert!(!value_eq(&Value::str("a"), &Value::Int(3)));
        assert!(value_eq(&Value::Nil, &Value::Nil));
    }

    #[test]
    fn container_equality_is_elementwise() {
        let a = Value::array(vec![Value::Int(1), Value::str("x")]);
        let b = Value::array(vec![Value::Int(1), Value::str("x")]);
        let c = Value::array(vec![Value::Int(1)]);
        assert!(value_eq(&a, &b));
        assert!(!value_eq(&a, &c));
        // Array and List are distinct kinds even with equal elements.
        let l = Value::list(vec![Value::Int(1), Value::str("x")]);
        assert!(!value_eq(&a, &l));
    }

    #[test]
    fn range_len_and_get() {
        let r = RangeValue::new(0, 10, 3).unwrap();
        assert_eq!(r.len(), 4);
        assert_eq!(r.get(3), Some(9));
        assert_eq!(r.get(4), None);
        assert!(r.contains(6));
        assert!(!r.contains(7));

        let down = RangeValue::new(5, 0, -2).unwrap();
        assert_eq!(down.len(), 3);
        assert_eq!(down.get(2), Some(1));

        assert!(RangeValue::new(0, 1, 0).is_err());
    }

    #[test]
    fn display_forms() {
        assert_eq!(display_value(&Value::str("hi")), "hi");
        assert_eq!(repr_value(&Value::str("hi")), "\"hi\"");
        assert_eq!(repr_value(&Value::Float(2.0)), "2.0");
        assert_eq!(repr_value(&Value::Float(2.5)), "2.5");
        let arr = Value::array(vec![Value::Int(1), Value::str("a")]);
        assert_eq!(repr_value(&arr), "[1, \"a\"]");
    }

    #[test]
    fn map_key_rejects_containers() {
        assert!(MapKey::from_value(&Value::Int(1)).is_ok());
        assert!(MapKey::from_value(&Value::array(vec![])).is_err());
    }
}
