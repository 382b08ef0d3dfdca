//! Operators, indexing, slicing, and capability helpers.
//!
//! Wrapper arithmetic short-circuits on the immediate representation
//! before any dispatch; user classes participate in indexing, slicing,
//! iteration and ordering through their capability methods (`__get`,
//! `__set`, `__slice`, `__length`, `__pieces`, `__get_piece`,
//! `__compare`).

use std::cmp::Ordering;
use std::sync::Arc;

use crate::args::Args;
use crate::ast::{BinOp, ExprNode, Pos, UnaryOp};
use crate::dispatch;
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::value::{MapKey, Value, display_value, repr_value, value_eq};

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Rem => "%",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
    }
}

impl Interp {
    pub(crate) fn eval_binary(
        &self,
        scope: &Scope,
        op: BinOp,
        lhs: &ExprNode,
        rhs: &ExprNode,
    ) -> RunResult<Value> {
        // Logical operators short-circuit; everything else evaluates both
        // operands first.
        if matches!(op, BinOp::And | BinOp::Or) {
            let left = self.eval_expr(scope, lhs)?.as_bool()?;
            return match (op, left) {
                (BinOp::And, false) => Ok(Value::Bool(false)),
                (BinOp::Or, true) => Ok(Value::Bool(true)),
                _ => Ok(Value::Bool(self.eval_expr(scope, rhs)?.as_bool()?)),
            };
        }

        let a = self.eval_expr(scope, lhs)?;
        let b = self.eval_expr(scope, rhs)?;
        match op {
            BinOp::Eq => Ok(Value::Bool(value_eq(&a, &b))),
            BinOp::Ne => Ok(Value::Bool(!value_eq(&a, &b))),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let ord = self.compare_values(scope, &a, &b, &lhs.pos)?;
                Ok(Value::Bool(match op {
                    BinOp::Lt => ord == Ordering::Less,
                    BinOp::Le => ord != Ordering::Greater,
                    BinOp::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                }))
            }
            _ => arith(op, a, b),
        }
    }

    pub(crate) fn eval_unary(&self, scope: &Scope, op: UnaryOp, operand: &ExprNode) -> RunResult<Value> {
        let v = self.eval_expr(scope, operand)?;
        match op {
            UnaryOp::Neg => match v {
                Value::Int(i) => i
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| Exception::runtime_error("integer overflow")),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(Exception::type_error(format!(
                    "cannot negate {}",
                    other.type_name()
                ))),
            },
            UnaryOp::Not => Ok(Value::Bool(!v.as_bool()?)),
        }
    }

    /// Ordering for `<`/`<=`/`>`/`>=`: numeric values compare directly,
    /// instances through `__compare` returning a signed Int.
    fn compare_values(&self, scope: &Scope, a: &Value, b: &Value, pos: &Pos) -> RunResult<Ordering> {
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let (x, y) = (a.as_float()?, b.as_float()?);
                x.partial_cmp(&y)
                    .ok_or_else(|| Exception::value_error("cannot order NaN"))
            }
            (Value::Instance(inst), _) if inst.class.has_method("__compare") => {
                let result =
                    self.call_method(a, "__compare", Args::new([b.clone()]), scope, pos)?;
                Ok(result.as_int()?.cmp(&0))
            }
            _ => Err(Exception::type_error(format!(
                "cannot order {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    // ---- indexing and slicing -------------------------------------------

    /// `x[k]`: element access for the builtin containers, `__get`
    /// dispatch for instances.
    pub(crate) fn index_get(&self, scope: &Scope, recv: &Value, key: Value, pos: &Pos) -> RunResult<Value> {
        match recv {
            Value::Array(items) | Value::List(items) => {
                let items = items.read();
                let idx = check_index(key.as_int()?, items.len())?;
                Ok(items[idx].clone())
            }
            Value::Deque(items) => {
                let items = items.read();
                let idx = check_index(key.as_int()?, items.len())?;
                Ok(items[idx].clone())
            }
            Value::Map(entries) => {
                let map_key = MapKey::from_value(&key)?;
                entries
                    .read()
                    .get(&map_key)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| {
                        Exception::index_error(format!("key not found: {}", repr_value(&key)))
                    })
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let idx = check_index(key.as_int()?, chars.len())?;
                Ok(Value::str(chars[idx].to_string()))
            }
            Value::Bytes(b) => {
                let idx = check_index(key.as_int()?, b.len())?;
                Ok(Value::Int(i64::from(b[idx])))
            }
            Value::Range(r) => {
                let idx = check_index(key.as_int()?, r.len())?;
                Ok(Value::Int(r.get(idx).expect("index checked")))
            }
            Value::Pair(p) => match key.as_int()? {
                0 => Ok(p.0.clone()),
                1 => Ok(p.1.clone()),
                i => Err(Exception::index_error(format!(
                    "pair index {i} out of range"
                ))),
            },
            Value::Instance(_) => self.call_method(recv, "__get", Args::new([key]), scope, pos),
            other => Err(Exception::type_error(format!(
                "{} is not indexable",
                other.type_name()
            ))),
        }
    }

    /// `x[k] = v`: element update for the builtin containers, `__set`
    /// dispatch for instances.
    pub(crate) fn index_set(
        &self,
        scope: &Scope,
        recv: &Value,
        key: Value,
        value: Value,
        pos: &Pos,
    ) -> RunResult<()> {
        match recv {
            Value::Array(items) | Value::List(items) => {
                let mut items = items.write();
                let idx = check_index(key.as_int()?, items.len())?;
                items[idx] = value;
                Ok(())
            }
            Value::Deque(items) => {
                let mut items = items.write();
                let idx = check_index(key.as_int()?, items.len())?;
                items[idx] = value;
                Ok(())
            }
            Value::Map(entries) => {
                let map_key = MapKey::from_value(&key)?;
                entries.write().insert(map_key, (key, value));
                Ok(())
            }
            Value::Instance(_) => {
                self.call_method(recv, "__set", Args::new([key, value]), scope, pos)?;
                Ok(())
            }
            other => Err(Exception::type_error(format!(
                "{} does not support index assignment",
                other.type_name()
            ))),
        }
    }

    /// `x[a..b]`: sub-sequence for strings, arrays, lists and bytes,
    /// `__slice` dispatch for instances. Bounds clamp; `a > b` yields an
    /// empty result.
    pub(crate) fn slice_get(
        &self,
        scope: &Scope,
        recv: &Value,
        start: Value,
        end: Value,
        pos: &Pos,
    ) -> RunResult<Value> {
        if let Value::Instance(_) = recv {
            return self.call_method(recv, "__slice", Args::new([start, end]), scope, pos);
        }
        let start = start.as_int()?;
        let end = end.as_int()?;
        match recv {
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let (a, b) = clamp_slice(start, end, chars.len());
                Ok(Value::str(chars[a..b].iter().collect::<String>()))
            }
            Value::Array(items) => {
                let items = items.read();
                let (a, b) = clamp_slice(start, end, items.len());
                Ok(Value::array(items[a..b].to_vec()))
            }
            Value::List(items) => {
                let items = items.read();
                let (a, b) = clamp_slice(start, end, items.len());
                Ok(Value::list(items[a..b].to_vec()))
            }
            Value::Bytes(bytes) => {
                let (a, b) = clamp_slice(start, end, bytes.len());
                Ok(Value::Bytes(Arc::new(bytes[a..b].to_vec())))
            }
            other => Err(Exception::type_error(format!(
                "{} is not sliceable",
                other.type_name()
            ))),
        }
    }

    // ---- iteration capabilities -----------------------------------------

    /// Iterable length: intrinsic for the builtin containers, `__length`
    /// dispatch for instances. `None` means the value is not
    /// length-iterable.
    pub(crate) fn length_of(&self, scope: &Scope, v: &Value, pos: &Pos) -> RunResult<Option<usize>> {
        match v {
            Value::Array(items) | Value::List(items) => Ok(Some(items.read().len())),
            Value::Deque(items) => Ok(Some(items.read().len())),
            Value::Map(entries) => Ok(Some(entries.read().len())),
            Value::Set(entries) => Ok(Some(entries.read().len())),
            Value::Str(s) => Ok(Some(s.chars().count())),
            Value::Bytes(b) => Ok(Some(b.len())),
            Value::Range(r) => Ok(Some(r.len())),
            Value::Instance(inst) if inst.class.has_method("__length") => {
                let len = self
                    .call_method(v, "__length", Args::empty(), scope, pos)?
                    .as_int()?;
                Ok(Some(len.max(0) as usize))
            }
            _ => Ok(None),
        }
    }

    /// The i-th iteration element. Maps yield their entries as Pairs.
    pub(crate) fn get_at(&self, scope: &Scope, v: &Value, index: usize, pos: &Pos) -> RunResult<Value> {
        match v {
            Value::Map(entries) => entries
                .read()
                .get_index(index)
                .map(|(_, (k, val))| Value::pair(k.clone(), val.clone()))
                .ok_or_else(|| Exception::index_error(format!("index {index} out of range"))),
            Value::Set(entries) => entries
                .read()
                .get_index(index)
                .map(|(_, elem)| elem.clone())
                .ok_or_else(|| Exception::index_error(format!("index {index} out of range"))),
            Value::Instance(_) => {
                self.call_method(v, "__get", Args::new([Value::Int(index as i64)]), scope, pos)
            }
            other => self.index_get(scope, other, Value::Int(index as i64), pos),
        }
    }

    /// Decomposition piece count, for destructuring and multi-variable
    /// for-in. `None` means the value does not decompose.
    pub(crate) fn pieces_of(&self, scope: &Scope, v: &Value, pos: &Pos) -> RunResult<Option<usize>> {
        match v {
            Value::Pair(_) => Ok(Some(2)),
            Value::Array(items) | Value::List(items) => Ok(Some(items.read().len())),
            Value::Record(rec) => Ok(Some(rec.values.len())),
            Value::Instance(inst) if inst.class.has_method("__pieces") => {
                let n = self
                    .call_method(v, "__pieces", Args::empty(), scope, pos)?
                    .as_int()?;
                Ok(Some(n.max(0) as usize))
            }
            _ => Ok(None),
        }
    }

    /// The i-th decomposition piece.
    pub(crate) fn get_piece(&self, scope: &Scope, v: &Value, index: usize, pos: &Pos) -> RunResult<Value> {
        match v {
            Value::Pair(p) => match index {
                0 => Ok(p.0.clone()),
                1 => Ok(p.1.clone()),
                _ => Err(Exception::index_error(format!("pair piece {index} out of range"))),
            },
            Value::Array(items) | Value::List(items) => {
                let items = items.read();
                items.get(index).cloned().ok_or_else(|| {
                    Exception::index_error(format!("piece {index} out of range"))
                })
            }
            Value::Record(rec) => rec
                .values
                .get_index(index)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Exception::index_error(format!("piece {index} out of range"))),
            Value::Instance(_) => self.call_method(
                v,
                "__get_piece",
                Args::new([Value::Int(index as i64)]),
                scope,
                pos,
            ),
            other => Err(Exception::type_error(format!(
                "{} does not decompose into pieces",
                other.type_name()
            ))),
        }
    }

    // ---- declared-type validation ---------------------------------------

    /// Validates a value against a declared type. `nil` satisfies any
    /// declared type; generic parameters accept anything at this level.
    pub(crate) fn check_value_type(
        &self,
        value: &Value,
        ty: &crate::types::TypeDesc,
        package: &str,
    ) -> RunResult<()> {
        if value.is_nil() || ty.is_generic_param {
            return Ok(());
        }
        let fail = || {
            Err(Exception::type_error(format!(
                "expected {}, got {}",
                ty.name,
                value.type_name()
            )))
        };
        if ty.is_enum {
            return match value {
                Value::EnumValue(ev) if *ev.enum_name == *ty.name => Ok(()),
                _ => fail(),
            };
        }
        if ty.is_record {
            return match value {
                Value::Record(rec) if rec.def.name() == ty.name => Ok(()),
                _ => fail(),
            };
        }
        if ty.is_interface {
            let Some(iface) = self.registry().lookup_interface(package, &ty.name) else {
                return fail();
            };
            return match dispatch::class_of(value, self.registry()) {
                Some(class) if class.implements_interface(&iface) => Ok(()),
                _ => fail(),
            };
        }
        let Some(canonical) = self.registry().canonical_class_name(package, &ty.name) else {
            // Unregistered names in annotations are not enforced.
            return Ok(());
        };
        let Some(class) = dispatch::class_of(value, self.registry()) else {
            return fail();
        };
        if class.name() == canonical {
            return Ok(());
        }
        match self.registry().lookup_class(package, &canonical) {
            Some(target) if class.is_subclass_of(&target) => Ok(()),
            _ => fail(),
        }
    }
}

/// Numeric arithmetic plus string concatenation for `+`.
fn arith(op: BinOp, a: Value, b: Value) -> RunResult<Value> {
    if op == BinOp::Add && (matches!(a, Value::Str(_)) || matches!(b, Value::Str(_))) {
        return Ok(Value::str(format!("{}{}", display_value(&a), display_value(&b))));
    }
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => {
            let (x, y) = (*x, *y);
            let result = match op {
                BinOp::Add => x.checked_add(y),
                BinOp::Sub => x.checked_sub(y),
                BinOp::Mul => x.checked_mul(y),
                BinOp::Div => {
                    if y == 0 {
                        return Err(Exception::runtime_error("division by zero"));
                    }
                    x.checked_div(y)
                }
                BinOp::Rem => {
                    if y == 0 {
                        return Err(Exception::runtime_error("division by zero"));
                    }
                    x.checked_rem(y)
                }
                _ => unreachable!("non-arithmetic op reached arith"),
            };
            result
                .map(Value::Int)
                .ok_or_else(|| Exception::runtime_error("integer overflow"))
        }
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (x, y) = (a.as_float()?, b.as_float()?);
            let result = match op {
                BinOp::Add => x + y,
                BinOp::Sub => x - y,
                BinOp::Mul => x * y,
                BinOp::Div => x / y,
                BinOp::Rem => x % y,
                _ => unreachable!("non-arithmetic op reached arith"),
            };
            Ok(Value::Float(result))
        }
        _ => Err(Exception::type_error(format!(
            "unsupported operand types for {}: {} and {}",
            op_symbol(op),
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Bounds-checks a zero-based index.
fn check_index(index: i64, len: usize) -> RunResult<usize> {
    if index < 0 || index as usize >= len {
        Err(Exception::index_error(format!(
            "index {index} out of range for length {len}"
        )))
    } else {
        Ok(index as usize)
    }
}

/// Clamps slice bounds; `start > end` yields an empty slice.
fn clamp_slice(start: i64, end: i64, len: usize) -> (usize, usize) {
    let a = start.max(0) as usize;
    let b = (end.max(0) as usize).min(len);
    (a.min(b).min(len), b)
}
