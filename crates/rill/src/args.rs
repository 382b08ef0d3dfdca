//! Call-argument marshalling.
//!
//! [`Args`] carries the positional arguments of a call plus the bound
//! receiver when the callee is a method. Builtin bodies use the arity
//! helpers (`get_one`, `get_two`, ...) so mismatches surface as uniform
//! ArityError messages.

use smallvec::SmallVec;

use crate::exceptions::{Exception, RunResult};
use crate::value::Value;

/// Inline capacity covering the vast majority of call sites.
type ArgVec = SmallVec<[Value; 4]>;

/// Positional call arguments plus the optional receiver.
#[derive(Debug, Clone, Default)]
pub struct Args {
    this: Option<Value>,
    vals: ArgVec,
}

impl Args {
    pub fn new(vals: impl IntoIterator<Item = Value>) -> Self {
        Self {
            this: None,
            vals: vals.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Attaches the receiver for a method call.
    pub fn with_this(mut self, this: Value) -> Self {
        self.this = Some(this);
        self
    }

    pub fn this(&self) -> Option<&Value> {
        self.this.as_ref()
    }

    /// The receiver, which must be present for builtin method bodies.
    pub fn expect_this(&self, method: &str) -> RunResult<&Value> {
        self.this
            .as_ref()
            .ok_or_else(|| Exception::runtime_error(format!("{method}() called without a receiver")))
    }

    pub fn len(&self) -> usize {
        self.vals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.vals.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.vals
    }

    pub fn into_values(self) -> ArgVec {
        self.vals
    }

    /// Checks that zero arguments were passed.
    pub fn check_zero(&self, name: &str) -> RunResult<()> {
        if self.vals.is_empty() {
            Ok(())
        } else {
            Err(Exception::arity_error(name, 0, self.vals.len()))
        }
    }

    /// Checks that exactly one argument was passed, returning it.
    pub fn get_one(mut self, name: &str) -> RunResult<Value> {
        if self.vals.len() == 1 {
            Ok(self.vals.remove(0))
        } else {
            Err(Exception::arity_error(name, 1, self.vals.len()))
        }
    }

    /// Checks that exactly two arguments were passed, returning them.
    pub fn get_two(mut self, name: &str) -> RunResult<(Value, Value)> {
        if self.vals.len() == 2 {
            let b = self.vals.remove(1);
            let a = self.vals.remove(0);
            Ok((a, b))
        } else {
            Err(Exception::arity_error(name, 2, self.vals.len()))
        }
    }

    /// Checks that one required and one optional argument were passed.
    pub fn get_one_two(mut self, name: &str) -> RunResult<(Value, Option<Value>)> {
        match self.vals.len() {
            1 => Ok((self.vals.remove(0), None)),
            2 => {
                let b = self.vals.remove(1);
                let a = self.vals.remove(0);
                Ok((a, Some(b)))
            }
            n => Err(Exception::arity_error(name, 1, n)),
        }
    }

    /// Checks that at most one argument was passed.
    pub fn get_zero_one(mut self, name: &str) -> RunResult<Option<Value>> {
        match self.vals.len() {
            0 => Ok(None),
            1 => Ok(Some(self.vals.remove(0))),
            n => Err(Exception::arity_error(name, 1, n)),
        }
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::ExcKind;

    #[test]
    fn arity_helpers() {
        assert!(Args::empty().check_zero("f").is_ok());
        let err = Args::new([Value::Int(1)]).check_zero("f").unwrap_err();
        assert_eq!(err.kind, ExcKind::ArityError);

        let v = Args::new([Value::Int(7)]).get_one("f").unwrap();
        assert!(matches!(v, Value::Int(7)));

        let (a, b) = Args::new([Value::Int(1), Value::Int(2)]).get_two("f").unwrap();
        assert!(matches!(a, Value::Int(1)));
        assert!(matches!(b, Value::Int(2)));

        let (a, b) = Args::new([Value::Int(1)]).get_one_two("f").unwrap();
        assert!(matches!(a, Value::Int(1)));
        assert!(b.is_none());
    }
}
