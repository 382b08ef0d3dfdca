//! Structural type descriptors and generic parameters.
//!
//! A [`TypeDesc`] names a type as it appears in declarations (parameter,
//! field and return types) and carries the flags runtime checks consult.
//! Descriptors are resolved by name against the registry; a name may be an
//! alias for another type (`Integer` for `Int`, `array` for `Array`).

use ahash::AHashMap;

/// Member access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessLevel {
    #[default]
    Public,
    Protected,
    Private,
}

/// Modifier set for fields and methods: access level plus the
/// `static`/`final` flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub access: AccessLevel,
    pub is_static: bool,
    pub is_final: bool,
}

impl Modifiers {
    pub fn private() -> Self {
        Self {
            access: AccessLevel::Private,
            ..Self::default()
        }
    }

    pub fn protected() -> Self {
        Self {
            access: AccessLevel::Protected,
            ..Self::default()
        }
    }

    pub fn statics() -> Self {
        Self {
            is_static: true,
            ..Self::default()
        }
    }

    pub fn finals() -> Self {
        Self {
            is_final: true,
            ..Self::default()
        }
    }
}

/// A structural type descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeDesc {
    pub name: String,
    pub is_builtin: bool,
    pub is_class: bool,
    pub is_interface: bool,
    pub is_enum: bool,
    pub is_record: bool,
    pub is_generic_param: bool,
    /// Concrete type arguments, for instantiated generic types.
    pub type_args: Vec<TypeDesc>,
    /// Alternative names bound to the same type.
    pub aliases: Vec<String>,
}

impl TypeDesc {
    /// A descriptor naming a (user) class.
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_class: true,
            ..Self::default()
        }
    }

    /// A descriptor naming a builtin class.
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_builtin: true,
            is_class: true,
            ..Self::default()
        }
    }

    /// A descriptor naming an interface.
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_interface: true,
            ..Self::default()
        }
    }

    /// A descriptor naming an enum.
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_enum: true,
            ..Self::default()
        }
    }

    /// A descriptor naming a record.
    pub fn record(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_record: true,
            ..Self::default()
        }
    }

    /// A descriptor for a generic parameter occurrence (`T`, `K`, ...).
    pub fn generic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_generic_param: true,
            ..Self::default()
        }
    }

    pub fn with_args(mut self, args: Vec<TypeDesc>) -> Self {
        self.type_args = args;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Substitutes generic-parameter occurrences using the call site's
    /// type-argument bindings. Unbound parameters are left untouched.
    pub fn substitute(&self, bindings: &AHashMap<String, TypeDesc>) -> TypeDesc {
        if self.is_generic_param {
            if let Some(bound) = bindings.get(&self.name) {
                return bound.clone();
            }
            return self.clone();
        }
        let mut out = self.clone();
        out.type_args = self.type_args.iter().map(|t| t.substitute(bindings)).collect();
        out
    }
}

/// A generic type parameter: a name, an optional bound, and the direction
/// of the bound (`extends` when `upper`, `super` otherwise).
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    pub name: String,
    pub bound: Option<TypeDesc>,
    pub upper: bool,
}

impl GenericParam {
    /// An unbounded parameter.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: None,
            upper: true,
        }
    }

    /// A parameter with an `extends` bound.
    pub fn extending(name: impl Into<String>, bound: TypeDesc) -> Self {
        Self {
            name: name.into(),
            bound: Some(bound),
            upper: true,
        }
    }
}

/// Predefined unbounded key parameter used by the builtin collections.
pub fn k_bound() -> GenericParam {
    GenericParam::unbounded("K")
}

/// Predefined unbounded value parameter used by the builtin collections.
pub fn v_bound() -> GenericParam {
    GenericParam::unbounded("V")
}

/// Predefined unbounded element parameter used by the builtin collections.
pub fn t_bound() -> GenericParam {
    GenericParam::unbounded("T")
}

/// Builds the call-site substitution map from a definition's parameter list
/// and the concrete argument list bound at instantiation.
pub fn bind_type_args(params: &[GenericParam], args: &[TypeDesc]) -> AHashMap<String, TypeDesc> {
    params
        .iter()
        .zip(args.iter())
        .map(|(p, a)| (p.name.clone(), a.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_replaces_bound_parameters() {
        let mut bindings = AHashMap::new();
        bindings.insert("T".to_owned(), TypeDesc::builtin("Int"));

        let param = TypeDesc::generic("T");
        assert_eq!(param.substitute(&bindings).name, "Int");

        let nested = TypeDesc::builtin("Array").with_args(vec![TypeDesc::generic("T")]);
        let out = nested.substitute(&bindings);
        assert_eq!(out.type_args[0].name, "Int");
    }

    #[test]
    fn substitute_leaves_unbound_parameters() {
        let bindings = AHashMap::new();
        let param = TypeDesc::generic("U");
        assert_eq!(param.substitute(&bindings).name, "U");
        assert!(param.substitute(&bindings).is_generic_param);
    }
}
