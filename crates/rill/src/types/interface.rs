//! Interface definitions.
//!
//! An interface declares method signatures, optionally with default bodies
//! that classes inherit when they do not override. Sealed interfaces carry
//! a permits list restricting which classes may claim them.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::ast::{DeclKind, ParamSpec};
use crate::exceptions::RunResult;
use crate::registry::Registry;
use crate::scope::Scope;
use crate::types::{GenericParam, TypeDesc};
use crate::value::{BuiltinFn, FuncValue, Value};

/// One method signature of an interface, abstract or defaulted.
#[derive(Debug, Clone)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub return_type: Option<TypeDesc>,
    pub default_body: Option<Arc<FuncValue>>,
}

impl MethodSig {
    pub fn is_abstract(&self) -> bool {
        self.default_body.is_none()
    }
}

#[derive(Debug, Default)]
struct InterfaceBody {
    methods: IndexMap<String, Vec<MethodSig>>,
    permits: Vec<String>,
    static_fields: AHashMap<String, Value>,
    type_params: Vec<GenericParam>,
}

/// An interface definition.
pub struct InterfaceDef {
    name: Arc<str>,
    package: Arc<str>,
    is_sealed: bool,
    body: RwLock<InterfaceBody>,
}

impl fmt::Debug for InterfaceDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterfaceDef({})", self.name)
    }
}

impl InterfaceDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn is_sealed(&self) -> bool {
        self.is_sealed
    }

    /// Whether a sealed interface permits `class_name` to claim it.
    pub fn permits(&self, class_name: &str) -> bool {
        self.body.read().permits.iter().any(|p| p == class_name)
    }

    pub fn type_params(&self) -> Vec<GenericParam> {
        self.body.read().type_params.clone()
    }

    /// The first default body registered under `name`, when any.
    pub fn default_body(&self, name: &str) -> Option<Arc<FuncValue>> {
        self.body
            .read()
            .methods
            .get(name)?
            .iter()
            .find_map(|sig| sig.default_body.clone())
    }

    /// Names of methods a claiming class must provide itself.
    pub fn required_methods(&self) -> Vec<String> {
        self.body
            .read()
            .methods
            .iter()
            .filter(|(_, sigs)| sigs.iter().all(MethodSig::is_abstract))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn method_names(&self) -> Vec<String> {
        self.body.read().methods.keys().cloned().collect()
    }

    pub fn static_get(&self, name: &str) -> Option<Value> {
        self.body.read().static_fields.get(name).cloned()
    }

    pub fn type_desc(&self) -> TypeDesc {
        TypeDesc::interface(self.name.to_string())
    }
}

/// Declarative builder for interface definitions.
pub struct InterfaceBuilder {
    name: String,
    is_sealed: bool,
    permits: Vec<String>,
    methods: IndexMap<String, Vec<MethodSig>>,
    static_fields: AHashMap<String, Value>,
    type_params: Vec<GenericParam>,
}

impl InterfaceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_sealed: false,
            permits: Vec::new(),
            methods: IndexMap::new(),
            static_fields: AHashMap::new(),
            type_params: Vec::new(),
        }
    }

    /// Seals the interface to the given class names.
    pub fn sealed(mut self, permits: Vec<String>) -> Self {
        self.is_sealed = true;
        self.permits = permits;
        self
    }

    pub fn add_type_parameters(mut self, params: Vec<GenericParam>) -> Self {
        self.type_params = params;
        self
    }

    /// Declares an abstract method signature.
    pub fn add_abstract_method(mut self, name: impl Into<String>, params: Vec<ParamSpec>) -> Self {
        let name = name.into();
        self.methods.entry(name.clone()).or_default().push(MethodSig {
            name,
            params,
            return_type: None,
            default_body: None,
        });
        self
    }

    /// Declares a method with a default body.
    pub fn add_default_method(mut self, name: impl Into<String>, func: FuncValue) -> Self {
        let name = name.into();
        self.methods.entry(name.clone()).or_default().push(MethodSig {
            name: name.clone(),
            params: func.params.clone(),
            return_type: func.return_type.clone(),
            default_body: Some(Arc::new(func)),
        });
        self
    }

    /// Declares a host-implemented default method.
    pub fn add_builtin_default_method(self, name: &str, params: Vec<ParamSpec>, f: BuiltinFn) -> Self {
        let func = FuncValue::new_builtin(name, params, f);
        self.add_default_method(name, func)
    }

    pub fn add_static_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.static_fields.insert(name.into(), value);
        self
    }

    /// Materializes the definition, registers it, and binds the name in
    /// `scope`.
    pub fn build(self, registry: &Registry, scope: &Scope) -> RunResult<Arc<InterfaceDef>> {
        let def = Arc::new(InterfaceDef {
            name: self.name.clone().into(),
            package: scope.package().into(),
            is_sealed: self.is_sealed,
            body: RwLock::new(InterfaceBody {
                methods: self.methods,
                permits: self.permits,
                static_fields: self.static_fields,
                type_params: self.type_params,
            }),
        });
        registry.register_interface(scope.package(), def.clone())?;
        scope.define(&self.name, Value::Interface(def.clone()), DeclKind::Let)?;
        log::debug!("installed interface {}.{}", scope.package(), self.name);
        Ok(def)
    }
}
