//! Class definitions and the declarative class builder.
//!
//! A [`ClassDef`] owns everything a class declares: fields with modifiers,
//! method overload lists, constructors, static members, generic parameters,
//! implemented interfaces and aliases. Definitions are installed in two
//! phases — the registry learns the name first, then the body is filled —
//! so mutually referential classes resolve cleanly.
//!
//! Instances do not copy method tables; dispatch walks the parent chain at
//! call time and falls back to interface default bodies.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::ast::ParamSpec;
use crate::exceptions::{Exception, RunResult};
use crate::registry::Registry;
use crate::scope::Scope;
use crate::types::{AccessLevel, GenericParam, InterfaceDef, Modifiers, TypeDesc};
use crate::value::{BuiltinFn, FuncValue, Value};

/// A declared field: its type, modifiers, and default value.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub ty: Option<TypeDesc>,
    pub modifiers: Modifiers,
    pub default: Option<Value>,
}

#[derive(Debug, Default)]
struct ClassBody {
    parent: Option<Arc<ClassDef>>,
    interfaces: Vec<Arc<InterfaceDef>>,
    fields: IndexMap<String, FieldDef>,
    /// Overloads per name, in declaration order.
    methods: IndexMap<String, Vec<Arc<FuncValue>>>,
    constructors: Vec<Arc<FuncValue>>,
    static_fields: AHashMap<String, Value>,
    aliases: Vec<String>,
}

/// A class definition.
pub struct ClassDef {
    name: Arc<str>,
    package: Arc<str>,
    file: Arc<str>,
    access: AccessLevel,
    is_abstract: bool,
    is_builtin: bool,
    type_params: Vec<GenericParam>,
    body: RwLock<ClassBody>,
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassDef({})", self.name)
    }
}

impl ClassDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn access(&self) -> AccessLevel {
        self.access
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_builtin(&self) -> bool {
        self.is_builtin
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn type_params(&self) -> &[GenericParam] {
        &self.type_params
    }

    pub fn parent(&self) -> Option<Arc<ClassDef>> {
        self.body.read().parent.clone()
    }

    pub fn interfaces(&self) -> Vec<Arc<InterfaceDef>> {
        self.body.read().interfaces.clone()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.body.read().aliases.clone()
    }

    /// The structural descriptor for this class.
    pub fn type_desc(&self) -> TypeDesc {
        TypeDesc {
            name: self.name.to_string(),
            is_builtin: self.is_builtin,
            is_class: true,
            aliases: self.aliases(),
            ..TypeDesc::default()
        }
    }

    /// Walks the parent chain; true when any ancestor is `target`.
    pub fn is_subclass_of(self: &Arc<Self>, target: &Arc<ClassDef>) -> bool {
        let mut cur = self.clone();
        loop {
            if Arc::ptr_eq(&cur, target) {
                return true;
            }
            match cur.parent() {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    /// True when this class or an ancestor claims `iface`. Sealed
    /// interfaces additionally require this class in their permits list.
    pub fn implements_interface(self: &Arc<Self>, iface: &Arc<InterfaceDef>) -> bool {
        let mut cur = self.clone();
        loop {
            if cur
                .body
                .read()
                .interfaces
                .iter()
                .any(|i| Arc::ptr_eq(i, iface))
            {
                if iface.is_sealed() && !iface.permits(cur.name()) {
                    return false;
                }
                return true;
            }
            match cur.parent() {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    /// Collects the overloads for `name`: the receiver class first, then
    /// ancestors. When no class on the chain defines the method, interface
    /// default bodies are consulted.
    pub fn find_methods(self: &Arc<Self>, name: &str) -> Vec<Arc<FuncValue>> {
        let mut out = Vec::new();
        let mut cur = self.clone();
        loop {
            if let Some(overloads) = cur.body.read().methods.get(name) {
                out.extend(overloads.iter().cloned());
            }
            match cur.parent() {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        if !out.is_empty() {
            return out;
        }

        // Interface defaults apply only when no class on the chain
        // defines the method.
        let mut cur = self.clone();
        loop {
            for iface in cur.body.read().interfaces.iter() {
                if let Some(default) = iface.default_body(name) {
                    out.push(default);
                }
            }
            match cur.parent() {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        out
    }

    /// True when the class (or an ancestor, or a claimed interface
    /// default) provides `name`.
    pub fn has_method(self: &Arc<Self>, name: &str) -> bool {
        !self.find_methods(name).is_empty()
    }

    pub fn constructors(&self) -> Vec<Arc<FuncValue>> {
        self.body.read().constructors.clone()
    }

    /// The zero-argument constructor, when one exists.
    pub fn zero_arg_constructor(&self) -> Option<Arc<FuncValue>> {
        self.body
            .read()
            .constructors
            .iter()
            .find(|c| c.params.is_empty())
            .cloned()
    }

    /// Looks up a declared field, walking the parent chain. Returns the
    /// declaring class alongside the definition for access checks.
    pub fn find_field(self: &Arc<Self>, name: &str) -> Option<(Arc<ClassDef>, FieldDef)> {
        let mut cur = self.clone();
        loop {
            if let Some(field) = cur.body.read().fields.get(name) {
                return Some((cur.clone(), field.clone()));
            }
            match cur.parent() {
                Some(parent) => cur = parent,
                None => return None,
            }
        }
    }

    /// Field defaults for a fresh instance, parent chain first so derived
    /// declarations overwrite inherited ones.
    pub fn field_defaults(self: &Arc<Self>) -> IndexMap<String, Value> {
        let mut chain = Vec::new();
        let mut cur = self.clone();
        loop {
            chain.push(cur.clone());
            match cur.parent() {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        let mut out = IndexMap::new();
        for class in chain.iter().rev() {
            let body = class.body.read();
            for (name, field) in &body.fields {
                if field.modifiers.is_static {
                    continue;
                }
                out.insert(name.clone(), field.default.clone().unwrap_or(Value::Nil));
            }
        }
        out
    }

    /// Reads a static field, walking the parent chain.
    pub fn static_get(self: &Arc<Self>, name: &str) -> Option<Value> {
        let mut cur = self.clone();
        loop {
            if let Some(v) = cur.body.read().static_fields.get(name) {
                return Some(v.clone());
            }
            match cur.parent() {
                Some(parent) => cur = parent,
                None => return None,
            }
        }
    }

    /// Writes a static field on the declaring class.
    pub fn static_set(self: &Arc<Self>, name: &str, value: Value) -> RunResult<()> {
        let mut cur = self.clone();
        loop {
            if cur.body.read().static_fields.contains_key(name) {
                cur.body.write().static_fields.insert(name.to_owned(), value);
                return Ok(());
            }
            match cur.parent() {
                Some(parent) => cur = parent,
                None => {
                    return Err(Exception::attribute_error(format!(
                        "{} has no static field '{name}'",
                        self.name
                    )));
                }
            }
        }
    }

    /// All member names visible on this class, including inherited ones.
    /// Used for attribute hints.
    pub fn member_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        {
            let body = self.body.read();
            out.extend(body.fields.keys().cloned());
            out.extend(body.methods.keys().cloned());
            out.extend(body.static_fields.keys().cloned());
        }
        let mut cur = self.parent();
        while let Some(class) = cur {
            {
                let body = class.body.read();
                out.extend(body.fields.keys().cloned());
                out.extend(body.methods.keys().cloned());
                out.extend(body.static_fields.keys().cloned());
            }
            cur = class.parent();
        }
        out.sort();
        out.dedup();
        out
    }
}

/// Declarative builder for class definitions.
///
/// Calls chain; `build` registers the definition and binds the constructor
/// plus the `__<Name>Class__` key (and any aliases) in the given scope.
pub struct ClassBuilder {
    name: String,
    access: AccessLevel,
    is_abstract: bool,
    is_builtin: bool,
    parent: Option<Arc<ClassDef>>,
    interfaces: Vec<Arc<InterfaceDef>>,
    fields: IndexMap<String, FieldDef>,
    methods: IndexMap<String, Vec<FuncValue>>,
    constructors: Vec<FuncValue>,
    static_fields: AHashMap<String, Value>,
    aliases: Vec<String>,
    type_params: Vec<GenericParam>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access: AccessLevel::Public,
            is_abstract: false,
            is_builtin: false,
            parent: None,
            interfaces: Vec::new(),
            fields: IndexMap::new(),
            methods: IndexMap::new(),
            constructors: Vec::new(),
            static_fields: AHashMap::new(),
            aliases: Vec::new(),
            type_params: Vec::new(),
        }
    }

    /// Marks the class as builtin (host-implemented method bodies).
    pub fn builtin(mut self) -> Self {
        self.is_builtin = true;
        self
    }

    pub fn set_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    /// Single-parent only; later calls replace earlier ones.
    pub fn set_parent(mut self, parent: Arc<ClassDef>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn add_interface(mut self, iface: Arc<InterfaceDef>) -> Self {
        self.interfaces.push(iface);
        self
    }

    pub fn add_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn add_type_parameters(mut self, params: Vec<GenericParam>) -> Self {
        self.type_params = params;
        self
    }

    /// Declares a field. Static fields go to the definition's static
    /// table, never to instances.
    pub fn add_field(mut self, name: impl Into<String>, ty: Option<TypeDesc>, modifiers: Modifiers) -> Self {
        let name = name.into();
        if modifiers.is_static {
            self.static_fields.insert(name, Value::Nil);
        } else {
            self.fields.insert(
                name,
                FieldDef {
                    ty,
                    modifiers,
                    default: None,
                },
            );
        }
        self
    }

    /// Declares a field with a default value.
    pub fn add_field_with_default(
        mut self,
        name: impl Into<String>,
        ty: Option<TypeDesc>,
        modifiers: Modifiers,
        default: Value,
    ) -> Self {
        let name = name.into();
        if modifiers.is_static {
            self.static_fields.insert(name, default);
        } else {
            self.fields.insert(
                name,
                FieldDef {
                    ty,
                    modifiers,
                    default: Some(default),
                },
            );
        }
        self
    }

    /// Declares a static field with its value.
    pub fn add_static_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.static_fields.insert(name.into(), value);
        self
    }

    /// Registers a method; repeated calls with the same name register
    /// overloads in declaration order.
    pub fn add_method(mut self, name: impl Into<String>, func: FuncValue) -> Self {
        self.methods.entry(name.into()).or_default().push(func);
        self
    }

    /// Registers a host-implemented method.
    pub fn add_builtin_method(self, name: &str, params: Vec<ParamSpec>, f: BuiltinFn) -> Self {
        let func = FuncValue::new_builtin(name, params, f);
        self.add_method(name, func)
    }

    /// Registers a host-implemented static method.
    pub fn add_static_method(self, name: &str, params: Vec<ParamSpec>, f: BuiltinFn) -> Self {
        let mut func = FuncValue::new_builtin(name, params, f);
        func.modifiers.is_static = true;
        self.add_method(name, func)
    }

    pub fn add_constructor(mut self, func: FuncValue) -> Self {
        self.constructors.push(func);
        self
    }

    pub fn add_builtin_constructor(self, params: Vec<ParamSpec>, f: BuiltinFn) -> Self {
        let func = FuncValue::new_builtin("init", params, f);
        self.add_constructor(func)
    }

    /// Materializes the definition, registers it, and binds the
    /// constructor, the `__<Name>Class__` key, and the aliases in `scope`.
    pub fn build(self, registry: &Registry, scope: &Scope) -> RunResult<Arc<ClassDef>> {
        self.build_inner(registry, scope, false)
    }

    /// Same as [`Self::build`] but marks the class abstract and registers
    /// no constructor; for modules whose members are all static.
    pub fn build_static(mut self, registry: &Registry, scope: &Scope) -> RunResult<Arc<ClassDef>> {
        self.is_abstract = true;
        self.constructors.clear();
        self.build_inner(registry, scope, true)
    }

    fn build_inner(self, registry: &Registry, scope: &Scope, static_only: bool) -> RunResult<Arc<ClassDef>> {
        // Phase 1: the registry learns the name before the body exists, so
        // methods added below may already reference the class by name.
        let def = Arc::new(ClassDef {
            name: self.name.clone().into(),
            package: scope.package().into(),
            file: scope.file().into(),
            access: self.access,
            is_abstract: self.is_abstract,
            is_builtin: self.is_builtin,
            type_params: self.type_params,
            body: RwLock::new(ClassBody::default()),
        });
        registry.register_class(scope.package(), def.clone())?;
        for alias in &self.aliases {
            registry.register_class_alias(scope.package(), alias, &self.name)?;
        }

        // Phase 2: fill the body, stamping the declaring class on every
        // method and constructor.
        {
            let mut body = def.body.write();
            body.parent = self.parent;
            body.interfaces = self.interfaces;
            body.fields = self.fields;
            body.aliases = self.aliases.clone();
            body.static_fields = self.static_fields;
            for (name, overloads) in self.methods {
                let overloads = overloads
                    .into_iter()
                    .map(|mut m| {
                        m.declaring_class = Some(def.clone());
                        Arc::new(m)
                    })
                    .collect();
                body.methods.insert(name, overloads);
            }
            body.constructors = self
                .constructors
                .into_iter()
                .map(|mut c| {
                    c.declaring_class = Some(def.clone());
                    Arc::new(c)
                })
                .collect();
        }

        let bound = if static_only || def.is_abstract {
            Value::Class(def.clone())
        } else {
            Value::Constructor(def.clone())
        };
        scope.define(&self.name, bound.clone(), crate::ast::DeclKind::Let)?;
        scope.define(
            &format!("__{}Class__", self.name),
            Value::Class(def.clone()),
            crate::ast::DeclKind::Let,
        )?;
        for alias in &self.aliases {
            scope.define(alias, bound.clone(), crate::ast::DeclKind::Let)?;
        }
        log::debug!("installed class {}.{}", scope.package(), self.name);
        Ok(def)
    }
}
