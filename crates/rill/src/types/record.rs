//! Record definitions: named, immutable component aggregates.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::ast::DeclKind;
use crate::exceptions::RunResult;
use crate::registry::Registry;
use crate::scope::Scope;
use crate::types::TypeDesc;
use crate::value::{FuncValue, Value};

/// A record definition: component names in declaration order plus any
/// declared methods.
pub struct RecordDef {
    name: Arc<str>,
    package: Arc<str>,
    components: Vec<(String, Option<TypeDesc>)>,
    methods: RwLock<IndexMap<String, Vec<Arc<FuncValue>>>>,
}

impl fmt::Debug for RecordDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordDef({})", self.name)
    }
}

impl RecordDef {
    pub fn new(
        name: impl Into<Arc<str>>,
        package: impl Into<Arc<str>>,
        components: Vec<(String, Option<TypeDesc>)>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            components,
            methods: RwLock::new(IndexMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn components(&self) -> &[(String, Option<TypeDesc>)] {
        &self.components
    }

    pub fn component_names(&self) -> Vec<String> {
        self.components.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn add_method(&self, name: impl Into<String>, func: FuncValue) {
        self.methods
            .write()
            .entry(name.into())
            .or_default()
            .push(Arc::new(func));
    }

    pub fn find_methods(&self, name: &str) -> Vec<Arc<FuncValue>> {
        self.methods
            .read()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn method_names(&self) -> Vec<String> {
        self.methods.read().keys().cloned().collect()
    }

    pub fn type_desc(&self) -> TypeDesc {
        TypeDesc::record(self.name.to_string())
    }

    /// Registers the definition and binds its name in `scope`.
    pub fn install(self, registry: &Registry, scope: &Scope) -> RunResult<Arc<Self>> {
        let def = Arc::new(self);
        registry.register_record(scope.package(), def.clone())?;
        scope.define(def.name(), Value::RecordDef(def.clone()), DeclKind::Let)?;
        Ok(def)
    }
}
