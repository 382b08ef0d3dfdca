//! Enum definitions and symbolic values.

use std::fmt;
use std::sync::Arc;

use crate::ast::DeclKind;
use crate::exceptions::RunResult;
use crate::registry::Registry;
use crate::scope::Scope;
use crate::types::TypeDesc;
use crate::value::{EnumValue, Value};

/// An enum definition: a name and its variants, in declaration order.
pub struct EnumDef {
    name: Arc<str>,
    package: Arc<str>,
    variants: Vec<Arc<str>>,
}

impl fmt::Debug for EnumDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumDef({})", self.name)
    }
}

impl EnumDef {
    pub fn new(
        name: impl Into<Arc<str>>,
        package: impl Into<Arc<str>>,
        variants: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn variants(&self) -> &[Arc<str>] {
        &self.variants
    }

    pub fn variant_names(&self) -> Vec<String> {
        self.variants.iter().map(|v| v.to_string()).collect()
    }

    /// The symbolic value for `variant`, when declared.
    pub fn value_of(&self, variant: &str) -> Option<EnumValue> {
        self.variants
            .iter()
            .find(|v| ***v == *variant)
            .map(|v| EnumValue {
                enum_name: self.name.clone(),
                variant: v.clone(),
            })
    }

    /// The position of `variant` in declaration order.
    pub fn ordinal(&self, variant: &str) -> Option<usize> {
        self.variants.iter().position(|v| **v == *variant)
    }

    pub fn type_desc(&self) -> TypeDesc {
        TypeDesc::enumeration(self.name.to_string())
    }

    /// Registers the definition and binds its name in `scope`.
    pub fn install(self, registry: &Registry, scope: &Scope) -> RunResult<Arc<Self>> {
        let def = Arc::new(self);
        registry.register_enum(scope.package(), def.clone())?;
        scope.define(def.name(), Value::Enum(def.clone()), DeclKind::Let)?;
        Ok(def)
    }
}
