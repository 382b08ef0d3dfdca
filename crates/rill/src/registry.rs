//! Global type registries.
//!
//! Definitions are registered per package; lookups resolve in the current
//! package first, then fall back to the builtin package. Registration is
//! one-shot per (package, name) and effectively immutable afterwards, so
//! concurrent reads need no coordination beyond the interior locks.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::exceptions::{Exception, RunResult};
use crate::types::{ClassDef, EnumDef, InterfaceDef, RecordDef};

/// The package builtin definitions are installed under.
pub const BUILTIN_PACKAGE: &str = "core";

#[derive(Default)]
struct PackageMaps {
    classes: AHashMap<String, Arc<ClassDef>>,
    /// alias -> canonical class name, within this package.
    class_aliases: AHashMap<String, String>,
    interfaces: AHashMap<String, Arc<InterfaceDef>>,
    enums: AHashMap<String, Arc<EnumDef>>,
    records: AHashMap<String, Arc<RecordDef>>,
}

/// Registries for classes, interfaces, enums and records, scoped by
/// package.
#[derive(Default)]
pub struct Registry {
    packages: RwLock<AHashMap<Arc<str>, PackageMaps>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_package<R>(&self, package: &str, f: impl FnOnce(&mut PackageMaps) -> R) -> R {
        let mut packages = self.packages.write();
        let maps = match packages.get_mut(package) {
            Some(maps) => maps,
            None => packages.entry(Arc::from(package)).or_default(),
        };
        f(maps)
    }

    pub fn register_class(&self, package: &str, def: Arc<ClassDef>) -> RunResult<()> {
        self.with_package(package, |maps| {
            let name = def.name().to_owned();
            if maps.classes.contains_key(&name) {
                log::warn!("duplicate class declaration {package}.{name}");
                return Err(Exception::runtime_error(format!(
                    "class '{name}' is already declared in package '{package}'"
                )));
            }
            maps.classes.insert(name, def);
            Ok(())
        })
    }

    pub fn register_class_alias(&self, package: &str, alias: &str, target: &str) -> RunResult<()> {
        self.with_package(package, |maps| {
            if maps.classes.contains_key(alias) || maps.class_aliases.contains_key(alias) {
                return Err(Exception::runtime_error(format!(
                    "name '{alias}' is already declared in package '{package}'"
                )));
            }
            maps.class_aliases.insert(alias.to_owned(), target.to_owned());
            Ok(())
        })
    }

    /// Resolves a class name (following aliases) in `package`, falling
    /// back to the builtin package.
    pub fn lookup_class(&self, package: &str, name: &str) -> Option<Arc<ClassDef>> {
        let packages = self.packages.read();
        for pkg in [package, BUILTIN_PACKAGE] {
            if let Some(maps) = packages.get(pkg) {
                let canonical = maps.class_aliases.get(name).map_or(name, String::as_str);
                if let Some(def) = maps.classes.get(canonical) {
                    return Some(def.clone());
                }
            }
        }
        None
    }

    /// A builtin class by canonical name or alias.
    pub fn builtin_class(&self, name: &str) -> Option<Arc<ClassDef>> {
        self.lookup_class(BUILTIN_PACKAGE, name)
    }

    /// Canonical class name for `name` (resolving aliases), when the name
    /// denotes a registered class.
    pub fn canonical_class_name(&self, package: &str, name: &str) -> Option<String> {
        self.lookup_class(package, name).map(|def| def.name().to_owned())
    }

    pub fn register_interface(&self, package: &str, def: Arc<InterfaceDef>) -> RunResult<()> {
        self.with_package(package, |maps| {
            let name = def.name().to_owned();
            if maps.interfaces.contains_key(&name) {
                return Err(Exception::runtime_error(format!(
                    "interface '{name}' is already declared in package '{package}'"
                )));
            }
            maps.interfaces.insert(name, def);
            Ok(())
        })
    }

    pub fn lookup_interface(&self, package: &str, name: &str) -> Option<Arc<InterfaceDef>> {
        let packages = self.packages.read();
        for pkg in [package, BUILTIN_PACKAGE] {
            if let Some(def) = packages.get(pkg).and_then(|m| m.interfaces.get(name)) {
                return Some(def.clone());
            }
        }
        None
    }

    pub fn register_enum(&self, package: &str, def: Arc<EnumDef>) -> RunResult<()> {
        self.with_package(package, |maps| {
            let name = def.name().to_owned();
            if maps.enums.contains_key(&name) {
                return Err(Exception::runtime_error(format!(
                    "enum '{name}' is already declared in package '{package}'"
                )));
            }
            maps.enums.insert(name, def);
            Ok(())
        })
    }

    pub fn lookup_enum(&self, package: &str, name: &str) -> Option<Arc<EnumDef>> {
        let packages = self.packages.read();
        for pkg in [package, BUILTIN_PACKAGE] {
            if let Some(def) = packages.get(pkg).and_then(|m| m.enums.get(name)) {
                return Some(def.clone());
            }
        }
        None
    }

    pub fn register_record(&self, package: &str, def: Arc<RecordDef>) -> RunResult<()> {
        self.with_package(package, |maps| {
            let name = def.name().to_owned();
            if maps.records.contains_key(&name) {
                return Err(Exception::runtime_error(format!(
                    "record '{name}' is already declared in package '{package}'"
                )));
            }
            maps.records.insert(name, def);
            Ok(())
        })
    }

    pub fn lookup_record(&self, package: &str, name: &str) -> Option<Arc<RecordDef>> {
        let packages = self.packages.read();
        for pkg in [package, BUILTIN_PACKAGE] {
            if let Some(def) = packages.get(pkg).and_then(|m| m.records.get(name)) {
                return Some(def.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::ExcKind;
    use crate::scope::Scope;
    use crate::types::ClassBuilder;

    #[test]
    fn duplicate_registration_fails() {
        let registry = Registry::new();
        let scope = Scope::new_root("main", "test.rl");
        ClassBuilder::new("Point").build(&registry, &scope).unwrap();
        let err = ClassBuilder::new("Point").build(&registry, &scope).unwrap_err();
        assert_eq!(err.kind, ExcKind::RuntimeError);
    }

    #[test]
    fn lookup_falls_back_to_builtin_package() {
        let registry = Registry::new();
        let core = Scope::new_root(BUILTIN_PACKAGE, "core.rl");
        ClassBuilder::new("Widget").builtin().build(&registry, &core).unwrap();

        assert!(registry.lookup_class("main", "Widget").is_some());
        assert!(registry.lookup_class("main", "widget").is_none());
    }

    #[test]
    fn aliases_resolve_to_the_canonical_class() {
        let registry = Registry::new();
        let core = Scope::new_root(BUILTIN_PACKAGE, "core.rl");
        ClassBuilder::new("Int")
            .builtin()
            .add_alias("Integer")
            .build(&registry, &core)
            .unwrap();

        let by_alias = registry.lookup_class("main", "Integer").unwrap();
        assert_eq!(by_alias.name(), "Int");
        assert_eq!(registry.canonical_class_name("main", "Integer").as_deref(), Some("Int"));
    }
}
