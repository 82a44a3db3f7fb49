// packages/harness/src/loader/definitions.rs
//! Definition modules and the registry they are installed into
//!
//! A definition module declares types, enums, and interfaces, and names the
//! modules it depends on. Installing a module whose dependencies or types
//! are not yet defined fails, which is what makes load order matter.

use crate::utils::errors::{HarnessError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Types every module may use without defining them
pub const PRIMITIVE_TYPES: [&str; 7] = [
    "bool", "int32", "uint32", "int64", "uint64", "double", "string",
];

/// One parsed definition resource
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionModule {
    /// Module name other modules refer to in `requires`
    pub module: String,

    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub enums: Vec<EnumDef>,

    #[serde(default)]
    pub interfaces: Vec<InterfaceDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDef {
    pub name: String,
    pub values: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceDef {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl DefinitionModule {
    /// Parse a YAML definition resource
    pub fn parse(resource: &str, source: &str) -> Result<Self> {
        serde_yaml::from_str(source)
            .map_err(|e| HarnessError::load_failure(resource, format!("parse error: {}", e)))
    }
}

impl InterfaceDef {
    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Everything loaded so far
#[derive(Debug, Default)]
pub struct Definitions {
    /// Module names in load order
    modules: Vec<String>,
    types: HashSet<String>,
    enums: HashMap<String, EnumDef>,
    interfaces: HashMap<String, InterfaceDef>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a module loaded from `resource`
    ///
    /// Nothing is installed if any check fails.
    pub fn install(&mut self, resource: &str, module: DefinitionModule) -> Result<()> {
        let fail = |reason: String| HarnessError::load_failure(resource, reason);

        if self.modules.contains(&module.module) {
            return Err(fail(format!("module {} is already loaded", module.module)));
        }

        for required in &module.requires {
            if !self.modules.contains(required) {
                return Err(fail(format!(
                    "module {} requires {}, which is not loaded",
                    module.module, required
                )));
            }
        }

        let mut new_symbols = HashSet::new();
        let symbols = module
            .types
            .iter()
            .chain(module.enums.iter().map(|e| &e.name))
            .chain(module.interfaces.iter().map(|i| &i.name));
        for symbol in symbols {
            if self.is_defined(symbol) || !new_symbols.insert(symbol.as_str()) {
                return Err(fail(format!("symbol {} is defined twice", symbol)));
            }
        }

        for interface in &module.interfaces {
            for method in &interface.methods {
                for param in &method.params {
                    let known = PRIMITIVE_TYPES.contains(&param.ty.as_str())
                        || self.types.contains(&param.ty)
                        || module.types.contains(&param.ty);
                    if !known {
                        return Err(fail(format!(
                            "{}.{} parameter {} has undefined type {}",
                            interface.name, method.name, param.name, param.ty
                        )));
                    }
                }
            }
        }

        debug!(
            "Installed module {} ({} types, {} enums, {} interfaces)",
            module.module,
            module.types.len(),
            module.enums.len(),
            module.interfaces.len()
        );

        self.types.extend(module.types);
        self.enums
            .extend(module.enums.into_iter().map(|e| (e.name.clone(), e)));
        self.interfaces
            .extend(module.interfaces.into_iter().map(|i| (i.name.clone(), i)));
        self.modules.push(module.module);

        Ok(())
    }

    fn is_defined(&self, symbol: &str) -> bool {
        self.types.contains(symbol)
            || self.enums.contains_key(symbol)
            || self.interfaces.contains_key(symbol)
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceDef> {
        self.interfaces.get(name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(yaml: &str) -> DefinitionModule {
        DefinitionModule::parse("test.yaml", yaml).unwrap()
    }

    #[test]
    fn test_parse_interface() {
        let m = module(
            r#"
module: demo
interfaces:
  - name: demo.Service
    methods:
      - name: ping
        params:
          - { name: count, type: uint32 }
"#,
        );
        assert_eq!(m.module, "demo");
        let ping = m.interfaces[0].method("ping").unwrap();
        assert_eq!(ping.params[0].ty, "uint32");
    }

    #[test]
    fn test_parse_error_names_resource() {
        let err = DefinitionModule::parse("broken.yaml", "module: [").unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_missing_requirement_rejected() {
        let mut defs = Definitions::new();
        let err = defs
            .install("b.yaml", module("module: b\nrequires: [a]\n"))
            .unwrap_err();
        assert!(err.to_string().contains("requires a"));
        assert!(defs.modules().is_empty());
    }

    #[test]
    fn test_requirement_satisfied_in_order() {
        let mut defs = Definitions::new();
        defs.install("a.yaml", module("module: a\ntypes: [handle]\n"))
            .unwrap();
        defs.install(
            "b.yaml",
            module(
                r#"
module: b
requires: [a]
interfaces:
  - name: b.Service
    methods:
      - name: open
        params:
          - { name: h, type: handle }
"#,
            ),
        )
        .unwrap();

        assert_eq!(defs.modules(), &["a".to_string(), "b".to_string()]);
        assert!(defs.interface("b.Service").is_some());
    }

    #[test]
    fn test_undefined_param_type_rejected() {
        let mut defs = Definitions::new();
        let err = defs
            .install(
                "c.yaml",
                module(
                    r#"
module: c
interfaces:
  - name: c.Service
    methods:
      - name: open
        params:
          - { name: h, type: handle }
"#,
                ),
            )
            .unwrap_err();
        assert!(err.to_string().contains("undefined type handle"));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let mut defs = Definitions::new();
        defs.install("a.yaml", module("module: a\ntypes: [handle]\n"))
            .unwrap();
        let err = defs
            .install("b.yaml", module("module: b\ntypes: [handle]\n"))
            .unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }
}
