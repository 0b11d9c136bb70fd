//! Module registry
//!
//! Each CRM module only accepts a fixed set of API methods. The catalog holds
//! every module the crate knows about; the registry is the subset a client was
//! configured with, resolved once at construction.

use super::error::{CrmError, Result};
use std::collections::{BTreeSet, HashMap};

const RECORDS_METHODS: &[&str] = &[
    "getFields",
    "getRecordById",
    "getRecords",
    "getMyRecords",
    "searchRecords",
    "insertRecords",
    "updateRecords",
];

/// Modules a client enables when none are configured
pub const DEFAULT_MODULES: &[&str] = &["Info", "Leads", "Users", "Calls"];

/// A module and the methods it supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    name: String,
    supported_methods: BTreeSet<String>,
}

impl ModuleDescriptor {
    pub fn new<I, S>(name: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            supported_methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supports(&self, method: &str) -> bool {
        self.supported_methods.contains(method)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.supported_methods.iter().map(String::as_str)
    }

    /// Field holding the record id, e.g. `LEADID`
    pub fn id_field(&self) -> String {
        id_field_for(&self.name)
    }
}

/// Identifier field name used by records of `module`
pub fn id_field_for(module: &str) -> String {
    match module {
        "Users" => "id".to_string(),
        "Calls" | "Events" | "Tasks" => "ACTIVITYID".to_string(),
        other => format!("{}ID", singularize(other).to_uppercase()),
    }
}

fn singularize(module: &str) -> String {
    if let Some(stem) = module.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    module.strip_suffix('s').unwrap_or(module).to_string()
}

/// Static set of every module descriptor known to the client
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    descriptors: HashMap<String, ModuleDescriptor>,
}

impl ModuleCatalog {
    pub fn empty() -> Self {
        Self {
            descriptors: HashMap::new(),
        }
    }

    pub fn with(mut self, descriptor: ModuleDescriptor) -> Self {
        self.descriptors.insert(descriptor.name.clone(), descriptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.descriptors.get(name)
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        let leads_methods = RECORDS_METHODS
            .iter()
            .copied()
            .chain(["deleteRecords", "convertLead", "getDeletedRecordIds"]);

        Self::empty()
            .with(ModuleDescriptor::new("Info", ["getModules"]))
            .with(ModuleDescriptor::new("Users", ["getUsers"]))
            .with(ModuleDescriptor::new("Leads", leads_methods))
            .with(ModuleDescriptor::new("Calls", RECORDS_METHODS.iter().copied()))
    }
}

/// Modules enabled on a client, keyed by name
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    names: Vec<String>,
    modules: HashMap<String, ModuleDescriptor>,
}

impl ModuleRegistry {
    /// Resolve every configured module against the catalog
    pub fn build<I, S>(names: I, catalog: &ModuleCatalog) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        let mut modules = HashMap::new();

        for name in names {
            let name = name.as_ref();
            let descriptor = catalog
                .get(name)
                .ok_or_else(|| CrmError::ModuleNotFound(name.to_string()))?;
            if modules.insert(name.to_string(), descriptor.clone()).is_none() {
                ordered.push(name.to_string());
            }
        }

        Ok(Self {
            names: ordered,
            modules,
        })
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn supports(&self, module: &str, method: &str) -> bool {
        self.modules
            .get(module)
            .map(|descriptor| descriptor.supports(method))
            .unwrap_or(false)
    }

    pub fn get(&self, module: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(module)
    }

    /// Module names in configuration order
    pub fn module_names(&self) -> &[String] {
        &self.names
    }
}
