//! Autodiscovery: walk configured module roots and register every entity type found.
//!
//! The scan is best-effort. A root or sub-module that fails to resolve, or a type that
//! fails to classify, is logged and skipped; the rest of the scan continues.

use crate::error::DiscoveryError;
use crate::model::descriptor::{EntityHandle, ModelDescriptor};
use crate::model::entity::{Candidate, Schema};
use crate::model::registry::Registry;
use std::any::Any;
use std::collections::BTreeSet;
use std::panic;
use tracing::{debug, info, warn};

/// A resolved module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    pub path: String,
    /// Has sub-modules to walk.
    pub is_package: bool,
}

/// Where discovery finds modules and the types they declare.
pub trait ModuleSource {
    fn resolve(&self, path: &str) -> Result<ModuleInfo, DiscoveryError>;
    /// Every module transitively reachable below `module`, not including itself.
    fn submodules(&self, module: &ModuleInfo) -> Vec<String>;
    /// Types declared directly in `module`.
    fn types(&self, module: &ModuleInfo) -> Vec<Candidate>;
}

/// Module source backed by candidates submitted with `register_entity!` / `register_type!`.
#[derive(Clone, Debug)]
pub struct InventorySource {
    candidates: Vec<Candidate>,
}

impl InventorySource {
    pub fn collect() -> Self {
        InventorySource {
            candidates: inventory::iter::<Candidate>.into_iter().copied().collect(),
        }
    }

    fn module_paths(&self) -> BTreeSet<&'static str> {
        self.candidates.iter().map(|c| c.module).collect()
    }
}

impl Default for InventorySource {
    fn default() -> Self {
        Self::collect()
    }
}

impl ModuleSource for InventorySource {
    fn resolve(&self, path: &str) -> Result<ModuleInfo, DiscoveryError> {
        let prefix = format!("{}::", path);
        let modules = self.module_paths();
        let exact = modules.contains(path);
        let is_package = modules.iter().any(|m| m.starts_with(&prefix));
        if !exact && !is_package {
            return Err(DiscoveryError::ImportFailure {
                path: path.to_string(),
                reason: "no module with that path declares any types".into(),
            });
        }
        Ok(ModuleInfo {
            path: path.to_string(),
            is_package,
        })
    }

    fn submodules(&self, module: &ModuleInfo) -> Vec<String> {
        let prefix = format!("{}::", module.path);
        let mut found: BTreeSet<String> = BTreeSet::new();
        for m in self.module_paths() {
            let Some(rest) = m.strip_prefix(&prefix) else { continue };
            // Intermediate modules that declare nothing themselves are still reachable.
            let mut path = module.path.clone();
            for segment in rest.split("::") {
                path.push_str("::");
                path.push_str(segment);
                found.insert(path.clone());
            }
        }
        found.into_iter().collect()
    }

    fn types(&self, module: &ModuleInfo) -> Vec<Candidate> {
        self.candidates
            .iter()
            .filter(|c| c.module == module.path)
            .copied()
            .collect()
    }
}

/// Run the candidate's schema function. `Ok(None)` means "not an entity".
pub fn classify(candidate: &Candidate) -> Result<Option<Schema>, DiscoveryError> {
    let Some(schema_fn) = candidate.schema else {
        return Ok(None);
    };
    let schema = panic::catch_unwind(schema_fn).map_err(|payload| DiscoveryError::Classification {
        type_name: candidate.qualified_name(),
        reason: format!("schema declaration panicked: {}", panic_message(payload.as_ref())),
    })?;
    if schema.columns().is_empty() {
        return Ok(None);
    }
    Ok(Some(schema))
}

/// Whether the candidate declares a schema (either shape) with at least one column.
/// Never fails: anything that errors during classification is simply not an entity.
pub fn is_entity_type(candidate: &Candidate) -> bool {
    matches!(classify(candidate), Ok(Some(_)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}

/// Outcome of one scan. Skips (plain types) are kept apart from failures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Registry names, in registration order.
    pub registered: Vec<String>,
    /// Qualified names of types that are not entities.
    pub skipped: Vec<String>,
    pub failures: Vec<DiscoveryError>,
}

pub struct Scanner<S> {
    source: S,
}

impl<S: ModuleSource> Scanner<S> {
    pub fn new(source: S) -> Self {
        Scanner { source }
    }

    pub fn scan<R: AsRef<str>>(&self, roots: &[R], registry: &mut Registry) -> ScanReport {
        let mut report = ScanReport::default();
        for root in roots {
            let root = root.as_ref();
            let package = match self.source.resolve(root) {
                Ok(m) => m,
                Err(e) => {
                    warn!(root = %root, error = %e, "discovery root skipped");
                    report.failures.push(e);
                    continue;
                }
            };

            let mut modules = Vec::new();
            if package.is_package {
                for path in self.source.submodules(&package) {
                    match self.source.resolve(&path) {
                        Ok(m) => modules.push(m),
                        Err(e) => {
                            warn!(module = %path, error = %e, "sub-module skipped");
                            report.failures.push(e);
                        }
                    }
                }
            }
            modules.insert(0, package);

            for module in &modules {
                for candidate in self.source.types(module) {
                    self.visit(&candidate, registry, &mut report);
                }
            }
        }
        info!(
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            failures = report.failures.len(),
            "model discovery finished"
        );
        report
    }

    fn visit(&self, candidate: &Candidate, registry: &mut Registry, report: &mut ScanReport) {
        let schema = match classify(candidate) {
            Ok(Some(schema)) => schema,
            Ok(None) => {
                debug!(r#type = %candidate.qualified_name(), "not an entity type");
                report.skipped.push(candidate.qualified_name());
                return;
            }
            Err(e) => {
                warn!(error = %e, "type skipped");
                report.failures.push(e);
                return;
            }
        };
        let handle = EntityHandle {
            module: candidate.module,
            type_name: candidate.type_name,
        };
        match ModelDescriptor::derive(handle, &schema) {
            Ok(descriptor) => {
                let name = descriptor.name.clone();
                if let Some(previous) = registry.register(descriptor) {
                    debug!(model = %name, previous = %previous.handle, "model re-registered");
                }
                info!(model = %name, r#type = %candidate.qualified_name(), "registered model");
                report.registered.push(name);
            }
            Err(e) => {
                warn!(error = %e, "type skipped");
                report.failures.push(e);
            }
        }
    }
}
