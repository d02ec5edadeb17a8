//! Generic model layer: entity declarations, derived descriptors, the registry and discovery.

pub mod descriptor;
pub mod entity;
pub mod registry;
pub mod scanner;

pub use descriptor::{EntityHandle, FieldDescriptor, FieldSetters, ModelDescriptor};
pub use entity::{Candidate, ColumnDef, ColumnKind, Entity, MappedDef, Schema, TableDef};
pub use registry::{Registry, RegistryHandle};
pub use scanner::{classify, is_entity_type, InventorySource, ModuleInfo, ModuleSource, ScanReport, Scanner};
