//! Entity capability interface: what a host type declares so it can be discovered.
//!
//! A type opts in by implementing [`Entity`] and submitting itself with
//! [`register_entity!`](crate::register_entity). Two declaration shapes are accepted:
//! a full table definition ([`Schema::Table`]) or a mapper-style declaration whose table
//! name is optional ([`Schema::Mapped`]). Both derive the same
//! [`ModelDescriptor`](super::ModelDescriptor).

use serde::Serialize;
use serde_json::Value;

/// Primitive storage kind of a column. Drives coercion of form and path input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
    /// RFC 3339 text.
    Timestamp,
    /// Hyphenated text.
    Uuid,
}

impl ColumnKind {
    /// SQLite column type used when creating the table.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Float => "REAL",
            ColumnKind::Boolean => "BOOLEAN",
            ColumnKind::Text | ColumnKind::Timestamp | ColumnKind::Uuid => "TEXT",
        }
    }
}

/// One declared column.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub primary_key: bool,
    pub nullable: bool,
    pub unique: bool,
    /// Never serialised on read surfaces (e.g. password hashes).
    pub sensitive: bool,
    /// Application-level default applied on create when the field is not supplied.
    pub default: Option<Value>,
    /// Fill with the current UTC time on create when the field is not supplied.
    pub default_now: bool,
}

impl ColumnDef {
    /// A non-null, non-key column.
    pub fn new(name: &'static str, kind: ColumnKind) -> Self {
        ColumnDef {
            name,
            kind,
            primary_key: false,
            nullable: false,
            unique: false,
            sensitive: false,
            default: None,
            default_now: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Computed default: RFC 3339 timestamp taken at insert time.
    pub fn default_now(mut self) -> Self {
        self.default_now = true;
        self
    }
}

/// Table definition attached directly to a type.
#[derive(Clone, Debug, PartialEq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: Vec<ColumnDef>,
}

/// Mapper-style declaration: columns are mapped attributes, the table name is optional.
#[derive(Clone, Debug, PartialEq)]
pub struct MappedDef {
    pub table_name: Option<&'static str>,
    pub columns: Vec<ColumnDef>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Schema {
    Table(TableDef),
    Mapped(MappedDef),
}

impl Schema {
    /// Explicit table name, if the declaration carries one.
    pub fn table_name(&self) -> Option<&'static str> {
        let name = match self {
            Schema::Table(t) => Some(t.name),
            Schema::Mapped(m) => m.table_name,
        };
        name.filter(|n| !n.trim().is_empty())
    }

    pub fn columns(&self) -> &[ColumnDef] {
        match self {
            Schema::Table(t) => &t.columns,
            Schema::Mapped(m) => &m.columns,
        }
    }
}

/// Capability a host type implements to be managed by the admin.
pub trait Entity: 'static {
    fn schema() -> Schema;
}

/// A type submitted for discovery, tagged with the module that declared it.
///
/// Plain types carry no schema and are skipped by the predicate.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    pub module: &'static str,
    pub type_name: &'static str,
    pub schema: Option<fn() -> Schema>,
}

impl Candidate {
    pub const fn entity<T: Entity>(module: &'static str, type_name: &'static str) -> Self {
        Candidate {
            module,
            type_name,
            schema: Some(T::schema as fn() -> Schema),
        }
    }

    pub const fn plain(module: &'static str, type_name: &'static str) -> Self {
        Candidate {
            module,
            type_name,
            schema: None,
        }
    }

    /// `module::Type`.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.module, self.type_name)
    }
}

inventory::collect!(Candidate);

/// Submit an [`Entity`] type for discovery from the current module.
#[macro_export]
macro_rules! register_entity {
    ($ty:ty) => {
        $crate::inventory::submit! {
            $crate::model::Candidate::entity::<$ty>(module_path!(), stringify!($ty))
        }
    };
}

/// Submit a plain type (no schema) so discovery sees it alongside the module's entities.
#[macro_export]
macro_rules! register_type {
    ($ty:ty) => {
        $crate::inventory::submit! {
            $crate::model::Candidate::plain(module_path!(), stringify!($ty))
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_table_name_blank_counts_as_absent() {
        let schema = Schema::Mapped(MappedDef {
            table_name: Some("  "),
            columns: vec![ColumnDef::new("id", ColumnKind::Integer).primary_key()],
        });
        assert_eq!(schema.table_name(), None);
    }

    #[test]
    fn column_builder_sets_flags() {
        let c = ColumnDef::new("email", ColumnKind::Text)
            .nullable()
            .unique()
            .default_value("x");
        assert!(c.nullable && c.unique && !c.primary_key && !c.sensitive);
        assert_eq!(c.default, Some(Value::String("x".into())));
    }
}
