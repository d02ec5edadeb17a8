//! Derived model metadata: descriptors flattened from an entity declaration for runtime use.

use crate::error::{AppError, DiscoveryError};
use crate::model::entity::{ColumnKind, Entity, Schema};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier pattern"))
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub is_primary_key: bool,
    pub nullable: bool,
    pub kind: ColumnKind,
    pub unique: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    pub default_now: bool,
}

impl FieldDescriptor {
    /// Integer keys alias the SQLite rowid and are assigned by the store.
    pub fn is_generated_key(&self) -> bool {
        self.is_primary_key && self.kind == ColumnKind::Integer
    }

    /// Value used on create when the field is not supplied.
    pub fn default_for_insert(&self) -> Option<Value> {
        if self.default_now {
            return Some(Value::String(chrono::Utc::now().to_rfc3339()));
        }
        self.default.clone()
    }

    /// Coerce a raw input value to this field's kind. Empty strings become null.
    pub fn coerce(&self, value: Value) -> Result<Value, AppError> {
        let value = match value {
            Value::String(s) if s.is_empty() => Value::Null,
            other => other,
        };
        match (&self.kind, value) {
            (_, Value::Null) => Ok(Value::Null),
            (ColumnKind::Integer, Value::Number(n)) if n.is_i64() => Ok(Value::Number(n)),
            (ColumnKind::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .map_err(|_| self.invalid("expected an integer")),
            (ColumnKind::Float, Value::Number(n)) => Ok(Value::Number(n)),
            (ColumnKind::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| self.invalid("expected a number")),
            (ColumnKind::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
            (ColumnKind::Boolean, Value::Number(n)) => Ok(Value::Bool(n.as_i64() != Some(0))),
            (ColumnKind::Boolean, Value::String(s)) => parse_bool(&s)
                .map(Value::Bool)
                .ok_or_else(|| self.invalid("expected a boolean")),
            (ColumnKind::Text, Value::String(s)) => Ok(Value::String(s)),
            (ColumnKind::Text, v @ (Value::Number(_) | Value::Bool(_))) => {
                Ok(Value::String(v.to_string()))
            }
            (ColumnKind::Timestamp, Value::String(s)) => parse_timestamp(&s)
                .map(Value::String)
                .ok_or_else(|| self.invalid("expected an RFC 3339 timestamp")),
            (ColumnKind::Uuid, Value::String(s)) => uuid::Uuid::parse_str(s.trim())
                .map(|u| Value::String(u.to_string()))
                .map_err(|_| self.invalid("expected a UUID")),
            (_, other) => Err(self.invalid(&format!("unsupported value {}", other))),
        }
    }

    /// Coerce a path segment to this field's kind.
    pub fn coerce_path(&self, raw: &str) -> Result<Value, AppError> {
        let coerced = self
            .coerce(Value::String(raw.to_string()))
            .map_err(|e| match e {
                AppError::InvalidValue { field, reason } => {
                    AppError::BadRequest(format!("invalid {}: {}", field, reason))
                }
                other => other,
            })?;
        match coerced {
            Value::Null => Err(AppError::BadRequest(format!("empty {}", self.name))),
            v => Ok(v),
        }
    }

    fn invalid(&self, reason: &str) -> AppError {
        AppError::InvalidValue {
            field: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Accepts RFC 3339 and the `datetime-local` form format; normalises to RFC 3339 UTC.
fn parse_timestamp(s: &str) -> Option<String> {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&chrono::Utc).to_rfc3339());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|f| chrono::NaiveDateTime::parse_from_str(s, f).ok())
        .map(|naive| naive.and_utc().to_rfc3339())
}

/// Opaque reference back to the concrete host type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityHandle {
    pub module: &'static str,
    pub type_name: &'static str,
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.type_name)
    }
}

type Setter = Arc<dyn Fn(&mut Map<String, Value>, Value) -> Result<(), AppError> + Send + Sync>;

/// Field-name to setter table, captured once when the descriptor is derived.
#[derive(Clone, Default)]
pub struct FieldSetters {
    by_name: HashMap<String, Setter>,
}

impl FieldSetters {
    fn build(fields: &[FieldDescriptor]) -> Self {
        let by_name = fields
            .iter()
            .map(|f| {
                let field = f.clone();
                let setter: Setter = Arc::new(move |target, raw| {
                    let value = field.coerce(raw)?;
                    target.insert(field.name.clone(), value);
                    Ok(())
                });
                (f.name.clone(), setter)
            })
            .collect();
        FieldSetters { by_name }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    fn set(&self, name: &str, target: &mut Map<String, Value>, raw: Value) -> Option<Result<(), AppError>> {
        self.by_name.get(name).map(|s| s(target, raw))
    }
}

impl fmt::Debug for FieldSetters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.by_name.keys().collect();
        names.sort();
        f.debug_struct("FieldSetters").field("fields", &names).finish()
    }
}

#[derive(Clone, Debug)]
pub struct ModelDescriptor {
    /// Registry key and table name.
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub handle: EntityHandle,
    pk_index: usize,
    setters: FieldSetters,
}

impl ModelDescriptor {
    /// Derive a descriptor from a declaration. Rejects zero or multiple primary keys,
    /// duplicate columns, and names that are not plain identifiers.
    pub fn derive(handle: EntityHandle, schema: &Schema) -> Result<Self, DiscoveryError> {
        let fail = |reason: String| DiscoveryError::Classification {
            type_name: handle.to_string(),
            reason,
        };
        let name = schema
            .table_name()
            .map(str::to_string)
            .unwrap_or_else(|| handle.type_name.to_lowercase());
        if !identifier_re().is_match(&name) {
            return Err(fail(format!("invalid table name '{}'", name)));
        }
        if schema.columns().is_empty() {
            return Err(fail("no columns declared".into()));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(schema.columns().len());
        for c in schema.columns() {
            if !identifier_re().is_match(c.name) {
                return Err(fail(format!("invalid column name '{}'", c.name)));
            }
            if !seen.insert(c.name) {
                return Err(fail(format!("duplicate column '{}'", c.name)));
            }
            fields.push(FieldDescriptor {
                name: c.name.to_string(),
                is_primary_key: c.primary_key,
                nullable: c.nullable && !c.primary_key,
                kind: c.kind,
                unique: c.unique,
                sensitive: c.sensitive,
                default: c.default.clone(),
                default_now: c.default_now,
            });
        }

        let pks: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_primary_key)
            .map(|(i, _)| i)
            .collect();
        let pk_index = match pks.as_slice() {
            [one] => *one,
            [] => return Err(fail("no primary key declared".into())),
            _ => return Err(fail(format!("{} primary keys declared, expected one", pks.len()))),
        };

        let setters = FieldSetters::build(&fields);
        Ok(ModelDescriptor {
            name,
            fields,
            handle,
            pk_index,
            setters,
        })
    }

    /// Derive directly from a Rust type, for manual registration.
    pub fn of<T: Entity>(type_name: &'static str) -> Result<Self, DiscoveryError> {
        let handle = EntityHandle {
            module: std::any::type_name::<T>()
                .rsplit_once("::")
                .map(|(m, _)| m)
                .unwrap_or(""),
            type_name,
        };
        Self::derive(handle, &T::schema())
    }

    pub fn primary_key(&self) -> &FieldDescriptor {
        &self.fields[self.pk_index]
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Field names offered on the add form. Store-assigned keys are left out.
    pub fn form_field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.is_generated_key())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Run the setter table over raw input. Unknown names are ignored.
    pub fn assign(&self, values: &Map<String, Value>) -> Result<Map<String, Value>, AppError> {
        let mut out = Map::new();
        for (name, raw) in values {
            match self.setters.set(name, &mut out, raw.clone()) {
                Some(result) => result?,
                None => tracing::debug!(model = %self.name, field = %name, "ignoring unknown field"),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::{ColumnDef, MappedDef, TableDef};
    use serde_json::json;

    fn handle(type_name: &'static str) -> EntityHandle {
        EntityHandle {
            module: "tests",
            type_name,
        }
    }

    fn author_columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", ColumnKind::Integer).primary_key(),
            ColumnDef::new("name", ColumnKind::Text),
            ColumnDef::new("email", ColumnKind::Text).nullable(),
            ColumnDef::new("active", ColumnKind::Boolean).default_value(true),
        ]
    }

    #[test]
    fn derives_exactly_one_primary_key() {
        let schema = Schema::Table(TableDef {
            name: "authors",
            columns: author_columns(),
        });
        let d = ModelDescriptor::derive(handle("Author"), &schema).unwrap();
        assert_eq!(d.name, "authors");
        assert_eq!(d.fields.iter().filter(|f| f.is_primary_key).count(), 1);
        assert_eq!(d.primary_key().name, "id");
        assert_eq!(d.field_names(), vec!["id", "name", "email", "active"]);
        assert_eq!(d.form_field_names(), vec!["name", "email", "active"]);
        assert!(d.field("email").unwrap().nullable);
    }

    #[test]
    fn text_keys_stay_on_the_add_form() {
        let schema = Schema::Table(TableDef {
            name: "tags",
            columns: vec![
                ColumnDef::new("slug", ColumnKind::Text).primary_key(),
                ColumnDef::new("label", ColumnKind::Text),
            ],
        });
        let d = ModelDescriptor::derive(handle("Tag"), &schema).unwrap();
        assert!(!d.primary_key().nullable);
        assert!(!d.primary_key().is_generated_key());
        assert_eq!(d.form_field_names(), vec!["slug", "label"]);
    }

    #[test]
    fn mapped_shape_falls_back_to_lowercase_type_name() {
        let schema = Schema::Mapped(MappedDef {
            table_name: None,
            columns: author_columns(),
        });
        let d = ModelDescriptor::derive(handle("BlogAuthor"), &schema).unwrap();
        assert_eq!(d.name, "blogauthor");
    }

    #[test]
    fn rejects_missing_and_multiple_primary_keys() {
        let none = Schema::Mapped(MappedDef {
            table_name: Some("t"),
            columns: vec![ColumnDef::new("a", ColumnKind::Text)],
        });
        assert!(matches!(
            ModelDescriptor::derive(handle("T"), &none),
            Err(DiscoveryError::Classification { .. })
        ));

        let two = Schema::Mapped(MappedDef {
            table_name: Some("t"),
            columns: vec![
                ColumnDef::new("a", ColumnKind::Integer).primary_key(),
                ColumnDef::new("b", ColumnKind::Integer).primary_key(),
            ],
        });
        let err = ModelDescriptor::derive(handle("T"), &two).unwrap_err();
        assert!(err.to_string().contains("2 primary keys"));
    }

    #[test]
    fn rejects_bad_identifiers_and_duplicates() {
        let bad = Schema::Table(TableDef {
            name: "drop table;",
            columns: author_columns(),
        });
        assert!(ModelDescriptor::derive(handle("T"), &bad).is_err());

        let dup = Schema::Table(TableDef {
            name: "t",
            columns: vec![
                ColumnDef::new("id", ColumnKind::Integer).primary_key(),
                ColumnDef::new("id", ColumnKind::Text),
            ],
        });
        assert!(ModelDescriptor::derive(handle("T"), &dup).is_err());
    }

    #[test]
    fn assign_normalises_and_coerces() {
        let schema = Schema::Table(TableDef {
            name: "authors",
            columns: author_columns(),
        });
        let d = ModelDescriptor::derive(handle("Author"), &schema).unwrap();
        let input = json!({"name": "Alice", "email": "", "active": "off", "bogus": 1});
        let out = d.assign(input.as_object().unwrap()).unwrap();
        assert_eq!(out.get("name"), Some(&json!("Alice")));
        assert_eq!(out.get("email"), Some(&Value::Null));
        assert_eq!(out.get("active"), Some(&json!(false)));
        assert!(!out.contains_key("bogus"));
    }

    #[test]
    fn coercion_failures_name_the_field() {
        let f = FieldDescriptor {
            name: "age".into(),
            is_primary_key: false,
            nullable: false,
            kind: ColumnKind::Integer,
            unique: false,
            sensitive: false,
            default: None,
            default_now: false,
        };
        match f.coerce(json!("twelve")) {
            Err(AppError::InvalidValue { field, .. }) => assert_eq!(field, "age"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(f.coerce(json!(" 12 ")).unwrap(), json!(12));
        assert!(matches!(f.coerce_path("x"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn timestamps_normalise_to_rfc3339() {
        let f = FieldDescriptor {
            name: "at".into(),
            is_primary_key: false,
            nullable: true,
            kind: ColumnKind::Timestamp,
            unique: false,
            sensitive: false,
            default: None,
            default_now: false,
        };
        assert_eq!(
            f.coerce(json!("2024-05-01T10:30")).unwrap(),
            json!("2024-05-01T10:30:00+00:00")
        );
    }
}
