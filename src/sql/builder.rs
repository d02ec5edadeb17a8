//! Builds parameterized INSERT, SELECT, UPDATE, DELETE and CREATE TABLE from a descriptor.

use crate::model::ModelDescriptor;
use serde_json::{Map, Value};

/// Quote identifier for SQLite (names are validated during derivation).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }
}

fn select_column_list(model: &ModelDescriptor) -> String {
    model
        .fields
        .iter()
        .map(|f| quoted(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT page in storage order. Params: limit, offset.
pub fn select_list(model: &ModelDescriptor, limit: u32, offset: u32) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} LIMIT ? OFFSET ?",
        select_column_list(model),
        quoted(&model.name)
    );
    q.params.push(Value::Number(limit.into()));
    q.params.push(Value::Number(offset.into()));
    q
}

/// SELECT by primary key.
pub fn select_by_key(model: &ModelDescriptor, key: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ?",
        select_column_list(model),
        quoted(&model.name),
        quoted(&model.primary_key().name)
    );
    q.params.push(key.clone());
    q
}

/// INSERT in declaration order. Fields absent from `values` take the declared or
/// computed default, or are left out so the store applies its own.
pub fn insert(model: &ModelDescriptor, values: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    for f in &model.fields {
        let value = match values.get(&f.name) {
            Some(v) => v.clone(),
            None => match f.default_for_insert() {
                Some(d) => d,
                None => continue,
            },
        };
        cols.push(quoted(&f.name));
        q.params.push(value);
    }
    let returning = select_column_list(model);
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(&model.name),
            returning
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(&model.name),
            cols.join(", "),
            vec!["?"; cols.len()].join(", "),
            returning
        )
    };
    q
}

/// UPDATE by key: SET only the supplied fields, never the primary key.
/// With nothing to set this degrades to a SELECT of the current row.
pub fn update(model: &ModelDescriptor, key: &Value, values: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = &model.primary_key().name;
    let mut sets = Vec::new();
    for f in &model.fields {
        if f.name == *pk {
            continue;
        }
        let Some(v) = values.get(&f.name) else { continue };
        sets.push(format!("{} = ?", quoted(&f.name)));
        q.params.push(v.clone());
    }
    if sets.is_empty() {
        return select_by_key(model, key);
    }
    q.params.push(key.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ? RETURNING {}",
        quoted(&model.name),
        sets.join(", "),
        quoted(pk),
        select_column_list(model)
    );
    q
}

/// DELETE by key.
pub fn delete(model: &ModelDescriptor, key: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        quoted(&model.name),
        quoted(&model.primary_key().name)
    );
    q.params.push(key.clone());
    q
}

/// CREATE TABLE IF NOT EXISTS from the descriptor. Integer keys alias the rowid;
/// any other key kind is declared NOT NULL, which SQLite does not imply.
pub fn create_table(model: &ModelDescriptor) -> String {
    let cols: Vec<String> = model
        .fields
        .iter()
        .map(|f| {
            let mut def = format!("{} {}", quoted(&f.name), f.kind.sql_type());
            if f.is_generated_key() {
                def.push_str(" PRIMARY KEY AUTOINCREMENT");
            } else if f.is_primary_key {
                def.push_str(" NOT NULL PRIMARY KEY");
            } else if !f.nullable {
                def.push_str(" NOT NULL");
            }
            if f.unique && !f.is_primary_key {
                def.push_str(" UNIQUE");
            }
            if let Some(d) = f.default.as_ref().and_then(default_literal) {
                def.push_str(" DEFAULT ");
                def.push_str(&d);
            }
            def
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quoted(&model.name),
        cols.join(", ")
    )
}

fn default_literal(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
        other => Some(format!("'{}'", other.to_string().replace('\'', "''"))),
    }
}
