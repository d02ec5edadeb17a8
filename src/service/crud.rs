//! Generic CRUD execution against SQLite, driven only by a model descriptor.

use crate::error::AppError;
use crate::model::{ColumnKind, FieldDescriptor, ModelDescriptor};
use crate::sql::{delete, insert, select_by_key, select_list, update, QueryBuf, SqliteBindValue};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// One stored row of some model, fields in declaration order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: Map<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Value of the model's primary key.
    pub fn key(&self, model: &ModelDescriptor) -> Value {
        self.values
            .get(&model.primary_key().name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Fields safe to show on read surfaces (sensitive fields removed).
    pub fn public_view(&self, model: &ModelDescriptor) -> Map<String, Value> {
        self.values
            .iter()
            .filter(|(k, _)| model.field(k).map(|f| !f.sensitive).unwrap_or(false))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

pub struct ModelAdapter;

impl ModelAdapter {
    /// Page of rows in storage order. Limit defaults to 100, max 1000; offset defaults to 0.
    pub async fn list(
        pool: &SqlitePool,
        model: &ModelDescriptor,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<Record>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = offset.unwrap_or(0);
        let q = select_list(model, limit, offset);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        let rows = query.fetch_all(pool).await?;
        Ok(rows.iter().map(|r| row_to_record(r, model)).collect())
    }

    /// Fetch one row by primary key. Absent is `Ok(None)`.
    pub async fn get_by_key(
        pool: &SqlitePool,
        model: &ModelDescriptor,
        key: &Value,
    ) -> Result<Option<Record>, AppError> {
        let q = select_by_key(model, key);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        let row = query.fetch_optional(pool).await?;
        Ok(row.map(|r| row_to_record(&r, model)))
    }

    /// Insert one row from raw field values. Returns the stored row.
    pub async fn create(
        pool: &SqlitePool,
        model: &ModelDescriptor,
        values: &Map<String, Value>,
    ) -> Result<Record, AppError> {
        let assigned = model.assign(values)?;
        let q = insert(model, &assigned);
        let mut tx = pool.begin().await?;
        let row = Self::execute_returning_one_tx(&mut tx, &q, model).await?;
        tx.commit().await?;
        row.ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Overwrite only the supplied fields of `instance`. Returns the stored row.
    pub async fn update(
        pool: &SqlitePool,
        model: &ModelDescriptor,
        instance: &Record,
        values: &Map<String, Value>,
    ) -> Result<Record, AppError> {
        let assigned = model.assign(values)?;
        let q = update(model, &instance.key(model), &assigned);
        let mut tx = pool.begin().await?;
        let row = Self::execute_returning_one_tx(&mut tx, &q, model).await?;
        tx.commit().await?;
        row.ok_or_else(|| AppError::RecordNotFound {
            model: model.name.clone(),
        })
    }

    /// Delete `instance`, which the caller fetched in this request.
    pub async fn delete(
        pool: &SqlitePool,
        model: &ModelDescriptor,
        instance: &Record,
    ) -> Result<(), AppError> {
        let q = delete(model, &instance.key(model));
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        let mut tx = pool.begin().await?;
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        query.execute(&mut *tx).await.map_err(write_error)?;
        tx.commit().await?;
        Ok(())
    }

    async fn execute_returning_one_tx(
        tx: &mut SqliteConnection,
        q: &QueryBuf,
        model: &ModelDescriptor,
    ) -> Result<Option<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        let row = query.fetch_optional(&mut *tx).await.map_err(write_error)?;
        Ok(row.map(|r| row_to_record(&r, model)))
    }
}

/// Store rejections of a write become `ConstraintViolation`; anything else stays a db error.
fn write_error(e: sqlx::Error) -> AppError {
    use sqlx::error::ErrorKind;
    if let sqlx::Error::Database(db) = &e {
        if matches!(
            db.kind(),
            ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
        ) {
            return AppError::ConstraintViolation(db.message().to_string());
        }
    }
    AppError::Db(e)
}

fn row_to_record(row: &SqliteRow, model: &ModelDescriptor) -> Record {
    let values = model
        .fields
        .iter()
        .map(|f| (f.name.clone(), cell_to_value(row, f)))
        .collect();
    Record { values }
}

/// Decode by declared kind first, then fall back to whatever the cell actually holds.
fn cell_to_value(row: &SqliteRow, field: &FieldDescriptor) -> Value {
    let name = field.name.as_str();
    let declared = match field.kind {
        ColumnKind::Integer => row
            .try_get::<Option<i64>, _>(name)
            .ok()
            .map(|v| v.map(Value::from)),
        ColumnKind::Float => row
            .try_get::<Option<f64>, _>(name)
            .ok()
            .map(|v| v.and_then(serde_json::Number::from_f64).map(Value::Number)),
        ColumnKind::Boolean => row
            .try_get::<Option<bool>, _>(name)
            .ok()
            .map(|v| v.map(Value::Bool)),
        ColumnKind::Text | ColumnKind::Timestamp | ColumnKind::Uuid => row
            .try_get::<Option<String>, _>(name)
            .ok()
            .map(|v| v.map(Value::String)),
    };
    if let Some(v) = declared {
        return v.unwrap_or(Value::Null);
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return match field.kind {
            ColumnKind::Float => serde_json::Number::from_f64(n as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ColumnKind::Boolean => Value::Bool(n != 0),
            ColumnKind::Integer => Value::from(n),
            _ => Value::String(n.to_string()),
        };
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        return match field.kind {
            ColumnKind::Text | ColumnKind::Timestamp | ColumnKind::Uuid => Value::String(n.to_string()),
            _ => serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
        };
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    Value::Null
}
