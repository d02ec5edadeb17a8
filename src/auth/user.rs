//! User contract, the built-in `User` entity, and its SQLite-backed store.

use crate::error::AppError;
use crate::model::{ColumnDef, ColumnKind, Entity, MappedDef, ModelDescriptor, Schema};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// What the authenticator needs from any user representation.
pub trait AdminUser: Send + Sync + std::fmt::Debug {
    fn id(&self) -> i64;
    fn username(&self) -> &str;
    fn email(&self) -> &str;
    fn hashed_secret(&self) -> &str;
    fn is_superuser(&self) -> bool;
    fn is_active(&self) -> bool {
        true
    }
}

/// Server-trusted identity attached to a request. Carries no secret material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
}

impl Identity {
    pub fn from_user(user: &dyn AdminUser) -> Self {
        Identity {
            id: user.id(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            is_superuser: user.is_superuser(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_secret: String,
    pub is_superuser: bool,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Match on username or email.
    async fn find_by_login(&self, login: &str) -> Result<Option<Box<dyn AdminUser>>, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Box<dyn AdminUser>>, AppError>;
    async fn create(&self, user: NewUser) -> Result<Box<dyn AdminUser>, AppError>;
}

/// Default user row, stored in table `users`.
#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: String,
}

impl Entity for User {
    fn schema() -> Schema {
        Schema::Mapped(MappedDef {
            table_name: Some("users"),
            columns: vec![
                ColumnDef::new("id", ColumnKind::Integer).primary_key(),
                ColumnDef::new("username", ColumnKind::Text).unique(),
                ColumnDef::new("email", ColumnKind::Text).unique(),
                ColumnDef::new("hashed_password", ColumnKind::Text).sensitive(),
                ColumnDef::new("is_active", ColumnKind::Boolean).default_value(true),
                ColumnDef::new("is_superuser", ColumnKind::Boolean).default_value(false),
                ColumnDef::new("created_at", ColumnKind::Timestamp).default_now(),
            ],
        })
    }
}

crate::register_entity!(User);

impl AdminUser for User {
    fn id(&self) -> i64 {
        self.id
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn hashed_secret(&self) -> &str {
        &self.hashed_password
    }

    fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

const USER_COLUMNS: &str =
    r#""id", "username", "email", "hashed_password", "is_active", "is_superuser", "created_at""#;

#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteUserStore {
            pool,
            table: "\"users\"".into(),
        }
    }

    /// Descriptor of the built-in `User` entity.
    pub fn descriptor() -> ModelDescriptor {
        ModelDescriptor::of::<User>("User").expect("static User schema")
    }

    /// Create the `users` table if missing.
    pub async fn init_schema(&self) -> Result<(), AppError> {
        crate::store::ensure_table(&self.pool, &Self::descriptor()).await
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<Box<dyn AdminUser>>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE username = ? OR email = ? LIMIT 1",
            USER_COLUMNS, self.table
        );
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(login)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user.map(|u| Box::new(u) as Box<dyn AdminUser>))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Box<dyn AdminUser>>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", USER_COLUMNS, self.table);
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user.map(|u| Box::new(u) as Box<dyn AdminUser>))
    }

    async fn create(&self, user: NewUser) -> Result<Box<dyn AdminUser>, AppError> {
        let sql = format!(
            r#"INSERT INTO {} ("username", "email", "hashed_password", "is_active", "is_superuser", "created_at")
               VALUES (?, ?, ?, 1, ?, ?) RETURNING {}"#,
            self.table, USER_COLUMNS
        );
        let created: User = sqlx::query_as(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.hashed_secret)
            .bind(user.is_superuser)
            .bind(chrono::Utc::now().to_rfc3339())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::ConstraintViolation(db.message().to_string())
                }
                _ => AppError::Db(e),
            })?;
        Ok(Box::new(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::create_table;

    #[test]
    fn user_descriptor_hides_the_hash() {
        let d = SqliteUserStore::descriptor();
        assert_eq!(d.name, "users");
        assert_eq!(d.primary_key().name, "id");
        assert!(d.field("hashed_password").unwrap().sensitive);
        assert!(!d.field("username").unwrap().sensitive);
    }

    #[test]
    fn user_table_ddl() {
        let ddl = create_table(&SqliteUserStore::descriptor());
        assert!(ddl.starts_with(r#"CREATE TABLE IF NOT EXISTS "users" ("id" INTEGER PRIMARY KEY AUTOINCREMENT"#));
        assert!(ddl.contains(r#""username" TEXT NOT NULL UNIQUE"#));
        assert!(ddl.contains(r#""is_active" BOOLEAN NOT NULL DEFAULT 1"#));
        assert!(ddl.ends_with(r#""created_at" TEXT NOT NULL)"#));
    }
}
