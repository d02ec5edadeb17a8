//! autoadmin: an admin interface generated from entity declarations.
//!
//! Host types implement [`Entity`] and register with [`register_entity!`]. At startup the
//! scanner walks the configured module roots, derives a [`ModelDescriptor`] per entity and
//! freezes them into a [`Registry`]; the routers then serve list/add/edit/delete pages and a
//! read-only JSON API for every registered model behind a superuser session.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod render;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

#[doc(hidden)]
pub use inventory;

pub use auth::{AdminUser, Authenticator, Identity, PasswordHasher, SaltedSha256Hasher, SqliteUserStore, User, UserStore};
pub use bootstrap::create_superuser;
pub use config::{init_tracing, AdminConfig};
pub use error::{ApiError, AppError, BootstrapError, DiscoveryError};
pub use model::{
    ColumnDef, ColumnKind, Entity, MappedDef, ModelDescriptor, Registry, RegistryHandle, ScanReport,
    Scanner, Schema, TableDef,
};
pub use render::{JsonRenderer, Renderer};
pub use routes::admin_router;
pub use service::{ModelAdapter, Record};
pub use state::AppState;
pub use store::{connect, ensure_tables};
