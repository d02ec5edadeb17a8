//! ModelAdapter: generic CRUD using the safe SQL builder.

mod crud;
pub use crud::{ModelAdapter, Record, DEFAULT_LIMIT, MAX_LIMIT};
