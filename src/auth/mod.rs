//! Authentication: secret hashing, the user contract, and the cookie session.

pub mod hasher;
pub mod session;
pub mod user;

pub use hasher::{PasswordHasher, SaltedSha256Hasher, DEFAULT_ROUNDS};
pub use session::{Authenticator, SESSION_USER_KEY};
pub use user::{AdminUser, Identity, NewUser, SqliteUserStore, User, UserStore};
