//! HTTP client for the PetKit vendor cloud API.
//!
//! [`PetkitClient`] is stateless apart from its connection pool. The login
//! state lives in an explicit [`Session`] owned by the caller and passed to
//! every call, so credential refresh is visible at the call site.
//! [`SessionScope`] binds the two together and implements the core
//! `DeviceDirectory` and `RosterSource` traits.

pub mod api;
pub mod directory;
pub mod error;
pub mod session;

pub use api::PetkitClient;
pub use directory::SessionScope;
pub use error::PetkitError;
pub use session::{AccessToken, Credentials, Session};
