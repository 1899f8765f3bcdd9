//! # Authentication Module
//!
//! Credential decoding, the two storage tiers, inactivity tracking and the
//! session manager that ties them to the HTTP pipeline.

pub mod credential;
pub mod inactivity;
pub mod models;
pub mod session;
pub mod store;

pub use credential::{Claims, Credential};
pub use inactivity::{ActivityEvent, ActivitySource, InactivityTimer};
pub use models::{Address, Role, UserProfile};
pub use session::{SessionEnd, SessionManager, SessionPhase, SessionState, WeakSessionManager};
pub use store::{CredentialVault, FileStore, MemoryStore, SessionStore, Tier, TokenStore};
