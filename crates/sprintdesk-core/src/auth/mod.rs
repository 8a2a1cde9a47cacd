//! Authentication module for managing the session credential and gating
//! protected screens.
//!
//! This module provides:
//! - `CredentialStore`: the single owner of the access/refresh credential,
//!   persisted to disk with change subscriptions
//! - `SessionContext`: validity checks, login/logout and deduplicated refresh
//! - `Authenticated`: the route guard wrapped around protected screens
//! - `Keychain`: OS-level password storage via keyring

pub mod clock;
pub mod credential;
pub mod guard;
pub mod keychain;
pub mod session;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::{is_valid, Credential, LoginResponse};
pub use guard::{Access, Authenticated};
pub use keychain::{Keychain, RememberAction};
pub use session::SessionContext;
pub use store::{CredentialEvent, CredentialStore, Subscription, CREDENTIAL_FILE};
