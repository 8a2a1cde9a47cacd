use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

const SERVICE_NAME: &str = "sprintdesk";

/// What to do with the keychain entry after a successful login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RememberAction {
    Store,
    Forget,
    Leave,
}

impl RememberAction {
    /// `remember` is the choice on this login, `was_remembered` the saved one.
    pub fn for_login(remember: bool, was_remembered: bool) -> Self {
        match (remember, was_remembered) {
            (true, _) => RememberAction::Store,
            (false, true) => RememberAction::Forget,
            (false, false) => RememberAction::Leave,
        }
    }
}

/// Remembered passwords, kept in the OS keychain and never on disk.
///
/// A missing entry is not an error: lookups return `None` and deletes
/// succeed, so callers only see failures of the keychain itself.
pub struct Keychain;

impl Keychain {
    fn entry(username: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")
    }

    /// Store username and password in the OS keychain
    pub fn store(username: &str, password: &str) -> Result<()> {
        Self::entry(username)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    /// Remembered password for `username`, if there is one
    pub fn get_password(username: &str) -> Result<Option<String>> {
        match Self::entry(username)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve password from keychain"),
        }
    }

    /// Delete the stored password for a username, if any
    pub fn delete(username: &str) -> Result<()> {
        match Self::entry(username)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete password from keychain"),
        }
    }

    pub fn has_credentials(username: &str) -> bool {
        matches!(Self::get_password(username), Ok(Some(_)))
    }

    /// Bring the keychain in line with the remember-password choice.
    pub fn apply(action: RememberAction, username: &str, password: &str) -> Result<()> {
        debug!(?action, "Updating remembered password");
        match action {
            RememberAction::Store => Self::store(username, password),
            RememberAction::Forget => Self::delete(username),
            RememberAction::Leave => Ok(()),
        }
    }
}
