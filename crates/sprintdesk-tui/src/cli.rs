//! Non-interactive entry points: `--login` and `--logout`.

use std::io::{self, Write};

use anyhow::Result;
use tracing::warn;

use sprintdesk_core::auth::{Keychain, SessionContext};
use sprintdesk_core::config::SharedConfig;

/// Prompt for credentials on the terminal and start a session.
pub async fn login_interactive(session: &SessionContext, config: &SharedConfig) -> Result<()> {
    println!("\n=== sprintdesk login ===\n");

    let last_username = config
        .lock()
        .map(|c| c.last_username.clone())
        .unwrap_or_default();

    let username = match last_username {
        Some(ref last_user) => {
            let input = prompt(&format!("Username [{}]: ", last_user))?;
            if input.is_empty() {
                last_user.clone()
            } else {
                input
            }
        }
        None => prompt("Username: ")?,
    };

    let stored = match Keychain::get_password(&username)? {
        Some(stored) => {
            let answer = prompt("Use stored password? [Y/n]: ")?;
            (answer.to_lowercase() != "n").then_some(stored)
        }
        None => None,
    };
    let password = match stored {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };

    println!("\nAuthenticating...");
    session
        .authenticate(&username, &password)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if let Err(e) = Keychain::store(&username, &password) {
        warn!(error = %e, "Could not store password in keychain");
    }
    if let Ok(mut config) = config.lock() {
        config.last_username = Some(username);
        config.remember_password = true;
        config.save()?;
    }

    println!("Login successful!\n");
    Ok(())
}

pub fn logout(session: &SessionContext) {
    if session.has_credential() {
        session.logout();
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
