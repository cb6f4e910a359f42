use std::collections::BTreeMap;
use std::path::Path;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{DashError, Result};

// ---------------------------------------------------------------------------
// Credential store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Argon2 PHC string, e.g. `$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialStore {
    pub usernames: BTreeMap<String, CredentialEntry>,
}

/// Load and sanity-check the credential store. Any problem here is a
/// configuration error and must stop the program before the dashboard runs.
pub fn load_credentials(path: &Path) -> Result<CredentialStore> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DashError::Config(format!("cannot read credential store {}: {e}", path.display()))
    })?;
    let store: CredentialStore = serde_json::from_str(&content).map_err(|e| {
        DashError::Config(format!("malformed credential store {}: {e}", path.display()))
    })?;
    for (user, entry) in &store.usernames {
        if let Err(e) = PasswordHash::new(&entry.password) {
            return Err(DashError::Config(format!(
                "password for '{user}' is not a valid password hash: {e}"
            )));
        }
    }
    Ok(store)
}

pub fn save_credentials(path: &Path, store: &CredentialStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(store)?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

/// Hash a password into an Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DashError::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC string. An unparseable hash never
/// verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Session gate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Granted(Identity),
    Denied,
    Pending,
}

impl Verdict {
    /// Fixed message shown instead of the dashboard.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Granted(_) => None,
            Self::Denied => Some("Username/password is incorrect"),
            Self::Pending => Some("Please enter your username and password"),
        }
    }
}

pub trait SessionGate {
    fn login(&mut self) -> Verdict;
}

/// Username and password as typed. The password is wiped on drop.
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

pub struct CredentialGate {
    store: CredentialStore,
    submitted: Option<Credentials>,
}

impl CredentialGate {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store,
            submitted: None,
        }
    }

    pub fn submit(&mut self, username: &str, password: &str) {
        self.submitted = Some(Credentials {
            username: username.trim().to_string(),
            password: password.to_string(),
        });
    }

    pub fn clear(&mut self) {
        self.submitted = None;
    }
}

impl SessionGate for CredentialGate {
    fn login(&mut self) -> Verdict {
        let Some(creds) = &self.submitted else {
            return Verdict::Pending;
        };
        if creds.username.is_empty() && creds.password.is_empty() {
            return Verdict::Pending;
        }
        match self.store.usernames.get(&creds.username) {
            Some(entry) if verify_password(&creds.password, &entry.password) => {
                log::info!("login granted for '{}'", creds.username);
                Verdict::Granted(Identity {
                    username: creds.username.clone(),
                    name: entry.name.clone(),
                })
            }
            _ => {
                log::warn!("login denied for '{}'", creds.username);
                Verdict::Denied
            }
        }
    }
}

/// Gate for the no-auth variant: always granted.
pub struct OpenGate;

impl SessionGate for OpenGate {
    fn login(&mut self) -> Verdict {
        Verdict::Granted(Identity {
            username: "guest".to_string(),
            name: String::new(),
        })
    }
}
