use std::collections::BTreeMap;
use std::path::Path;

use crate::auth::{hash_password, save_credentials, CredentialEntry, CredentialStore};
use crate::error::Result;
use crate::settings::{config_dir, load_settings, save_settings, settings_file_exists};

/// Example users written into a fresh credential store.
const EXAMPLE_USERS: &[(&str, &str, &str, &str)] = &[
    ("jsmith", "John Smith", "jsmith@example.com", "user123"),
    ("rdoe", "Rebecca Doe", "rdoe@example.com", "password456"),
];

const SAMPLE_FRAGMENT: &str = "<h3>Regional notes</h3>\n<p>Figures are refreshed on every \
interaction.</p>\n<ul>\n<li>North &amp; East: steady</li>\n<li>South: promo running</li>\n</ul>\n";

pub fn run(force: bool) -> Result<()> {
    let settings = if settings_file_exists() && !force {
        println!("Settings already exist in {}", config_dir().display());
        load_settings()
    } else {
        let settings = load_settings();
        save_settings(&settings)?;
        println!("Wrote settings to {}", config_dir().join("settings.json").display());
        settings
    };

    let creds = settings.credentials_path();
    if creds.exists() && !force {
        println!("Credential store already exists at {}", creds.display());
    } else {
        save_credentials(&creds, &example_store()?)?;
        println!("Wrote credential store to {}", creds.display());
        for (user, _, _, password) in EXAMPLE_USERS {
            println!("  {user} / {password}");
        }
        println!("Change these with `salesdash hash-password`.");
    }

    let fragment = settings.fragment_path();
    if !fragment.exists() || force {
        write_fragment(&fragment)?;
        println!("Wrote sample fragment to {}", fragment.display());
    }
    Ok(())
}

fn example_store() -> Result<CredentialStore> {
    let mut usernames = BTreeMap::new();
    for (user, name, email, password) in EXAMPLE_USERS {
        usernames.insert(
            user.to_string(),
            CredentialEntry {
                name: name.to_string(),
                email: email.to_string(),
                password: hash_password(password)?,
            },
        );
    }
    Ok(CredentialStore { usernames })
}

fn write_fragment(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, SAMPLE_FRAGMENT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{load_credentials, verify_password};

    #[test]
    fn test_example_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        save_credentials(&path, &example_store().unwrap()).unwrap();

        let store = load_credentials(&path).unwrap();
        assert_eq!(store.usernames.len(), 2);
        let jsmith = &store.usernames["jsmith"];
        assert_eq!(jsmith.name, "John Smith");
        assert!(verify_password("user123", &jsmith.password));
        assert!(!verify_password("password456", &jsmith.password));
    }

    #[test]
    fn test_sample_fragment_renders() {
        let text = crate::fragment::html_to_text(SAMPLE_FRAGMENT).unwrap();
        assert!(text.contains("Regional notes"));
        assert!(text.contains("North & East: steady"));
    }
}
