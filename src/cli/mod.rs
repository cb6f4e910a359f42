pub mod dashboard;
pub mod export;
pub mod grid;
pub mod hash;
pub mod init;
pub mod login;
pub mod summary;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use zeroize::Zeroize;

use crate::auth::{load_credentials, CredentialGate, OpenGate};
use crate::error::Result;
use crate::filter::StatusFilter;
use crate::models::Dataset;
use crate::seed::generate_dataset;
use crate::session::{Command, Session, SessionOptions};
use crate::settings::{expand_path, load_settings, Settings};

/// Environment variable read instead of prompting for a password.
pub const PASSWORD_ENV: &str = "SALESDASH_PASSWORD";

#[derive(Parser)]
#[command(name = "salesdash", about = "Sales-reporting dashboard for the terminal.")]
pub struct Cli {
    /// Skip the login gate (adds the product filter).
    #[arg(long = "no-auth", global = true)]
    pub no_auth: bool,
    /// Credential store to check logins against (default from settings)
    #[arg(long, global = true)]
    pub credentials: Option<String>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard (the default).
    Dashboard {
        /// Seed for the synthetic dataset
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print KPIs, top products and the status distribution.
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
        /// Username to log in as
        #[arg(long)]
        user: Option<String>,
    },
    /// Export the filtered view to CSV.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Username to log in as
        #[arg(long)]
        user: Option<String>,
        /// Output file path (default: <export_dir>/sales_dashboard_export.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Hash passwords for the credential store.
    HashPassword {
        /// Plaintext passwords to hash
        #[arg(required = true)]
        passwords: Vec<String>,
    },
    /// Write default settings and a credential store template.
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Region to include, repeatable (default: every region)
    #[arg(long = "region")]
    pub regions: Vec<String>,
    /// Exclude every region
    #[arg(long = "no-regions", conflicts_with = "regions")]
    pub no_regions: bool,
    /// Product to include, repeatable; needs --no-auth (default: every product)
    #[arg(long = "product")]
    pub products: Vec<String>,
    /// Order status: All, Completed, Pending or Cancelled
    #[arg(long, default_value = "All")]
    pub status: String,
    /// Seed for the synthetic dataset
    #[arg(long)]
    pub seed: Option<u64>,
}

impl FilterArgs {
    /// Selection commands to replay on a fresh session.
    pub(crate) fn commands(&self) -> Result<Vec<Command>> {
        let mut cmds = Vec::new();
        if self.no_regions {
            cmds.push(Command::SetRegions(Vec::new()));
        } else if !self.regions.is_empty() {
            cmds.push(Command::SetRegions(self.regions.clone()));
        }
        if !self.products.is_empty() {
            cmds.push(Command::SetProducts(self.products.clone()));
        }
        cmds.push(Command::SetStatus(self.status.parse::<StatusFilter>()?));
        Ok(cmds)
    }
}

pub(crate) fn session_options(settings: &Settings, no_auth: bool) -> SessionOptions {
    SessionOptions {
        product_filter: no_auth,
        show_editor: settings.show_editor,
        accent_color: settings.accent_color.clone(),
        top_n: settings.top_n,
    }
}

pub(crate) fn seed_fn(seed: Option<u64>) -> impl FnOnce() -> Dataset {
    move || match seed {
        Some(s) => generate_dataset(&mut StdRng::seed_from_u64(s)),
        None => generate_dataset(&mut rand::thread_rng()),
    }
}

/// The `--credentials` flag wins over the settings file.
pub(crate) fn credentials_path(settings: &Settings, flag: Option<&str>) -> PathBuf {
    flag.map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| settings.credentials_path())
}

fn read_password() -> Result<String> {
    match std::env::var(PASSWORD_ENV) {
        Ok(pw) => Ok(pw),
        Err(_) => Ok(rpassword::prompt_password("Password: ")?),
    }
}

/// Start a session for a non-interactive command. Loading the credential
/// store happens first so a broken store stops everything.
pub(crate) fn cli_session(
    no_auth: bool,
    credentials: Option<&str>,
    user: Option<&str>,
    seed: Option<u64>,
) -> Result<Session> {
    let settings = load_settings();
    let options = session_options(&settings, no_auth);
    if no_auth {
        return Session::begin(&mut OpenGate, options, seed_fn(seed));
    }

    let mut gate = CredentialGate::new(load_credentials(&credentials_path(&settings, credentials))?);
    if let Some(user) = user {
        let mut password = read_password()?;
        gate.submit(user, &password);
        password.zeroize();
    }
    Session::begin(&mut gate, options, seed_fn(seed))
}
