use std::path::PathBuf;

use super::{cli_session, FilterArgs};
use crate::error::Result;
use crate::export::{export_csv, write_export};
use crate::settings::{expand_path, load_settings};

pub fn run(
    no_auth: bool,
    credentials: Option<&str>,
    user: Option<&str>,
    filters: &FilterArgs,
    output: Option<String>,
) -> Result<()> {
    let mut session = cli_session(no_auth, credentials, user, filters.seed)?;
    for cmd in filters.commands()? {
        session.dispatch(cmd)?;
    }
    let frame = session.run_pass()?;
    if frame.view.is_empty() {
        log::warn!("no rows match the current filters; writing the header only");
    }
    let bytes = export_csv(&frame.view)?;

    let path = output
        .map(|p| PathBuf::from(expand_path(&p)))
        .unwrap_or_else(|| load_settings().export_path());
    let written = write_export(&bytes, &path)?;
    println!("Wrote {} rows to {}", frame.view.len(), written.display());
    session.end();
    Ok(())
}
