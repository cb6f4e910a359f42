mod aggregate;
mod auth;
mod cli;
mod editor;
mod error;
mod export;
mod filter;
mod fmt;
mod fragment;
mod models;
mod reconciler;
mod schema;
mod seed;
mod session;
mod settings;
mod store;
mod tui;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let credentials = cli.credentials.as_deref();

    let result = match cli.command {
        None => cli::dashboard::run(cli.no_auth, credentials, None),
        Some(Commands::Dashboard { seed }) => cli::dashboard::run(cli.no_auth, credentials, seed),
        Some(Commands::Summary { filters, user }) => {
            cli::summary::run(cli.no_auth, credentials, user.as_deref(), &filters)
        }
        Some(Commands::Export {
            filters,
            user,
            output,
        }) => cli::export::run(cli.no_auth, credentials, user.as_deref(), &filters, output),
        Some(Commands::HashPassword { passwords }) => cli::hash::run(&passwords),
        Some(Commands::Init { force }) => cli::init::run(force),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "salesdash", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
