// postwire - headless progressive-enhancement layer for a server-rendered social app
//
// Loads a page, binds the same handlers its enhancement script would (ajax
// forms, comment forms, like, delete, follow, search), and replays user
// interactions against the live backend, patching the in-memory document
// with the returned fragments and fields.
//
// Architecture:
// - dom: arena document, HTML parser, selector engine, form controls
// - request: the single fetch-and-validate helper plus the reqwest transport
// - binder: bound sets and the delegated click table
// - handlers: one binder and one handler per interaction
// - session: bootstrap and event dispatch
// - demo: in-memory axum backend and a scripted session against it

mod binder;
mod cli;
mod config;
mod demo;
mod dom;
mod handlers;
mod logging;
mod markup;
mod request;
mod session;
mod ui;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config commands run before logging and never touch the network
    if cli::handle_config_command(&cli.command) {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env();
    if cli.yes {
        config.assume_yes = true;
    }

    // Guard must outlive every log call so the file writer flushes
    let _file_guard = logging::init(&config);

    tracing::debug!("Base URL: {}", config.base_url);
    let result = cli::run(cli, config).await;
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}
