mod render;
mod repl;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use deck_audio::{AudioOutput, NullAudioOutput};
use deck_core::{
    init_logging, AppDirs, Catalog, Config, CredentialStore, MemoryCatalog, RequestedPage,
};
use deck_session::{Command as SessionCommand, CommandOutcome, Session, SessionSettings};
use repl::{parse_line, ParseError, ReplCommand};
use spotify_catalog::{SpotifyCatalog, SpotifyConfig, CATALOG_ID};
use tokio::io::{AsyncBufReadExt, BufReader};

type DynSession = Session<Box<dyn AudioOutput>>;

#[derive(Debug, Parser)]
#[command(name = "deck", version, about = "Browse a music catalog and play track previews")]
struct Cli {
    /// Config file to use instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Use the bundled sample catalog instead of the network
    #[arg(long, global = true)]
    offline: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the popular tracks
    Popular,
    /// Print one page of search results
    Search {
        keyword: String,
        /// One-based page; anything that is not a positive number means page 1
        #[arg(long, default_value = "1")]
        page: String,
    },
    /// Interactive browsing loop on stdin
    Browse,
    /// Manage the catalog access token in the OS keyring
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(Debug, Subcommand)]
enum TokenCommand {
    /// Store an access token
    Set { token: String },
    /// Remove the stored access token
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_or_default(&dirs)?,
    };
    let _logging = init_logging(&config.logging, &dirs)?;
    tracing::info!(offline = cli.offline, "deck starting");

    match cli.command {
        Command::Token(command) => run_token(command),
        Command::Popular => {
            let mut session = build_session(&config, cli.offline)?;
            expect_done(session.execute(SessionCommand::LoadPopular).await)?;
            print!("{}", render::render(&session.view()));
            Ok(())
        }
        Command::Search { keyword, page } => {
            let mut session = build_session(&config, cli.offline)?;
            session.dispatch(SessionCommand::SetKeyword(keyword));
            let requested = RequestedPage::parse(&page);
            expect_done(session.execute(SessionCommand::Search(requested)).await)?;
            print!("{}", render::render(&session.view()));
            Ok(())
        }
        Command::Browse => {
            let session = build_session(&config, cli.offline)?;
            browse(session).await
        }
    }
}

fn run_token(command: TokenCommand) -> Result<()> {
    let store = CredentialStore::new();
    match command {
        TokenCommand::Set { token } => {
            store.store_access_token(CATALOG_ID, token.trim())?;
            println!("Access token stored for '{CATALOG_ID}'.");
        }
        TokenCommand::Clear => {
            store.clear_access_token(CATALOG_ID)?;
            println!("Access token cleared for '{CATALOG_ID}'.");
        }
    }
    Ok(())
}

fn build_session(config: &Config, offline: bool) -> Result<DynSession> {
    let catalog = build_catalog(config, offline)?;
    tracing::info!(catalog = catalog.id(), "catalog ready");
    Ok(Session::new(
        catalog,
        build_output(),
        SessionSettings::from(&config.search),
    ))
}

fn build_catalog(config: &Config, offline: bool) -> Result<Arc<dyn Catalog>> {
    if offline {
        return Ok(Arc::new(MemoryCatalog::sample()));
    }
    let token = CredentialStore::new()
        .resolve_access_token(CATALOG_ID, config.catalog.access_token.as_deref());
    if token.is_none() {
        tracing::warn!("no access token configured; requests will be anonymous");
    }
    let catalog = SpotifyCatalog::new(SpotifyConfig::from_catalog_config(&config.catalog, token))?;
    Ok(Arc::new(catalog))
}

#[cfg(feature = "cpal-backend")]
fn build_output() -> Box<dyn AudioOutput> {
    match deck_audio::CpalAudioOutput::new() {
        Ok(output) => Box::new(output),
        Err(err) => {
            tracing::warn!(error = %err, "audio device unavailable, previews will be silent");
            Box::new(NullAudioOutput::new())
        }
    }
}

#[cfg(not(feature = "cpal-backend"))]
fn build_output() -> Box<dyn AudioOutput> {
    Box::new(NullAudioOutput::new())
}

fn expect_done(outcome: CommandOutcome) -> Result<()> {
    match outcome {
        CommandOutcome::Done => Ok(()),
        CommandOutcome::Failed(err) => Err(err.into()),
        CommandOutcome::Rejected(reason) => bail!("{reason}"),
        CommandOutcome::Pending(id) => bail!("{id} did not resolve"),
    }
}

/// Map a prompt command onto session commands. `None` for commands that
/// only affect the prompt itself.
fn session_commands(command: &ReplCommand, session: &DynSession) -> Option<Vec<SessionCommand>> {
    let commands = match command {
        ReplCommand::Search(keyword) => vec![
            SessionCommand::SetKeyword(keyword.clone()),
            SessionCommand::SubmitSearch,
        ],
        ReplCommand::Keyword(text) => vec![SessionCommand::SetKeyword(text.clone())],
        ReplCommand::Next => vec![SessionCommand::NextPage],
        ReplCommand::Prev => vec![SessionCommand::PrevPage],
        ReplCommand::Goto(page) => vec![SessionCommand::Search(*page)],
        ReplCommand::Play(index) => {
            let track = session.displayed().get(index - 1)?;
            vec![SessionCommand::SelectDisplayed(track.id.clone())]
        }
        ReplCommand::Toggle => vec![SessionCommand::Toggle],
        ReplCommand::Clear => vec![SessionCommand::ClearSearch],
        ReplCommand::List | ReplCommand::Help | ReplCommand::Quit => return None,
    };
    Some(commands)
}

async fn browse(mut session: DynSession) -> Result<()> {
    session.execute(SessionCommand::LoadPopular).await;
    print!("{}", render::render(&session.view()));
    println!("{}", repl::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match command {
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                println!("{}", repl::HELP);
                continue;
            }
            _ => {}
        }
        match session_commands(&command, &session) {
            Some(commands) => {
                for command in commands {
                    session.execute(command).await;
                }
            }
            None if matches!(command, ReplCommand::Play(_)) => {
                println!("no track at that position");
                continue;
            }
            None => {}
        }
        print!("{}", render::render(&session.view()));
    }
    tracing::info!("browse loop finished");
    Ok(())
}
