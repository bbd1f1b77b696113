mod config;
mod contact;
mod dialer;
mod diff;
mod filter;
mod loader;
mod logging;
mod prefs;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use config::Config;
use dialer::{CommandDialer, Dialer};
use loader::Loader;
use prefs::{Preferences, SearchState};

#[derive(Parser, Debug)]
#[command(name = "rdial", version)]
struct Cli {
    /// Configuration file (defaults to the per-user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Contact list URL, overrides `source.url`
    #[arg(long, global = true)]
    url: Option<String>,

    /// Log file, overrides `log_file`
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Forget the saved search term before starting
    #[arg(long, default_value_t = false)]
    reset_search: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the contact list once and print the matching contacts
    Query(QueryArgs),
    /// Open the dialer for a phone number
    Dial(DialArgs),
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Name filter; the saved search term is used when omitted
    query: Option<String>,
}

#[derive(Args, Debug)]
struct DialArgs {
    phone: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.source.url = url;
    }

    let log_path = match cli.log_file.or_else(|| config.log_file.clone()) {
        Some(path) => path,
        None => logging::default_log_path()?,
    };
    logging::init_tracing(&log_path)?;

    if let Some(command) = cli.command {
        match command {
            Command::Query(args) => {
                handle_query(args, &config)?;
                return Ok(());
            }
            Command::Dial(args) => {
                dial_command(&config).dial(&args.phone)?;
                return Ok(());
            }
        }
    }

    let search_state = SearchState::new(Preferences::open_default()?);
    if cli.reset_search {
        search_state.clear()?;
    }

    info!(url = %config.source.url, config = ?config.config_path, "starting");
    let dialer = dial_command(&config).quiet();
    let mut app = ui::app::App::new(&config, &search_state, &dialer)?;
    app.attach_loader(Loader::spawn(config.source.to_source()));
    app.run()?;

    Ok(())
}

fn dial_command(config: &Config) -> CommandDialer {
    let command = config
        .commands
        .dial
        .clone()
        .unwrap_or_else(dialer::default_command);
    CommandDialer::new(command)
}

fn handle_query(args: QueryArgs, config: &Config) -> Result<()> {
    let query = match args.query {
        Some(query) => query,
        None => SearchState::new(Preferences::open_default()?).load()?,
    };

    let contacts = loader::load(&config.source.to_source())
        .with_context(|| format!("failed to load contacts from {}", config.source.url))?;
    let matches = filter::filter(&contacts, &query);

    eprintln!(
        "{} of {} contact(s) match \"{}\"",
        matches.len(),
        contacts.len(),
        query
    );

    // name<TAB>phone<TAB>type
    for contact in matches.iter() {
        println!("{}\t{}\t{}", contact.name, contact.phone, contact.kind);
    }

    Ok(())
}
