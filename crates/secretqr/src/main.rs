//! `secretqr` - CLI for secretqr
//!
//! This binary stores messages, prints their share links and QR codes, reads
//! them back, and runs the web interface.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::warn;

use secretqr::cli::{Cli, Command, ConfigCommand, GetCommand, SendCommand, StoreCommand};
use secretqr::config::{is_valid_hostname, StoreBackend};
use secretqr::{
    init_logging, store, web, Composer, Config, MessageId, MessageStore, Resolver, ShareDomain,
    Storage, SystemClipboard, ViewState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::Send(cmd) => handle_send(&config, cmd).await,
        Command::Get(cmd) => handle_get(&config, cmd).await,
        Command::Serve(cmd) => {
            let mut config = config;
            if let Some(bind) = cmd.bind {
                config.server.bind = bind;
                config.validate()?;
            }
            let store = store::open(&config)?;
            web::serve(&config, store).await?;
            Ok(())
        }
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::Store(cmd) => handle_store(&config, cmd),
    }
}

async fn handle_send(config: &Config, cmd: SendCommand) -> anyhow::Result<()> {
    let message = match cmd.message {
        Some(message) => message,
        None => read_stdin()?,
    };

    let store = store::open(config)?;
    let (domain, fetch) = ShareDomain::spawn_fetch(
        Arc::clone(&store),
        config.share.domain_key.clone(),
        config.share.fallback_domain.clone(),
    );

    let mut composer = Composer::new(store, domain, config.qr.clone());
    composer.set_message(message);
    if cmd.show {
        composer.toggle_visibility();
    }

    let id = composer.submit().await?;

    // The terminal prints once, so give the domain lookup a chance to land
    // before the URL is rendered.
    if tokio::time::timeout(config.store_timeout(), fetch)
        .await
        .is_err()
    {
        warn!("Share domain lookup timed out; using fallback");
    }

    let url = composer
        .share_url()
        .context("stored message has no share URL")?;

    let copied = if cmd.copy {
        composer.copy_url(&SystemClipboard)?.is_some()
    } else {
        false
    };

    let exported: Option<PathBuf> = match cmd.export {
        Some(path) => composer.export_png(path.as_deref())?,
        None => None,
    };

    if cmd.json {
        let output = serde_json::json!({
            "id": id,
            "url": url,
            "copied": copied,
            "exported": exported,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(qr) = composer.qr_image()? {
        println!("{}", qr.to_terminal());
    }
    println!("Message: {}", composer.display_text());
    println!("Link:    {url}");
    if let Some(notice) = composer.notice() {
        eprintln!("{notice}");
    }
    if copied {
        eprintln!("URL copied to clipboard");
    }
    if let Some(path) = exported {
        eprintln!("QR code saved to {}", path.display());
    }
    Ok(())
}

async fn handle_get(config: &Config, cmd: GetCommand) -> anyhow::Result<()> {
    let mut resolver = match (&cmd.link, &cmd.id) {
        (Some(link), _) => Resolver::from_link(link),
        (None, Some(id)) => Resolver::new(MessageId::parse(id)),
        (None, None) => Resolver::new(None),
    };

    // Only open the store when there is something to look up.
    if resolver.id().is_some() {
        let store: Arc<dyn MessageStore> = store::open(config)?;
        resolver.resolve(store.as_ref()).await;
    }

    match resolver.state() {
        ViewState::Ready(content) => {
            if cmd.json {
                let output = serde_json::json!({
                    "id": resolver.id(),
                    "content": content,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print!("{content}");
                if !content.ends_with('\n') && std::io::stdout().is_terminal() {
                    println!();
                }
            }
            Ok(())
        }
        ViewState::Failed(err) => {
            if cmd.json {
                let output = serde_json::json!({
                    "id": resolver.id(),
                    "error": err.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            Err((*err).into())
        }
        ViewState::Idle | ViewState::Loading => bail!("message lookup did not complete"),
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                let mut shown = config.clone();
                if shown.store.api_key.is_some() {
                    shown.store.api_key = Some("(set)".to_string());
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Store]");
                println!("  Backend:            {}", config.store.backend);
                match config.store.backend {
                    StoreBackend::Sqlite => {
                        println!("  Database path:      {}", config.database_path().display());
                    }
                    StoreBackend::Rest => {
                        println!(
                            "  REST URL:           {}",
                            config.store.rest_url.as_deref().unwrap_or("(unset)")
                        );
                        println!(
                            "  API key:            {}",
                            if config.store.api_key.is_some() { "(set)" } else { "(unset)" }
                        );
                    }
                }
                println!("  Timeout (secs):     {}", config.store.timeout_secs);
                println!();
                println!("[Share]");
                println!("  Fallback domain:    {}", config.share.fallback_domain);
                println!("  Domain key:         {}", config.share.domain_key);
                println!();
                println!("[QR]");
                println!("  Module size (px):   {}", config.qr.module_px);
                println!("  Padding (px):       {}", config.qr.padding_px);
                println!("  Export file:        {}", config.qr.export_file);
                println!();
                println!("[Server]");
                println!("  Bind:               {}", config.server.bind);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn handle_store(config: &Config, cmd: StoreCommand) -> anyhow::Result<()> {
    if config.store.backend != StoreBackend::Sqlite {
        bail!(
            "store commands need the sqlite backend (configured: {})",
            config.store.backend
        );
    }
    let storage = Storage::open(config.database_path())?;

    match cmd {
        StoreCommand::Stats { json } => {
            let stats = storage.stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("secretqr store");
                println!("--------------");
                println!("Database:      {}", storage.path().display());
                println!("Messages:      {}", stats.total_messages);
                println!("Size (bytes):  {}", stats.db_size_bytes);
                if let Some(oldest) = stats.oldest_message {
                    println!("Oldest:        {}", oldest.to_rfc3339());
                }
                if let Some(newest) = stats.newest_message {
                    println!("Newest:        {}", newest.to_rfc3339());
                }
            }
        }
        StoreCommand::SetConfig { key, value } => {
            if key == config.share.domain_key && !is_valid_hostname(&value) {
                bail!("'{value}' is not a valid hostname");
            }
            storage.set_config(&key, &value)?;
            println!("Set {key} = {value}");
        }
    }
    Ok(())
}

/// Read the message from stdin, dropping the single trailing newline that
/// `echo` and most shells append.
fn read_stdin() -> anyhow::Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read message from stdin")?;
    Ok(strip_trailing_newline(input))
}

fn strip_trailing_newline(mut input: String) -> String {
    if input.ends_with('\n') {
        input.pop();
        if input.ends_with('\r') {
            input.pop();
        }
    }
    input
}
