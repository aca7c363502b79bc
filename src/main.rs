//! daily-gateway -- command-line client for the Daily journal API.
//!
//! Wires together configuration, the persisted session and the gateway, then
//! runs a single command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing_subscriber::EnvFilter;

use daily_gateway::models::journal::ContentIdsRequest;
use daily_gateway::{
    Config, CredentialStore, Credential, DailyApi, FileStorage, GatewayBuilder, KeyValueStorage,
    SessionStore,
};

// ---------------------------------------------------------------------------
// CLI argument parsing (minimal, no clap dependency)
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Command {
    Login(String),
    Logout,
    Whoami,
    Today,
    Types,
    Docs(String),
}

struct CliArgs {
    config_path: PathBuf,
    command: Command,
}

fn parse_args() -> CliArgs {
    match parse_from(std::env::args().skip(1)) {
        Ok(Some(cli)) => cli,
        Ok(None) => {
            print_usage();
            std::process::exit(0);
        }
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("Run with --help for usage information.");
            std::process::exit(1);
        }
    }
}

/// `Ok(None)` means help or version was printed.
fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Option<CliArgs>, String> {
    let mut args = args.into_iter();
    let mut config_path = PathBuf::from("daily-gateway.toml");
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().ok_or("--config requires a path argument")?;
                config_path = PathBuf::from(path);
            }
            "--help" | "-h" => return Ok(None),
            "--version" | "-V" => {
                println!("daily-gateway {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            other if other.starts_with('-') => return Err(format!("Unknown argument: {other}")),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("login") => Command::Login(positional.next().ok_or("login requires a TOKEN")?),
        Some("logout") => Command::Logout,
        Some("whoami") => Command::Whoami,
        Some("today") => Command::Today,
        Some("types") => Command::Types,
        Some("docs") => Command::Docs(positional.next().ok_or("docs requires a TYPE_ID")?),
        Some(other) => return Err(format!("Unknown command: {other}")),
        None => return Err("missing command".to_string()),
    };
    if let Some(extra) = positional.next() {
        return Err(format!("Unexpected argument: {extra}"));
    }

    Ok(Some(CliArgs {
        config_path,
        command,
    }))
}

fn print_usage() {
    println!(
        "\
daily-gateway {version} -- Daily journal API client

USAGE:
    daily-gateway [OPTIONS] <COMMAND>

COMMANDS:
    login <TOKEN>          Store an access token
    logout                 Forget the stored session
    whoami                 Show the stored session
    today                  List today's items
    types                  List document types
    docs <TYPE_ID>         List documents of a type

OPTIONS:
    -c, --config <PATH>    Path to configuration file [default: daily-gateway.toml]
    -h, --help             Print this help message
    -V, --version          Print version information

ENVIRONMENT:
    RUST_LOG               Override log level (e.g. RUST_LOG=debug)
    DAILY_CONFIG           Alternative to --config flag
    DAILY_*                Override individual settings
",
        version = env!("CARGO_PKG_VERSION")
    );
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = parse_args();

    let config_path = std::env::var("DAILY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or(cli.config_path);
    let config = Config::load(&config_path)?;

    init_tracing(&config);
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "Starting daily-gateway"
    );
    for (key, var) in config.env_overrides.all() {
        tracing::debug!(setting = key.as_str(), env = var.as_str(), "Setting overridden from environment");
    }

    let storage: Arc<dyn KeyValueStorage> = match &config.storage.path {
        Some(path) => Arc::new(FileStorage::new(path)),
        None => Arc::new(FileStorage::default_path()?),
    };
    let session = Arc::new(SessionStore::restore(storage)?);

    match cli.command {
        Command::Login(token) => {
            session.set_credential(Credential::new(token))?;
            println!("Logged in.");
        }
        Command::Logout => {
            session.logout()?;
            println!("Logged out.");
        }
        Command::Whoami => {
            if !session.is_authenticated() {
                println!("Not logged in.");
            } else {
                match session.user() {
                    Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
                    None => println!("Logged in (no profile stored)."),
                }
            }
        }
        command => {
            if !session.is_authenticated() {
                bail!("Not logged in. Run `daily-gateway login <TOKEN>` first.");
            }
            let gateway = GatewayBuilder::from_config(&config)?
                .credential_store(session)
                .build()?;
            let api = DailyApi::new(Arc::new(gateway));
            run_query(&api, command).await?;
        }
    }

    Ok(())
}

async fn run_query(api: &DailyApi, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Today => {
            let today = api.today().await.context("Failed to fetch today's items")?;
            for (label, items) in [("base", &today.base_item), ("plan", &today.plan_item)] {
                for item in items {
                    println!("[{label}] {} {}", item.index, item.content);
                }
            }
        }
        Command::Types => {
            for kind in api.all_types().await.context("Failed to list types")? {
                println!("{}\t{}", kind.id, kind.name);
            }
        }
        Command::Docs(type_id) => {
            let docs = api
                .docs_by_type(&ContentIdsRequest { id: type_id })
                .await
                .context("Failed to list documents")?;
            for doc in docs {
                println!("{}\t{}", doc.id, doc.name);
            }
        }
        Command::Login(_) | Command::Logout | Command::Whoami => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn init_tracing(config: &Config) {
    // RUST_LOG env var takes precedence over config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.logging.level;
        EnvFilter::new(format!("daily_gateway={level},warn"))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
