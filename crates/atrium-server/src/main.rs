//! atrium-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and either serves HTTP or runs one of the account
//! administration commands.
//!
//! # Bootstrapping an admin
//!
//! ```
//! cargo run -p atrium-server -- create-superuser \
//!   --email admin@example.com --first-name Ada --last-name Admin
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use atrium_core::{account::ExtraFields, manager};
use atrium_server::{AppState, ServerConfig};
use atrium_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Atrium account server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve HTTP (the default).
  Serve,
  /// Create a regular account. An empty password leaves it unusable.
  CreateUser {
    #[arg(long)]
    email:      String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name:  String,
  },
  /// Create a staff superuser account. Both names are required.
  CreateSuperuser {
    #[arg(long)]
    email:      String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name:  String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8000)?
    .set_default("store_path", "atrium.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ATRIUM"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, server_cfg).await,
    Command::CreateUser { email, first_name, last_name } => {
      let password = read_password()?;
      let extra = ExtraFields { first_name, last_name, ..Default::default() };
      let identity = manager::create_user(
        &store,
        &email,
        (!password.is_empty()).then_some(password.as_str()),
        extra,
      )
      .await
      .context("failed to create user")?;
      println!("created {} ({})", identity.email, identity.slug);
      Ok(())
    }
    Command::CreateSuperuser { email, first_name, last_name } => {
      let password = read_password()?;
      if password.is_empty() {
        anyhow::bail!("a superuser needs a password");
      }
      let extra = ExtraFields { first_name, last_name, ..Default::default() };
      let identity =
        manager::create_superuser(&store, &email, Some(&password), extra)
          .await
          .context("failed to create superuser")?;
      println!("created superuser {} ({})", identity.email, identity.slug);
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg),
  };
  let app = atrium_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
