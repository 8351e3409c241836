//! swiftstore -- command-line client for Swift-compatible object storage.

use std::path::PathBuf;

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use tracing::info;

use swiftstore::config::{load_config, LoggingConfig};
use swiftstore::{Conditions, ListFiles, Listing, StorageAccount, DEFAULT_LIST_LIMIT};

/// Command-line arguments for the swiftstore client.
#[derive(Parser, Debug)]
#[command(
    name = "swiftstore",
    version,
    about = "Client for Swift-compatible object storage"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "swiftstore.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List containers in the account.
    Containers,
    /// List objects in a container.
    Files {
        container: String,
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Upload a local file.
    Upload {
        container: String,
        file: PathBuf,
        /// Remote object name (defaults to the file name).
        #[arg(long)]
        name: Option<String>,
    },
    /// Download an object.
    Download {
        container: String,
        name: String,
        /// Output path (defaults to the object name).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a container or `container/object`.
    Delete { path: String },
    /// Show account or container headers.
    Info { container: Option<String> },
    /// Print a signed temporary download URL.
    TempUrl {
        /// Object path, `/container/object`.
        path: String,
        #[arg(long)]
        key: String,
        /// Lifetime in seconds.
        #[arg(long, default_value_t = 3600)]
        ttl: i64,
        /// Suggested download file name.
        #[arg(long)]
        filename: Option<String>,
    },
    /// Store the account temp URL key.
    SetTempKey { key: String },
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_listing(listing: Listing) {
    match listing {
        Listing::Names(names) => {
            for name in names {
                println!("{name}");
            }
        }
        Listing::Raw(raw) => println!("{raw}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    init_logging(&config.logging);
    swiftstore::metrics::describe_metrics();
    info!("Loaded configuration from {}", cli.config.display());

    let account = StorageAccount::connect(&config)
        .await?
        .into_result("authenticate")?;

    match cli.command {
        Command::Containers => {
            print_listing(account.list_containers(DEFAULT_LIST_LIMIT, "", None).await?);
        }
        Command::Files { container, prefix } => {
            let container = account
                .get_container(&container)
                .await?
                .into_result("get_container")?;
            let listing = container
                .list_files(&ListFiles {
                    prefix: prefix.as_deref(),
                    ..Default::default()
                })
                .await?;
            print_listing(listing);
        }
        Command::Upload {
            container,
            file,
            name,
        } => {
            let container = account
                .get_container(&container)
                .await?
                .into_result("get_container")?;
            let info = container
                .put_file(&file, name.as_deref(), &[])
                .await?
                .into_result("put_file")?;
            info!(
                "Uploaded {} ({} bytes in {} ms)",
                info.url,
                info.size_upload,
                info.total_time.as_millis()
            );
        }
        Command::Download {
            container,
            name,
            output,
        } => {
            let container = account
                .get_container(&container)
                .await?
                .into_result("get_container")?;
            let outcome = container.get_file(&name, &Conditions::default()).await?;
            if outcome.code() != 200 {
                bail!("download of '{}' failed with HTTP {}", name, outcome.code());
            }
            let output = output.unwrap_or_else(|| PathBuf::from(&name));
            tokio::fs::write(&output, &outcome.content).await?;
            info!("Saved {} bytes to {}", outcome.content.len(), output.display());
        }
        Command::Delete { path } => {
            account.delete(&path).await?.into_result("delete")?;
            info!("Deleted {}", path);
        }
        Command::Info { container } => {
            let headers = match container {
                Some(name) => account
                    .get_container(&name)
                    .await?
                    .into_result("get_container")?
                    .info()
                    .clone(),
                None => account.info().await?.into_result("account_info")?,
            };
            for (name, value) in headers {
                println!("{name}: {value}");
            }
        }
        Command::TempUrl {
            path,
            key,
            ttl,
            filename,
        } => {
            let expires = chrono::Utc::now().timestamp() + ttl;
            let expires = u64::try_from(expires).context("expiry before the Unix epoch")?;
            println!(
                "{}",
                account.temp_url(&key, &path, expires, filename.as_deref())
            );
        }
        Command::SetTempKey { key } => {
            account
                .set_account_meta_temp_url_key(&key)
                .await?
                .into_result("set_account_meta_temp_url_key")?;
            info!("Temp URL key updated");
        }
    }

    Ok(())
}
