use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::sync::Mutex;
use syncmap::{Config, KvStore, LockedStore, LogConfig, Strategy};
use tracing::info;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

/// Exercise both store strategies
#[derive(Debug, Parser)]
#[command(name = "syncmap", version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Strategy for the second scenario, overriding the configuration
    #[arg(short, long, value_enum)]
    strategy: Option<Strategy>,
}

/// Build the log subscriber; file output is written without ANSI colours
fn build_subscriber(log: &LogConfig) -> anyhow::Result<impl tracing::Subscriber + Send + Sync + 'static> {
    let writer = match &log.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file '{}'", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    Ok(tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log.level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(log.file.is_none())
        .with_writer(writer)
        .finish())
}

fn init_logging(log: &LogConfig) -> anyhow::Result<()> {
    build_subscriber(log)?.init();
    Ok(())
}

/// Overwrite a key, then list keys after a few more writes
async fn run_locked_scenario() -> anyhow::Result<()> {
    let store = LockedStore::new();

    store.set(2, "hello".to_string()).await?;
    println!("{}", store.get(&2).await?);

    store.set(1, "a".to_string()).await?;
    store.set(2, "b".to_string()).await?;
    store.set(3, "c".to_string()).await?;
    println!("{:?}", store.list_keys().await?);
    Ok(())
}

/// Delete and re-insert a key, then read back every listed key
async fn run_second_scenario(store: &dyn KvStore<i32, String>) -> anyhow::Result<()> {
    store.set(1, "a".to_string()).await?;
    println!("{}", store.get(&1).await?);

    store.set(2, "b".to_string()).await?;
    store.delete(&1).await?;
    store.set(1, "z".to_string()).await?;

    let keys = store.list_keys().await?;
    println!("{:?}", keys);
    for key in keys {
        println!("{}", key);
        match store.get(&key).await {
            Ok(value) => println!("{}", value),
            Err(e) if e.is_not_found() => println!("{}", e),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(strategy) = args.strategy {
        config.store.strategy = strategy;
    }
    config.store.validate()?;

    init_logging(&config.log)?;
    info!("Starting syncmap demo");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    info!("Running scenario on locked store");
    run_locked_scenario().await?;

    println!("{:?} store ------------------------------------------", config.store.strategy);
    info!(strategy = ?config.store.strategy, "Running scenario on configured store");
    // Dropping the last handle stops an actor worker.
    let store = syncmap::open::<i32, String>(&config.store);
    run_second_scenario(store.as_ref()).await?;

    Ok(())
}
