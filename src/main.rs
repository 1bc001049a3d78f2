use clap::Parser;
use miette::{IntoDiagnostic, Result};
use nok_wallet::application::engine::WalletEngine;
use nok_wallet::config::Config;
use nok_wallet::domain::ports::LedgerStoreBox;
use nok_wallet::infrastructure::in_memory::InMemoryLedgerStore;
#[cfg(feature = "storage-rocksdb")]
use nok_wallet::infrastructure::rocksdb::RocksDBStore;
use nok_wallet::interfaces::csv::command_reader::CommandReader;
use nok_wallet::interfaces::csv::report_writer::ReportWriter;
use nok_wallet::logging::{LogFormat, init_logging};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, env = "NOK_WALLET_CONFIG")]
    config: Option<PathBuf>,

    /// Log format: "pretty" or "json". Overrides the config file.
    #[arg(long, env = "NOK_WALLET_LOG_FORMAT")]
    log_format: Option<String>,

    /// Print the transaction ledger instead of wallet balances
    #[arg(long)]
    ledger: bool,
}

fn open_store(db_path: Option<PathBuf>) -> Result<LedgerStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Box::new(RocksDBStore::open(path)?)),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Box::new(InMemoryLedgerStore::new()))
        }
        None => Ok(Box::new(InMemoryLedgerStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let format = cli
        .log_format
        .as_deref()
        .map(LogFormat::from_str_lossy)
        .unwrap_or(config.logging.format);
    init_logging(&config.logging.level, format);

    let engine = WalletEngine::new(open_store(cli.db_path)?, &config)?;

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    let mut rejected = 0usize;
    for (index, command) in reader.commands().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let result = match command {
            Ok(command) => command.apply(&engine).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            rejected += 1;
            tracing::warn!(line, error = %e, "command rejected");
        }
    }
    tracing::info!(rejected, "input processed");

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    if cli.ledger {
        writer.write_transactions(engine.all_transactions().await?)?;
    } else {
        writer.write_wallets(engine.wallets().await?)?;
    }

    Ok(())
}
