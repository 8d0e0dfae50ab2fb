use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paysettle::application::engine::{Collaborators, PaymentEngine};
use paysettle::config::{EngineConfig, SettlementMode};
use paysettle::domain::ports::{
    SharedPaymentGateway, SharedRefundRepository, SharedTransactionRepository,
};
use paysettle::domain::transaction::{Transaction, TransactionStatus};
use paysettle::infrastructure::gateway::SimulatedGateway;
use paysettle::infrastructure::in_memory::{InMemoryRefundStore, InMemoryTransactionStore};
#[cfg(feature = "storage-rocksdb")]
use paysettle::infrastructure::rocksdb::RocksDBStore;
use paysettle::interfaces::csv::purchase_reader::PurchaseReader;
use paysettle::interfaces::csv::transaction_writer::TransactionWriter;
use paysettle::logging;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input purchases CSV file
    input: PathBuf,

    /// Path to persistent database (optional). Requires the `storage-rocksdb` feature.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON engine configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured settlement mode
    #[arg(long, value_enum)]
    mode: Option<SettlementMode>,

    /// Seed for the simulated gateway, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// trace, debug, info, warn, error or off
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = logging::parse_log_level(&cli.log_level);
    logging::init(level.unwrap_or(logging::DEFAULT_LEVEL));
    if level.is_none() {
        warn!(level = %cli.log_level, "Invalid log level, defaulting to warn");
    }

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.settlement_mode = mode;
    }

    let (transactions, refunds) = open_stores(cli.db_path)?;
    let gateway: SharedPaymentGateway = match cli.seed {
        Some(seed) => Arc::new(SimulatedGateway::seeded(seed)),
        None => Arc::new(SimulatedGateway::new()),
    };
    let engine = PaymentEngine::new(Collaborators::new(transactions, refunds, gateway), config)?;

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = PurchaseReader::new(file);
    let mut created = Vec::new();
    for (row, request) in reader.purchases().enumerate() {
        match request {
            Ok(request) => match engine.submit(request).await {
                Ok(tx) => created.push(tx),
                Err(e) if e.is_business_rule() => {
                    warn!(row = row + 1, error = %e, "Error processing purchase")
                }
                Err(e) => error!(row = row + 1, error = %e, "Error processing purchase"),
            },
            Err(e) => error!(row = row + 1, error = %e, "Error reading purchase"),
        }
    }

    let results = if engine.config().settlement_mode == SettlementMode::Deferred {
        authorize_all(&engine, created).await
    } else {
        created
    };
    info!(count = results.len(), "purchases settled");

    let stdout = io::stdout();
    let mut writer = TransactionWriter::new(stdout.lock());
    writer.write_transactions(&results)?;

    Ok(())
}

async fn authorize_all(engine: &PaymentEngine, pending: Vec<Transaction>) -> Vec<Transaction> {
    let mut settled = Vec::with_capacity(pending.len());
    for tx in pending {
        if tx.status != TransactionStatus::Pending {
            settled.push(tx);
            continue;
        }
        match engine.transactions().authorize(tx.id).await {
            Ok(updated) => settled.push(updated),
            Err(e) => {
                error!(transaction_id = %tx.id, error = %e, "Error authorizing transaction");
                settled.push(tx);
            }
        }
    }
    settled
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(
    db_path: Option<PathBuf>,
) -> Result<(SharedTransactionRepository, SharedRefundRepository)> {
    match db_path {
        Some(path) => {
            let store = RocksDBStore::open(path)?;
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
        None => Ok(in_memory()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(
    db_path: Option<PathBuf>,
) -> Result<(SharedTransactionRepository, SharedRefundRepository)> {
    if let Some(path) = db_path {
        warn!(
            path = %path.display(),
            "built without the storage-rocksdb feature, falling back to in-memory storage"
        );
    }
    Ok(in_memory())
}

fn in_memory() -> (SharedTransactionRepository, SharedRefundRepository) {
    (
        Arc::new(InMemoryTransactionStore::new()),
        Arc::new(InMemoryRefundStore::new()),
    )
}
