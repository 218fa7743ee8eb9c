use config::shared::{IngestConfig, LoaderConfig, StoreConfig};
use ingest::catalog::ReviewCatalog;
use ingest::store::StoreConnector;
use ingest::store::memory::MemoryStore;
#[cfg(feature = "scylla")]
use ingest::store::scylla::ScyllaConnector;
use tracing::{info, warn};

use crate::error::LoaderResult;
use crate::{Command, LoadArgs};

/// Runs `command` against the configured store.
pub async fn run(config: LoaderConfig, command: Command) -> LoaderResult<()> {
    match &config.store {
        StoreConfig::Memory => {
            warn!("using the in-memory store, nothing is kept after this run");
            run_with(MemoryStore::new(), config.ingest, &command, true).await
        }
        #[cfg(feature = "scylla")]
        StoreConfig::Scylla { .. } => {
            let connector = ScyllaConnector::from_config(&config.store)?;
            run_with(connector, config.ingest, &command, false).await
        }
        #[cfg(not(feature = "scylla"))]
        StoreConfig::Scylla { .. } => Err(ingest::error::IngestError::from((
            ingest::error::ErrorKind::ConfigError,
            "The loader was built without the `scylla` feature",
        ))
        .into()),
    }
}

/// Opens a session, runs the command and closes the session again, also on failure.
async fn run_with<C: StoreConnector>(
    connector: C,
    ingest: IngestConfig,
    command: &Command,
    ephemeral: bool,
) -> LoaderResult<()> {
    let mut catalog = ReviewCatalog::new(connector, ingest);
    catalog.connect().await?;

    let result = execute(&mut catalog, command, ephemeral).await;
    let closed = catalog.close().await;

    result?;
    closed?;

    Ok(())
}

async fn execute<C: StoreConnector>(
    catalog: &mut ReviewCatalog<C>,
    command: &Command,
    ephemeral: bool,
) -> LoaderResult<()> {
    // A fresh in-memory store has no tables yet.
    if ephemeral || matches!(command, Command::CreateTables) {
        catalog.create_tables().await?;
    }
    if matches!(command, Command::CreateTables) {
        return Ok(());
    }

    catalog.initialize().await?;

    match command {
        Command::CreateTables => {}
        Command::Load(args) => load(catalog, args).await?,
        Command::Item { asin } => print_item(catalog, asin).await?,
        Command::UserReviews { reviewer_id } => {
            print!("{}", catalog.user_reviews(reviewer_id).await?);
        }
        Command::ItemReviews { asin } => {
            print!("{}", catalog.item_reviews(asin).await?);
        }
    }

    Ok(())
}

async fn load<C: StoreConnector>(catalog: &ReviewCatalog<C>, args: &LoadArgs) -> LoaderResult<()> {
    if args.items.is_none() && args.reviews.is_none() {
        warn!("no input files given, nothing to load");
    }

    if let Some(path) = &args.items {
        let written = catalog.load_items(path).await?;
        info!(path = %path.display(), written, "items loaded");
    }
    if let Some(path) = &args.reviews {
        let written = catalog.load_reviews(path).await?;
        info!(path = %path.display(), written, "reviews loaded");
    }

    for asin in &args.show_items {
        print_item(catalog, asin).await?;
    }
    for reviewer_id in &args.show_user_reviews {
        print!("{}", catalog.user_reviews(reviewer_id).await?);
    }
    for asin in &args.show_item_reviews {
        print!("{}", catalog.item_reviews(asin).await?);
    }

    Ok(())
}

async fn print_item<C: StoreConnector>(catalog: &ReviewCatalog<C>, asin: &str) -> LoaderResult<()> {
    let item = catalog.item(asin).await?;
    println!("{}", item.trim_end());

    Ok(())
}
