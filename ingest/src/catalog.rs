//! Session lifecycle of the review catalog.
//!
//! A [`ReviewCatalog`] owns at most one store session. It moves from disconnected to open on
//! [`ReviewCatalog::connect`] and to closed on [`ReviewCatalog::close`]; a closed catalog stays
//! closed. Misplaced lifecycle calls are logged and ignored, while data operations on a
//! catalog that is not open and initialized fail with [`ErrorKind::InvalidState`].

use config::shared::IngestConfig;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tracing::{info, warn};

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::gateway::WriteGateway;
use crate::pipeline::IngestPipeline;
use crate::query::{QueryFacade, ReviewListing};
use crate::schema;
use crate::statements::PreparedStatements;
use crate::store::{Store, StoreConnector};

/// Observable lifecycle state of a [`ReviewCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Open,
    Closed,
}

type SharedStatements<S> = Arc<PreparedStatements<<S as Store>::Prepared>>;

#[derive(Debug)]
enum Session<S: Store> {
    Disconnected,
    Open {
        store: S,
        statements: Option<SharedStatements<S>>,
    },
    Closed,
}

/// Entry point for loading and querying the catalog.
#[derive(Debug)]
pub struct ReviewCatalog<C: StoreConnector> {
    connector: C,
    config: IngestConfig,
    session: Session<C::Store>,
}

impl<C: StoreConnector> ReviewCatalog<C> {
    pub fn new(connector: C, config: IngestConfig) -> Self {
        Self {
            connector,
            config,
            session: Session::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.session {
            Session::Disconnected => SessionState::Disconnected,
            Session::Open { .. } => SessionState::Open,
            Session::Closed => SessionState::Closed,
        }
    }

    /// Opens the store session.
    ///
    /// Does nothing, apart from logging a warning, if a session is already open or the catalog
    /// was closed.
    pub async fn connect(&mut self) -> IngestResult<()> {
        match self.session {
            Session::Disconnected => {}
            Session::Open { .. } => {
                warn!("catalog is already connected, ignoring connect");
                return Ok(());
            }
            Session::Closed => {
                warn!("catalog was closed and cannot be reconnected, ignoring connect");
                return Ok(());
            }
        }

        let store = self.connector.connect().await?;
        info!(store = C::Store::name(), "catalog connected");

        self.session = Session::Open {
            store,
            statements: None,
        };

        Ok(())
    }

    /// Closes the store session.
    ///
    /// Does nothing, apart from logging a warning, if no session is open. The catalog is
    /// closed afterwards even if the store reports an error while closing, and its store handle
    /// is dropped either way.
    pub async fn close(&mut self) -> IngestResult<()> {
        match std::mem::replace(&mut self.session, Session::Closed) {
            Session::Open { store, statements } => {
                let closed = store.close().await;
                drop(statements);
                drop(store);
                closed?;
                info!(store = C::Store::name(), "catalog closed");
            }
            Session::Disconnected => {
                warn!("catalog is not connected, ignoring close");
                self.session = Session::Disconnected;
            }
            Session::Closed => {
                warn!("catalog is already closed, ignoring close");
            }
        }

        Ok(())
    }

    /// Creates the catalog tables if they are missing.
    pub async fn create_tables(&self) -> IngestResult<()> {
        schema::create_tables(self.store()?).await
    }

    /// Prepares the catalog statements. Required once before loading or querying.
    pub async fn initialize(&mut self) -> IngestResult<()> {
        let Session::Open { store, statements } = &mut self.session else {
            bail!(
                ErrorKind::InvalidState,
                "Catalog is not connected",
                "connect before initializing"
            );
        };

        let prepared = PreparedStatements::prepare(&*store).await?;
        *statements = Some(Arc::new(prepared));
        info!("catalog initialized");

        Ok(())
    }

    /// Loads the items file at `path`, returning the number of items written.
    pub async fn load_items(&self, path: impl AsRef<Path>) -> IngestResult<u64> {
        self.pipeline()?.load_items(path).await
    }

    /// Loads the reviews file at `path`, returning the number of reviews written.
    pub async fn load_reviews(&self, path: impl AsRef<Path>) -> IngestResult<u64> {
        self.pipeline()?.load_reviews(path).await
    }

    /// Loads items from a reader, returning the number of items written.
    pub async fn load_items_from<R>(&self, reader: R) -> IngestResult<u64>
    where
        R: AsyncBufRead + Unpin,
    {
        self.pipeline()?.load_items_from(reader).await
    }

    /// Loads reviews from a reader, returning the number of reviews written.
    pub async fn load_reviews_from<R>(&self, reader: R) -> IngestResult<u64>
    where
        R: AsyncBufRead + Unpin,
    {
        self.pipeline()?.load_reviews_from(reader).await
    }

    /// Returns the formatted item, or [`crate::query::NOT_EXISTS`].
    pub async fn item(&self, asin: &str) -> IngestResult<String> {
        self.queries()?.item(asin).await
    }

    /// Returns the reviews written by a reviewer, newest first.
    pub async fn user_reviews(&self, reviewer_id: &str) -> IngestResult<ReviewListing> {
        self.queries()?.user_reviews(reviewer_id).await
    }

    /// Returns the reviews of an item, newest first.
    pub async fn item_reviews(&self, asin: &str) -> IngestResult<ReviewListing> {
        self.queries()?.item_reviews(asin).await
    }

    fn store(&self) -> IngestResult<&C::Store> {
        match &self.session {
            Session::Open { store, .. } => Ok(store),
            Session::Disconnected => bail!(ErrorKind::InvalidState, "Catalog is not connected"),
            Session::Closed => bail!(ErrorKind::InvalidState, "Catalog is closed"),
        }
    }

    fn initialized(&self) -> IngestResult<(&C::Store, &SharedStatements<C::Store>)> {
        let store = self.store()?;
        let Session::Open {
            statements: Some(statements),
            ..
        } = &self.session
        else {
            bail!(
                ErrorKind::InvalidState,
                "Catalog is not initialized",
                "call initialize after creating the tables"
            );
        };

        Ok((store, statements))
    }

    fn pipeline(&self) -> IngestResult<IngestPipeline<C::Store>> {
        let (store, statements) = self.initialized()?;
        let gateway = WriteGateway::new(store.clone(), statements.clone());

        Ok(IngestPipeline::new(gateway, self.config.clone()))
    }

    fn queries(&self) -> IngestResult<QueryFacade<C::Store>> {
        let (store, statements) = self.initialized()?;

        Ok(QueryFacade::new(store.clone(), statements.clone()))
    }
}
