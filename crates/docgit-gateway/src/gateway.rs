//! Connection entry point and idempotent provisioning.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::collection::Collection;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::http::HttpClient;
use crate::traits::{Database, DocumentClient};

/// Collection holding git objects.
pub const OBJECTS_COLLECTION: &str = "objects";
/// Collection holding references.
pub const REFS_COLLECTION: &str = "refs";
/// Collection holding shallow, index and config documents.
pub const MISC_COLLECTION: &str = "misc";

/// Open the named database, creating it if absent.
///
/// Returns the handle and whether this call created it. Losing a creation
/// race to a concurrent caller counts as "already existed".
pub async fn get_or_create_database(
    client: &dyn DocumentClient,
    name: &str,
) -> GatewayResult<(Arc<dyn Database>, bool)> {
    if client.database_exists(name).await? {
        debug!(database = name, "database exists");
        return Ok((client.database(name).await?, false));
    }
    match client.create_database(name).await {
        Ok(db) => {
            info!(database = name, "created database");
            Ok((db, true))
        }
        Err(GatewayError::AlreadyExists(_)) => Ok((client.database(name).await?, false)),
        Err(e) => Err(e),
    }
}

/// Open the named collection, creating it if absent.
pub async fn get_or_create_collection(
    db: Arc<dyn Database>,
    name: &str,
) -> GatewayResult<Collection> {
    if !db.collection_exists(name).await? {
        match db.create_collection(name).await {
            Ok(()) => info!(database = db.name(), collection = name, "created collection"),
            Err(GatewayError::AlreadyExists(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Collection::new(db, name))
}

/// A configured connection to the document database.
#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn DocumentClient>,
    config: GatewayConfig,
}

impl Gateway {
    /// Connect over HTTP using `config`.
    pub fn connect(config: GatewayConfig) -> GatewayResult<Self> {
        let client = HttpClient::new(&config)?;
        Ok(Self::with_client(Arc::new(client), config))
    }

    /// Use an already constructed driver.
    pub fn with_client(client: Arc<dyn DocumentClient>, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<dyn DocumentClient> {
        &self.client
    }

    /// Open the configured database, creating it if needed.
    pub async fn open_database(&self) -> GatewayResult<(Arc<dyn Database>, bool)> {
        get_or_create_database(self.client.as_ref(), &self.config.database).await
    }

    /// Open a collection with this gateway's read and write options applied.
    pub async fn collection(&self, db: Arc<dyn Database>, name: &str) -> GatewayResult<Collection> {
        let collection = get_or_create_collection(db, name).await?;
        Ok(collection.with_options(self.config.read_options(), self.config.write_options()))
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
