//! Database connection utilities.

use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use crate::DbError;

/// Database name used when neither `MONGO_DB` nor the URI names one.
pub const DEFAULT_DATABASE: &str = "feed_log";

/// Collection name used when `FEED_COLLECTION` is not set.
pub const DEFAULT_COLLECTION: &str = "feeds";

/// Where to connect and which collection holds the feed runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Connection string.
    pub uri: String,
    /// Database name override.
    pub database: Option<String>,
    /// Feed run collection name.
    pub collection: String,
}

impl ConnectionSettings {
    /// Reads settings from `MONGO_URI`, `MONGO_DB`, and `FEED_COLLECTION`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if `MONGO_URI` is not set or empty.
    pub fn from_env() -> Result<Self, DbError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if `MONGO_URI` is not set or empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DbError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let uri = non_empty("MONGO_URI").ok_or_else(|| DbError::Config {
            message: "MONGO_URI environment variable not set".to_string(),
        })?;

        Ok(Self {
            uri,
            database: non_empty("MONGO_DB"),
            collection: non_empty("FEED_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        })
    }
}

/// Connects to the database described by `settings`.
///
/// The database is `settings.database` if set, otherwise the one named in
/// the connection string, otherwise [`DEFAULT_DATABASE`]. The driver
/// connects lazily, so a ping is issued to fail fast on a bad URI or an
/// unreachable server.
///
/// # Errors
///
/// Returns [`DbError`] if the URI cannot be parsed or the server does not
/// answer the ping.
pub async fn connect(settings: &ConnectionSettings) -> Result<Database, DbError> {
    let mut options = ClientOptions::parse(settings.uri.as_str()).await?;
    options
        .app_name
        .get_or_insert_with(|| "feed_log".to_string());

    let name = settings
        .database
        .clone()
        .or_else(|| options.default_database.clone())
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

    let client = Client::with_options(options)?;
    let db = client.database(&name);

    db.run_command(bson::doc! { "ping": 1 }).await?;
    log::info!("Connected to database '{name}'");

    Ok(db)
}
