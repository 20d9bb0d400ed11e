//! `MongoDB`-backed [`FeedRunStore`].

use bson::{Bson, Document};
use feed_log_database_models::{
    DistinctField, FeedRunDocument, FeedRunFilter, FeedRunQuery, TimestampRange, bson_to_chrono,
};
use feed_log_feed_run_models::FeedRun;
use futures::TryStreamExt as _;
use mongodb::{Collection, Database, IndexModel};

use crate::{DbError, FeedRunStore, queries};

/// Feed run store over a single collection.
#[derive(Clone)]
pub struct MongoFeedRunStore {
    runs: Collection<FeedRunDocument>,
    raw: Collection<Document>,
}

impl MongoFeedRunStore {
    /// Opens the named collection in `db`.
    #[must_use]
    pub fn new(db: &Database, collection: &str) -> Self {
        let runs = db.collection::<FeedRunDocument>(collection);
        let raw = runs.clone_with_type::<Document>();
        Self { runs, raw }
    }

    /// Name of the underlying collection.
    #[must_use]
    pub fn collection_name(&self) -> &str {
        self.runs.name()
    }
}

#[async_trait::async_trait]
impl FeedRunStore for MongoFeedRunStore {
    async fn find_page(&self, query: &FeedRunQuery) -> Result<Vec<FeedRun>, DbError> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let cursor = self
            .runs
            .find(queries::build_filter(&query.filter))
            .sort(queries::build_sort(query.sort_by, query.sort_order))
            .skip(query.skip())
            .limit(limit)
            .await?;

        let docs: Vec<FeedRunDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(FeedRun::from).collect())
    }

    async fn count(&self, filter: &FeedRunFilter) -> Result<u64, DbError> {
        Ok(self
            .runs
            .count_documents(queries::build_filter(filter))
            .await?)
    }

    async fn distinct_values(&self, field: DistinctField) -> Result<Vec<String>, DbError> {
        let values = self
            .runs
            .distinct(field.field_name(), Document::new())
            .await?;
        Ok(queries::distinct_strings(values))
    }

    async fn timestamp_range(&self) -> Result<TimestampRange, DbError> {
        let mut cursor = self
            .runs
            .aggregate(queries::timestamp_range_pipeline())
            .await?;

        let Some(group) = cursor.try_next().await? else {
            return Ok(TimestampRange::default());
        };

        let pick = |key: &str| match group.get(key) {
            Some(Bson::DateTime(dt)) => Some(bson_to_chrono(*dt)),
            _ => None,
        };

        Ok(TimestampRange {
            min_date: pick("minDate"),
            max_date: pick("maxDate"),
        })
    }

    async fn find_documents(
        &self,
        filter: Document,
        limit: i64,
    ) -> Result<Vec<Document>, DbError> {
        log::debug!("find {}: {filter}", self.raw.name());
        let cursor = self.raw.find(filter).limit(limit).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn aggregate_documents(
        &self,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, DbError> {
        log::debug!(
            "aggregate {}: {} stage(s)",
            self.raw.name(),
            pipeline.len()
        );
        let cursor = self.raw.aggregate(pipeline).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_runs(&self, runs: Vec<FeedRun>) -> Result<u64, DbError> {
        if runs.is_empty() {
            return Ok(0);
        }
        let docs: Vec<FeedRunDocument> = runs.into_iter().map(FeedRunDocument::from).collect();
        let result = self.runs.insert_many(docs).await?;
        Ok(result.inserted_ids.len() as u64)
    }

    async fn ensure_indexes(&self) -> Result<(), DbError> {
        let models: Vec<IndexModel> = queries::index_keys()
            .into_iter()
            .map(|keys| IndexModel::builder().keys(keys).build())
            .collect();

        let result = self.runs.create_indexes(models).await?;
        log::info!(
            "Ensured {} index(es) on '{}'",
            result.index_names.len(),
            self.runs.name()
        );
        Ok(())
    }
}
