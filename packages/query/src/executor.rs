//! Runs translated queries against the feed run store.

use bson::Document;
use feed_log_ai::translator::TranslatedQuery;
use feed_log_database::FeedRunStore;
use feed_log_feed_run_models::SortOrder;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{Map, Value};

use crate::QueryError;
use crate::convert::{document_to_json, json_to_bson, object_to_document};
use crate::display::{DisplayKind, ResultDisplay, ResultTable, aggregate_summary, find_summary};

/// Maximum number of documents a find query returns.
pub const FIND_LIMIT: i64 = 100;

/// Rows and metadata from a query that ran.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Result rows as plain JSON.
    pub data: Vec<Value>,
    /// The model's explanation of the query.
    pub explanation: String,
    /// `find` or `aggregate`.
    pub query_type: String,
    /// Presentation hints.
    pub display: ResultDisplay,
}

impl QueryResult {
    fn new(data: Vec<Value>, explanation: String, kind: DisplayKind) -> Self {
        let (query_type, summary) = match kind {
            DisplayKind::Table => ("find", find_summary(data.len())),
            DisplayKind::Chart => ("aggregate", aggregate_summary(&data)),
        };
        let table = ResultTable::from_rows(data);
        let columns = table.columns().to_vec();

        Self {
            data: table.into_rows(),
            explanation,
            query_type: query_type.to_string(),
            display: ResultDisplay {
                kind,
                columns,
                summary,
            },
        }
    }

    /// Number of rows returned.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.data.len()
    }

    /// Reorders the rows by a flattened column path.
    #[must_use]
    pub fn sorted(mut self, column: &str, order: SortOrder) -> Self {
        let mut table = ResultTable::from_rows(std::mem::take(&mut self.data));
        table.sort_by(column, order);
        self.data = table.into_rows();
        self
    }
}

/// Outcome of executing a translated query.
///
/// Serializes as `{success: true, data, explanation, queryType, recordCount,
/// display}` or `{success: false, error, data: null}`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The query ran.
    Success(QueryResult),
    /// No data could be produced.
    Failure {
        /// User-facing reason.
        error: String,
    },
}

impl QueryOutcome {
    /// Creates a failed outcome.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Whether the query ran.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl Serialize for QueryOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(result) => {
                let mut state = serializer.serialize_struct("QueryOutcome", 6)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("data", &result.data)?;
                state.serialize_field("explanation", &result.explanation)?;
                state.serialize_field("queryType", &result.query_type)?;
                state.serialize_field("recordCount", &result.record_count())?;
                state.serialize_field("display", &result.display)?;
                state.end()
            }
            Self::Failure { error } => {
                let mut state = serializer.serialize_struct("QueryOutcome", 3)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
                state.serialize_field("data", &Value::Null)?;
                state.end()
            }
        }
    }
}

/// Executes a translated query.
///
/// `error` and invalid translations never reach the store. Store failures
/// are logged and reported as a failed outcome with the driver's message.
pub async fn execute(store: &dyn FeedRunStore, query: TranslatedQuery) -> QueryOutcome {
    let result = match query {
        TranslatedQuery::Error { explanation } => return QueryOutcome::failure(explanation),
        TranslatedQuery::Invalid {
            query_type, reason, ..
        } => {
            log::warn!("Rejecting translated query of type {query_type:?}: {reason}");
            return QueryOutcome::failure(reason);
        }
        TranslatedQuery::Find {
            filter,
            explanation,
        } => run_find(store, &filter)
            .await
            .map(|data| QueryResult::new(data, explanation, DisplayKind::Table)),
        TranslatedQuery::Aggregate {
            pipeline,
            explanation,
        } => run_aggregate(store, &pipeline)
            .await
            .map(|data| QueryResult::new(data, explanation, DisplayKind::Chart)),
    };

    match result {
        Ok(result) => {
            log::info!(
                "{} query returned {} rows",
                result.query_type,
                result.record_count()
            );
            QueryOutcome::Success(result)
        }
        Err(e) => {
            log::error!("Query execution failed: {e}");
            QueryOutcome::failure(e.to_string())
        }
    }
}

async fn run_find(
    store: &dyn FeedRunStore,
    filter: &Map<String, Value>,
) -> Result<Vec<Value>, QueryError> {
    let filter = object_to_document(filter);
    log::debug!("find {filter}");

    let docs = store.find_documents(filter, FIND_LIMIT).await?;
    Ok(to_rows(&docs))
}

async fn run_aggregate(
    store: &dyn FeedRunStore,
    pipeline: &[Value],
) -> Result<Vec<Value>, QueryError> {
    let stages = to_pipeline(pipeline)?;
    log::debug!("aggregate {stages:?}");

    let docs = store.aggregate_documents(stages).await?;
    Ok(to_rows(&docs))
}

/// Converts pipeline stages to documents, rewriting timestamps.
///
/// # Errors
///
/// Returns [`QueryError::InvalidStage`] if a stage is not an object.
pub fn to_pipeline(stages: &[Value]) -> Result<Vec<Document>, QueryError> {
    stages
        .iter()
        .enumerate()
        .map(|(index, stage)| match json_to_bson(stage) {
            bson::Bson::Document(doc) => Ok(doc),
            _ => Err(QueryError::InvalidStage { index }),
        })
        .collect()
}

fn to_rows(docs: &[Document]) -> Vec<Value> {
    docs.iter()
        .map(|doc| Value::Object(document_to_json(doc)))
        .collect()
}
