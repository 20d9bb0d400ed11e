//! HTTP handler functions for the feed log API.

use actix_web::{HttpRequest, HttpResponse, web};
use feed_log_database_models::DistinctField;
use feed_log_query::{QueryOutcome, execute};
use feed_log_server_models::{
    ApiError, ApiHealth, ChatExamples, ChatQueryRequest, ChatQueryResponse, DashboardPage,
    DashboardQueryParams, FilterOptions, Pagination,
};
use futures::future;

use crate::{AppState, validation};

/// 429 body for chat clients over their request budget.
pub const RATE_LIMITED: &str = "Too many requests. Please wait before asking another question.";

/// Chat error when the model call itself fails.
pub const TRANSLATION_FAILED: &str = "Failed to generate query. Please try again.";

/// Chat error when no model provider is configured.
pub const TRANSLATION_UNAVAILABLE: &str =
    "Natural-language queries are not configured on this server.";

const INTERNAL_ERROR: &str = "Internal server error";
const INVALID_BODY: &str = "Request body must be a JSON object";

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::new(message))
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiError::new(INTERNAL_ERROR))
}

/// Identifies the caller for rate limiting, honoring forwarding headers.
fn client_key(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/dashboard/data`
///
/// Returns one page of feed runs plus pagination metadata. The page and the
/// total count are fetched concurrently.
pub async fn dashboard_data(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let query = match validation::dashboard_query(&params) {
        Ok(query) => query,
        Err(e) => return bad_request(e.0),
    };

    let store = state.store.as_ref();
    match future::try_join(store.find_page(&query), store.count(&query.filter)).await {
        Ok((data, total_count)) => HttpResponse::Ok().json(DashboardPage {
            data,
            pagination: Pagination::new(query.page, query.limit, total_count),
        }),
        Err(e) => {
            log::error!("Failed to fetch dashboard data: {e}");
            internal_error()
        }
    }
}

/// `GET /api/dashboard/filter-options`
///
/// Returns the distinct clients, countries, and statuses, and the overall
/// timestamp range.
pub async fn filter_options(state: web::Data<AppState>) -> HttpResponse {
    let store = state.store.as_ref();
    let result = future::try_join4(
        store.distinct_values(DistinctField::Client),
        store.distinct_values(DistinctField::Country),
        store.distinct_values(DistinctField::Status),
        store.timestamp_range(),
    )
    .await;

    match result {
        Ok((clients, countries, statuses, date_range)) => HttpResponse::Ok().json(FilterOptions {
            clients,
            countries,
            statuses,
            date_range,
        }),
        Err(e) => {
            log::error!("Failed to fetch filter options: {e}");
            internal_error()
        }
    }
}

/// `POST /api/chat/query`
///
/// Rate-limited per client before anything else, so rejected requests still
/// count. Translation and execution failures are reported inside a 200
/// response as `{success: false, error}`.
pub async fn chat_query(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let client = client_key(&req);
    if !state.rate_limiter.check(&client) {
        return HttpResponse::TooManyRequests().json(ApiError::new(RATE_LIMITED));
    }

    let request: ChatQueryRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            log::debug!("Unreadable chat body from {client}: {e}");
            return bad_request(INVALID_BODY);
        }
    };

    let question = match validation::question(&request.question) {
        Ok(question) => question,
        Err(e) => return bad_request(e.0),
    };
    let sort_order = match validation::parse_sort_order(request.sort_order.as_ref()) {
        Ok(order) => order,
        Err(e) => return bad_request(e.0),
    };

    log::info!("Chat question from {client}: {question}");

    let outcome = match &state.translator {
        None => QueryOutcome::failure(TRANSLATION_UNAVAILABLE),
        Some(translator) => match translator.translate(question).await {
            Ok(query) => execute(state.store.as_ref(), query).await,
            Err(e) => {
                log::error!("Query translation failed: {e}");
                QueryOutcome::failure(TRANSLATION_FAILED)
            }
        },
    };

    let outcome = match (outcome, request.sort_by.as_deref()) {
        (QueryOutcome::Success(result), Some(column)) if !column.is_empty() => {
            QueryOutcome::Success(result.sorted(column, sort_order))
        }
        (outcome, _) => outcome,
    };

    HttpResponse::Ok().json(ChatQueryResponse {
        question: question.to_string(),
        response: outcome,
        timestamp: chrono::Utc::now(),
    })
}

/// `GET /api/chat/examples`
pub async fn chat_examples() -> HttpResponse {
    HttpResponse::Ok().json(ChatExamples::default())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use bson::{Document, doc};
    use chrono::TimeZone as _;
    use feed_log_ai::AiError;
    use feed_log_ai::providers::{CompletionRequest, LlmProvider};
    use feed_log_ai::translator::Translator;
    use feed_log_database::{DbError, FeedRunStore};
    use feed_log_database_models::{FeedRunFilter, FeedRunQuery, TimestampRange};
    use feed_log_feed_run_models::{FeedRun, Progress};
    use serde_json::{Value, json};

    use super::*;
    use crate::configure;
    use crate::rate_limit::RateLimiter;

    #[derive(Default)]
    struct MemoryStore {
        runs: Vec<FeedRun>,
        documents: Vec<Document>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl MemoryStore {
        fn enter(&self) -> Result<(), DbError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DbError::Config {
                    message: "server selection timeout".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl FeedRunStore for MemoryStore {
        async fn find_page(&self, query: &FeedRunQuery) -> Result<Vec<FeedRun>, DbError> {
            self.enter()?;
            let skip = usize::try_from(query.skip()).unwrap();
            let limit = usize::try_from(query.limit).unwrap();
            Ok(self.runs.iter().skip(skip).take(limit).cloned().collect())
        }

        async fn count(&self, _filter: &FeedRunFilter) -> Result<u64, DbError> {
            self.enter()?;
            Ok(self.runs.len() as u64)
        }

        async fn distinct_values(&self, field: DistinctField) -> Result<Vec<String>, DbError> {
            self.enter()?;
            let mut values: Vec<String> = self
                .runs
                .iter()
                .map(|run| match field {
                    DistinctField::Client => run.transaction_source_name.clone(),
                    DistinctField::Country => run.country_code.clone(),
                    DistinctField::Status => run.status.clone(),
                })
                .collect();
            values.sort();
            values.dedup();
            Ok(values)
        }

        async fn timestamp_range(&self) -> Result<TimestampRange, DbError> {
            self.enter()?;
            Ok(TimestampRange {
                min_date: self.runs.iter().map(|r| r.timestamp).min(),
                max_date: self.runs.iter().map(|r| r.timestamp).max(),
            })
        }

        async fn find_documents(
            &self,
            _filter: Document,
            limit: i64,
        ) -> Result<Vec<Document>, DbError> {
            self.enter()?;
            let limit = usize::try_from(limit).unwrap();
            Ok(self.documents.iter().take(limit).cloned().collect())
        }

        async fn aggregate_documents(
            &self,
            _pipeline: Vec<Document>,
        ) -> Result<Vec<Document>, DbError> {
            self.enter()?;
            Ok(self.documents.clone())
        }

        async fn insert_runs(&self, _runs: Vec<FeedRun>) -> Result<u64, DbError> {
            unimplemented!()
        }

        async fn ensure_indexes(&self) -> Result<(), DbError> {
            unimplemented!()
        }
    }

    struct CannedProvider(Result<&'static str, &'static str>);

    #[async_trait::async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, AiError> {
            self.0
                .map(ToString::to_string)
                .map_err(|message| AiError::Provider {
                    message: message.to_string(),
                })
        }
    }

    fn run(id: &str, client: &str, country: &str, status: &str, day: u32) -> FeedRun {
        FeedRun {
            id: id.to_string(),
            country_code: country.to_string(),
            currency_code: "USD".to_string(),
            progress: Progress::default(),
            status: status.to_string(),
            timestamp: chrono::Utc.with_ymd_and_hms(2025, 7, day, 6, 0, 0).unwrap(),
            transaction_source_name: client.to_string(),
            no_coordinates_count: 0,
            record_count: 10,
            unique_ref_number_count: 10,
        }
    }

    fn sample_runs() -> Vec<FeedRun> {
        vec![
            run("r1", "Deal2", "US", "completed", 3),
            run("r2", "Deal1", "UK", "failed", 1),
            run("r3", "Deal1", "US", "completed", 2),
        ]
    }

    fn state(store: MemoryStore, reply: Option<Result<&'static str, &'static str>>) -> AppState {
        AppState {
            store: Arc::new(store),
            translator: reply.map(|reply| Translator::new(Arc::new(CannedProvider(reply)), "feeds")),
            rate_limiter: RateLimiter::default(),
        }
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(configure),
            )
            .await
        };
    }

    fn chat(question: &Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/chat/query")
            .peer_addr("10.0.0.7:40000".parse().unwrap())
            .set_json(json!({ "question": question }))
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = app!(state(MemoryStore::default(), None));
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn dashboard_pages_and_counts() {
        let store = MemoryStore {
            runs: sample_runs(),
            ..MemoryStore::default()
        };
        let app = app!(state(store, None));

        let req = test::TestRequest::get()
            .uri("/api/dashboard/data?page=2&limit=2")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["_id"], "r3");
        assert_eq!(body["data"][0]["timestamp"], "2025-07-02T06:00:00.000Z");
        assert_eq!(
            body["pagination"],
            json!({
                "currentPage": 2,
                "totalPages": 2,
                "totalCount": 3,
                "limit": 2,
                "hasNextPage": false,
                "hasPrevPage": true,
            })
        );
    }

    #[actix_web::test]
    async fn invalid_sort_field_never_reaches_store() {
        let store = Arc::new(MemoryStore::default());
        let app = app!(AppState {
            store: store.clone(),
            translator: None,
            rate_limiter: RateLimiter::default(),
        });

        let req = test::TestRequest::get()
            .uri("/api/dashboard/data?sortBy=currency_code")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid sort field" }));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn dashboard_store_failure_is_generic_500() {
        let store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };
        let app = app!(state(store, None));

        let req = test::TestRequest::get().uri("/api/dashboard/data").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[actix_web::test]
    async fn filter_options_are_sorted_with_range() {
        let store = MemoryStore {
            runs: sample_runs(),
            ..MemoryStore::default()
        };
        let app = app!(state(store, None));

        let req = test::TestRequest::get()
            .uri("/api/dashboard/filter-options")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["clients"], json!(["Deal1", "Deal2"]));
        assert_eq!(body["countries"], json!(["UK", "US"]));
        assert_eq!(body["statuses"], json!(["completed", "failed"]));
        assert_eq!(body["dateRange"]["minDate"], "2025-07-01T06:00:00.000Z");
        assert_eq!(body["dateRange"]["maxDate"], "2025-07-03T06:00:00.000Z");
    }

    #[actix_web::test]
    async fn filter_options_on_empty_collection() {
        let app = app!(state(MemoryStore::default(), None));
        let req = test::TestRequest::get()
            .uri("/api/dashboard/filter-options")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["clients"], json!([]));
        assert_eq!(body["dateRange"], json!({ "minDate": null, "maxDate": null }));
    }

    #[actix_web::test]
    async fn chat_find_returns_envelope() {
        let store = MemoryStore {
            documents: vec![
                doc! { "_id": "r2", "transactionSourceName": "Deal1", "status": "failed" },
            ],
            ..MemoryStore::default()
        };
        let app = app!(state(
            store,
            Some(Ok(
                r#"```json
{"queryType":"find","query":{"transactionSourceName":"Deal1","status":"failed"},"explanation":"Failed runs for Deal1"}
```"#
            ))
        ));

        let body: Value = test::call_and_read_body_json(
            &app,
            chat(&json!("Show all failed jobs from Deal1")).to_request(),
        )
        .await;

        assert_eq!(body["question"], "Show all failed jobs from Deal1");
        assert!(body["timestamp"].is_string());
        let response = &body["response"];
        assert_eq!(response["success"], true);
        assert_eq!(response["queryType"], "find");
        assert_eq!(response["recordCount"], 1);
        assert_eq!(response["explanation"], "Failed runs for Deal1");
        assert_eq!(response["data"][0]["_id"], "r2");
        assert_eq!(response["display"]["kind"], "table");
    }

    #[actix_web::test]
    async fn chat_sorts_rows_when_asked() {
        let store = MemoryStore {
            documents: vec![doc! { "_id": "Deal1", "n": 1 }, doc! { "_id": "Deal2", "n": 4 }],
            ..MemoryStore::default()
        };
        let app = app!(state(
            store,
            Some(Ok(
                r#"{"queryType":"aggregate","query":[{"$group":{"_id":"$transactionSourceName","n":{"$sum":1}}}],"explanation":"Runs per client"}"#
            ))
        ));

        let req = test::TestRequest::post()
            .uri("/api/chat/query")
            .set_json(json!({ "question": "Runs per client", "sortBy": "n", "sortOrder": "desc" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["response"]["data"][0]["_id"], "Deal2");
        assert_eq!(body["response"]["display"]["summary"], "Processed 2 record(s)");
    }

    #[actix_web::test]
    async fn chat_model_refusal_is_not_an_http_error() {
        let app = app!(state(
            MemoryStore::default(),
            Some(Ok(
                r#"{"queryType":"error","query":null,"explanation":"I can only answer questions about feed runs."}"#
            ))
        ));

        let resp = test::call_service(&app, chat(&json!("Write me a poem")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["response"],
            json!({
                "success": false,
                "error": "I can only answer questions about feed runs.",
                "data": null,
            })
        );
    }

    #[actix_web::test]
    async fn chat_provider_failure_is_reported_in_envelope() {
        let app = app!(state(MemoryStore::default(), Some(Err("quota exceeded"))));

        let body: Value =
            test::call_and_read_body_json(&app, chat(&json!("How many runs?")).to_request()).await;

        assert_eq!(body["response"]["success"], false);
        assert_eq!(body["response"]["error"], TRANSLATION_FAILED);
    }

    #[actix_web::test]
    async fn chat_without_provider_is_reported_in_envelope() {
        let app = app!(state(MemoryStore::default(), None));
        let body: Value =
            test::call_and_read_body_json(&app, chat(&json!("How many runs?")).to_request()).await;
        assert_eq!(body["response"]["error"], TRANSLATION_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn chat_validation_errors() {
        let app = app!(state(MemoryStore::default(), None));

        for (question, message) in [
            (json!(null), "Question is required"),
            (json!(12), "Question must be a string"),
            (json!("   "), "Question cannot be empty"),
            (
                json!("x".repeat(501)),
                "Question is too long (max 500 characters)",
            ),
        ] {
            let resp = test::call_service(&app, chat(&question).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], message);
        }

        let req = test::TestRequest::post()
            .uri("/api/chat/query")
            .set_payload("not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn eleventh_chat_request_is_rate_limited() {
        let app = app!(state(MemoryStore::default(), None));

        // Rejected requests count against the window too.
        for _ in 0..10 {
            let resp = test::call_service(&app, chat(&json!("")).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let resp = test::call_service(&app, chat(&json!("How many runs?")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], RATE_LIMITED);

        let other = test::TestRequest::post()
            .uri("/api/chat/query")
            .peer_addr("10.0.0.8:40000".parse().unwrap())
            .set_json(json!({ "question": "How many runs?" }))
            .to_request();
        let resp = test::call_service(&app, other).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn chat_allowed_again_after_window() {
        let app = app!(AppState {
            store: Arc::new(MemoryStore::default()),
            translator: None,
            rate_limiter: RateLimiter::new(1, Duration::from_millis(50)),
        });

        let resp = test::call_service(&app, chat(&json!("first")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = test::call_service(&app, chat(&json!("second")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        actix_rt::time::sleep(Duration::from_millis(80)).await;

        let resp = test::call_service(&app, chat(&json!("third")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn examples_are_listed() {
        let app = app!(state(MemoryStore::default(), None));
        let req = test::TestRequest::get().uri("/api/chat/examples").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let examples = body["examples"].as_array().unwrap();
        assert_eq!(examples.len(), 6);
        assert_eq!(examples[1], "Show all failed jobs from Deal1");
    }
}
