//! HTTP request handlers

use super::errors::{ApiError, QUERY_EMPTY, QUERY_REQUIRED};
use super::models::{SearchParams, SearchResponse, SummaryResponse};
use super::state::AppState;
use crate::llm::prompts::{knowledge_messages, synthesis_messages};
use crate::llm::CompletionRequest;
use crate::results::parse_formatted_results;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use tera::Context;
use tracing::info;

/// Chat page handler
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let mut ctx = Context::new();
    ctx.insert("instance_name", state.instance_name());
    ctx.insert("render_mode", state.settings.ui.render_mode.as_str());
    ctx.insert("version", crate::VERSION);

    match state.templates.render_with_context("index.html", &ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Web search handler
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = match params.q {
        Some(q) if !q.trim().is_empty() => q,
        _ => return Err(ApiError::BadRequest(QUERY_REQUIRED)),
    };

    let results = state.search.execute(&query).await?;
    Ok(Json(SearchResponse { results }))
}

/// Knowledge handler.
///
/// Answers the initial request with a JSON summary and the synthesis request
/// with the raw content stream.
pub async fn knowledge(
    State(state): State<AppState>,
    Json(request): Json<CompletionRequest>,
) -> Result<Response, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest(QUERY_EMPTY));
    }

    if request.is_initial() {
        let summary = state.llm.complete(&knowledge_messages(&request.query)).await?;
        return Ok(Json(SummaryResponse { summary }).into_response());
    }

    let sources = request
        .search_results
        .as_deref()
        .map_or(0, |block| parse_formatted_results(block).len());
    info!(
        search_failed = request.search_failed,
        ai_failed = request.ai_failed,
        sources,
        "Starting synthesis"
    );
    let relay = state.llm.stream(&synthesis_messages(&request)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(relay),
    )
        .into_response())
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::network::HttpClient;
    use crate::web::{create_router, AppState};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn router_for(server: &MockServer) -> Router {
        let mut settings = Settings::default();
        settings.search.endpoint = format!("{}/customsearch/v1", server.uri());
        settings.search.api_key = Some("search-key".to_string());
        settings.search.engine_id = Some("engine".to_string());
        settings.llm.endpoint = format!("{}/chat/completions", server.uri());
        settings.llm.api_key = Some("llm-key".to_string());

        let state = AppState::new(settings, HttpClient::new().unwrap()).unwrap();
        create_router(state)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"title": "Rust", "link": "https://www.rust-lang.org", "snippet": "A language"}
                ]
            })))
            .mount(&server)
            .await;

        let response = router_for(&server)
            .oneshot(
                Request::builder()
                    .uri("/api/search?q=rust")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["results"][0]["title"], "Rust");
        assert_eq!(body["results"][0]["link"], "https://www.rust-lang.org");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let server = MockServer::start().await;

        for uri in ["/api/search", "/api/search?q=%20%20"] {
            let response = router_for(&server)
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(body["error"], "Query parameter is required");
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let response = router_for(&server)
            .oneshot(
                Request::builder()
                    .uri("/api/search?q=rust")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "Failed to fetch search results");
    }

    #[tokio::test]
    async fn test_knowledge_initial_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"model": "deepseek-chat"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Paris."}}]
            })))
            .mount(&server)
            .await;

        let response = router_for(&server)
            .oneshot(post_json("/api/knowledge", json!({"query": "capital of France"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["summary"], "Paris.");
    }

    #[tokio::test]
    async fn test_knowledge_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let response = router_for(&server)
            .oneshot(post_json("/api/knowledge", json!({"query": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "Failed to generate summary");
    }

    #[tokio::test]
    async fn test_knowledge_blank_query() {
        let server = MockServer::start().await;

        let response = router_for(&server)
            .oneshot(post_json("/api/knowledge", json!({"query": " "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "Query is required");
    }

    #[tokio::test]
    async fn test_synthesis_streams_content() {
        let server = MockServer::start().await;
        let upstream = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Sunny \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"today.\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(upstream, "text/event-stream"),
            )
            .mount(&server)
            .await;

        let response = router_for(&server)
            .oneshot(post_json(
                "/api/deepseek",
                json!({
                    "query": "weather",
                    "searchResults": "### 1. Forecast",
                    "initialResponse": null,
                    "searchFailed": false,
                    "aiFailed": true
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(body_string(response).await, "Sunny today.");
    }

    #[tokio::test]
    async fn test_synthesis_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let response = router_for(&server)
            .oneshot(post_json(
                "/api/knowledge",
                json!({"query": "weather", "searchResults": "results"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "Failed to generate summary");
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let server = MockServer::start().await;
        let router = router_for(&server);

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Search Synth"));

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], crate::VERSION);
    }
}
