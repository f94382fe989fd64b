//! HTTP clients against a local mock server
//!
//! Checks what the chat-completions and Scopus clients put on the wire and how
//! they map statuses and timeouts. Tests against the real services are behind
//! the `live_api` feature and need both API keys in the environment.

use litreview::config::{EnrichmentSettings, SearchSettings};
use litreview::{
    ChatCompletionClient, EnrichmentClient, EnrichmentRequest, Record, ScopusClient, SearchError,
    SearchQuery, ServiceError,
};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{bearer_token, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCOPUS_PATH: &str = "/content/search/scopus";

fn enrichment_settings(server: &MockServer) -> EnrichmentSettings {
    EnrichmentSettings {
        base_url: format!("{}/v1", server.uri()),
        ..EnrichmentSettings::default()
    }
}

fn request_for(title: &str) -> EnrichmentRequest {
    EnrichmentRequest::for_record(&Record::new(title), "Summarize.")
}

fn completion(content: &str) -> Value {
    json!({
        "choices": [
            { "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    })
}

#[tokio::test]
async fn completion_request_carries_key_model_and_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token("test-key"))
        .and(body_partial_json(json!({ "model": "gpt-4", "max_tokens": 512, "n": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  {\"summary\": \"ok\"}  ")))
        .expect(1)
        .mount(&server)
        .await;
    let client = ChatCompletionClient::new(&enrichment_settings(&server), "test-key").unwrap();

    let text = client.enrich(&request_for("Soil carbon")).await.unwrap();
    assert_eq!(text, "{\"summary\": \"ok\"}");

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.starts_with("Summarize.\n\nTitle: Soil carbon"));
}

#[tokio::test]
async fn completion_error_status_is_reported_with_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("{\"error\":\"slow down\"}"))
        .mount(&server)
        .await;
    let client = ChatCompletionClient::new(&enrichment_settings(&server), "k").unwrap();

    let err = client.enrich(&request_for("A")).await.unwrap_err();

    match err {
        ServiceError::Status { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("slow down"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn completion_without_choices_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;
    let client = ChatCompletionClient::new(&enrichment_settings(&server), "k").unwrap();

    let err = client.enrich(&request_for("A")).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse(_)));
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    let settings = EnrichmentSettings {
        timeout_secs: 1,
        ..enrichment_settings(&server)
    };
    let client = ChatCompletionClient::new(&settings, "k").unwrap();

    let err = client.enrich(&request_for("A")).await.unwrap_err();
    assert_eq!(err, ServiceError::Timeout(Duration::from_secs(1)));
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let settings = EnrichmentSettings {
        base_url: "http://127.0.0.1:9/v1".to_string(),
        timeout_secs: 5,
        ..EnrichmentSettings::default()
    };
    let client = ChatCompletionClient::new(&settings, "k").unwrap();

    let err = client.enrich(&request_for("A")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)));
}

fn search_settings(server: &MockServer) -> SearchSettings {
    SearchSettings {
        base_url: format!("{}{}", server.uri(), SCOPUS_PATH),
        ..SearchSettings::default()
    }
}

#[tokio::test]
async fn scopus_search_sends_key_and_query() {
    let server = MockServer::start().await;
    let body = json!({
        "search-results": {
            "entry": [
                { "dc:title": "Cover crops", "dc:creator": "Smith J.", "prism:coverDate": "2021-05-01" },
                { "dc:title": "Tillage" }
            ]
        }
    });
    Mock::given(method("GET"))
        .and(path(SCOPUS_PATH))
        .and(header("X-ELS-APIKey", "els-key"))
        .and(header("Accept", "application/json"))
        .and(query_param("query", "TITLE-ABS-KEY(\"cover crops\") AND SUBJAREA(AGRI)"))
        .and(query_param("count", "2"))
        .and(query_param("view", "STANDARD"))
        .and(query_param("sort", "citedby-count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;
    let client = ScopusClient::new(&search_settings(&server), "els-key").unwrap();
    let query = SearchQuery::new("cover crops")
        .with_count(2)
        .with_subject(Some("AGRI".to_string()));

    let records = client.search(&query).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "Cover crops");
    assert_eq!(records[0].publication_date, "2021-05-01");
    assert_eq!(records[1].authors, "N/A");
}

#[tokio::test]
async fn scopus_rejection_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SCOPUS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"bad key\"}"))
        .mount(&server)
        .await;
    let client = ScopusClient::new(&search_settings(&server), "wrong").unwrap();

    let err = client.search(&SearchQuery::new("x")).await.unwrap_err();

    assert!(matches!(err, SearchError::Status { status: 401, .. }));
    assert!(err.to_string().contains("401"));
}

#[cfg(feature = "live_api")]
mod live {
    use super::*;
    use litreview::{Config, Credentials, Pipeline};
    use std::sync::Arc;

    #[tokio::test]
    async fn live_search_and_enrichment() {
        let config = Config::default();
        let credentials = Credentials::from_env();
        let search = ScopusClient::new(&config.search, credentials.elsevier().unwrap()).unwrap();
        let records = search
            .search(&SearchQuery::new("cover crops").with_count(2))
            .await
            .unwrap();
        assert!(!records.is_empty());

        let client = ChatCompletionClient::new(&config.enrichment, credentials.openai().unwrap()).unwrap();
        let pipeline = Pipeline::new(Arc::new(client), &config);
        let rows = pipeline.enrich(&records).await;

        assert_eq!(rows.len(), records.len());
        println!("{:#?}", rows);
    }
}
