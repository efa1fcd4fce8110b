use explorer_upstream::{HttpUpstreamClient, UpstreamClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetch_samples_parses_a_successful_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"Date": "2024-01-01T00:00:00Z", "Value": 1.0},
            {"Date": "2024-01-01T00:00:01Z", "Value": 2.0},
        ])))
        .mount(&server)
        .await;

    let client = HttpUpstreamClient::new(server.uri());
    let samples = client.fetch_samples("A", 0, 10).await;
    assert_eq!(samples.len(), 2);
}

#[tokio::test]
async fn fetch_samples_returns_empty_on_transport_failure() {
    let client = HttpUpstreamClient::new("http://127.0.0.1:1".to_string());
    let samples = client.fetch_samples("A", 0, 10).await;
    assert!(samples.is_empty());
}

#[tokio::test]
async fn fetch_taglist_parses_a_successful_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/taglist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"Tag": "A.B", "Unit": "V", "RegisterDataType": "Single"},
        ])))
        .mount(&server)
        .await;

    let client = HttpUpstreamClient::new(server.uri());
    let tags = client.fetch_taglist().await;
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].tag, "A.B");
}
