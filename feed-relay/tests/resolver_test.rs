use feed_relay::{GoogleNewsResolver, LinkResolver, ResolverConfig};
use std::sync::Once;
use tracing::info;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init()
            .ok();
    });
}

const TOKEN: &str = "CBMiTestToken";
const SOURCE_URL: &str = "https://news.google.com/rss/articles/CBMiTestToken?oc=5";
const DESTINATION: &str = "https://www.polygon.com/critical-role-news";

fn article_page(signature: &str, timestamp: &str) -> String {
    format!(
        r#"<html><body><c-wiz><div jscontroller="aLI87" data-n-a-sg="{}" data-n-a-ts="{}"></div></c-wiz></body></html>"#,
        signature, timestamp
    )
}

fn batch_response(url: &str) -> String {
    let inner = serde_json::json!(["garturlres", url, 1]).to_string();
    let envelope = serde_json::json!([["wrb.fr", "Fbv4je", inner, null, null, null, "generic"]]);
    format!(")]}}'\n\n{}", envelope)
}

fn resolver_for(server: &MockServer) -> GoogleNewsResolver {
    let config = ResolverConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
        ..ResolverConfig::default()
    };
    GoogleNewsResolver::new(&config).unwrap()
}

async fn mount_rpc(server: &MockServer, body: String, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/_/DotsSplashUi/data/batchexecute"))
        .and(body_string_contains("f.req="))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_resolves_through_primary_page() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/articles/{}", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("SIG", "1700000000")))
        .expect(1)
        .mount(&server)
        .await;
    mount_rpc(&server, batch_response(DESTINATION), 1).await;

    let resolved = resolver_for(&server).resolve(SOURCE_URL).await;
    info!("Resolved to {}", resolved);
    assert_eq!(resolved, DESTINATION);
}

#[tokio::test]
async fn test_falls_back_to_rss_page() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/articles/{}", TOKEN)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/rss/articles/{}", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("SIG", "1700000000")))
        .expect(1)
        .mount(&server)
        .await;
    mount_rpc(&server, batch_response(DESTINATION), 1).await;

    assert_eq!(resolver_for(&server).resolve(SOURCE_URL).await, DESTINATION);
}

#[tokio::test]
async fn test_both_pages_failing_keeps_original() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_rpc(&server, batch_response(DESTINATION), 0).await;

    assert_eq!(resolver_for(&server).resolve(SOURCE_URL).await, SOURCE_URL);
}

#[tokio::test]
async fn test_page_without_params_keeps_original() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>consent wall</body></html>"))
        .mount(&server)
        .await;
    mount_rpc(&server, batch_response(DESTINATION), 0).await;

    assert_eq!(resolver_for(&server).resolve(SOURCE_URL).await, SOURCE_URL);
}

#[tokio::test]
async fn test_empty_params_keep_original() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/articles/{}", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("", "")))
        .mount(&server)
        .await;
    mount_rpc(&server, batch_response(DESTINATION), 0).await;

    assert_eq!(resolver_for(&server).resolve(SOURCE_URL).await, SOURCE_URL);
}

#[tokio::test]
async fn test_unexpected_rpc_shape_keeps_original() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/articles/{}", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("SIG", "1700000000")))
        .mount(&server)
        .await;
    mount_rpc(&server, ")]}'\n\n[[\"er\",null,null]]".to_string(), 1).await;

    assert_eq!(resolver_for(&server).resolve(SOURCE_URL).await, SOURCE_URL);
}

#[tokio::test]
async fn test_rpc_error_status_keeps_original() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/articles/{}", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("SIG", "1700000000")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(resolver_for(&server).resolve(SOURCE_URL).await, SOURCE_URL);
}

#[tokio::test]
async fn test_non_redirect_links_skip_the_network() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    for url in ["https://variety.com/story", "https://news.google.com/topics/abc", "url"] {
        assert_eq!(resolver.resolve(url).await, url);
    }
}
