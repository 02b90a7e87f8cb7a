use crate::types::{LinkResolver, ResolverConfig, Result};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const REDIRECT_HOST: &str = "news.google.com";
const TOKEN_SEGMENTS: &[&str] = &["articles", "read"];
const PARAMS_SELECTOR: &str = "c-wiz > div[jscontroller]";
const SIGNATURE_ATTR: &str = "data-n-a-sg";
const TIMESTAMP_ATTR: &str = "data-n-a-ts";
const BATCH_PATH: &str = "/_/DotsSplashUi/data/batchexecute";
const RPC_ID: &str = "Fbv4je";

#[derive(Debug, thiserror::Error)]
enum ResolveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("decoding attributes not found in page")]
    MissingParams,

    #[error("unexpected response shape: {0}")]
    Shape(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Signature and timestamp scraped from the article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodingParams {
    pub signature: String,
    pub timestamp: String,
}

impl DecodingParams {
    fn is_empty(&self) -> bool {
        self.signature.is_empty() && self.timestamp.is_empty()
    }
}

/// Opaque article token of a news redirect link, if the link has that shape.
pub fn extract_token(source_url: &str) -> Option<String> {
    let url = Url::parse(source_url).ok()?;
    if url.host_str()? != REDIRECT_HOST {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.collect();
    if segments.len() < 2 {
        return None;
    }
    let marker = segments[segments.len() - 2];
    let token = segments[segments.len() - 1];
    (TOKEN_SEGMENTS.contains(&marker) && !token.is_empty()).then(|| token.to_string())
}

/// Read the decoding attributes off an article page.
pub fn parse_params(html: &str) -> Option<DecodingParams> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(PARAMS_SELECTOR).ok()?;
    let element = document.select(&selector).next()?;
    Some(DecodingParams {
        signature: element.value().attr(SIGNATURE_ATTR).unwrap_or_default().to_string(),
        timestamp: element.value().attr(TIMESTAMP_ATTR).unwrap_or_default().to_string(),
    })
}

/// Form body of the batch RPC call.
pub fn batch_request_body(token: &str, params: &DecodingParams) -> String {
    let request = format!(
        r#"["garturlreq",[["X","X",["X","X"],null,null,1,1,"US:en",null,1,null,null,null,null,null,0,1],"X","X",1,[1,1,1],1,1,null,0,0,null,0],"{}",{},"{}"]"#,
        token, params.timestamp, params.signature
    );
    let envelope = json!([[[RPC_ID, request]]]);
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("f.req", &envelope.to_string())
        .finish()
}

/// Pull the decoded URL out of a batch RPC response.
///
/// The response is a guard line, a blank line, then a JSON array whose first
/// row carries the RPC result as a JSON-encoded string at index 2. That inner
/// array holds the URL at index 1.
fn parse_batch_response(body: &str) -> std::result::Result<String, ResolveError> {
    let payload = body
        .split("\n\n")
        .nth(1)
        .ok_or(ResolveError::Shape("missing envelope body"))?;
    let envelope: Value = serde_json::from_str(payload)?;
    let inner = envelope
        .get(0)
        .and_then(|row| row.get(2))
        .and_then(Value::as_str)
        .ok_or(ResolveError::Shape("missing rpc result"))?;
    let result: Value = serde_json::from_str(inner)?;
    result
        .get(1)
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or(ResolveError::Shape("missing decoded url"))
}

/// Decodes obfuscated news aggregator links by scraping the article page for
/// a signature and trading it for the destination in one batch RPC.
pub struct GoogleNewsResolver {
    client: Client,
    base_url: String,
}

impl GoogleNewsResolver {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        Url::parse(&config.base_url)?;

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Best effort: any failure returns `source_url` unchanged.
    pub async fn decode(&self, source_url: &str) -> String {
        let Some(token) = extract_token(source_url) else {
            debug!("Not a redirect link, keeping: {}", source_url);
            return source_url.to_string();
        };

        let Some(params) = self.fetch_params(&token).await else {
            return source_url.to_string();
        };

        match self.request_decoded(&token, &params).await {
            Ok(decoded) => {
                info!("Resolved {} -> {}", source_url, decoded);
                decoded
            }
            Err(e) => {
                warn!("Could not decode {}: {}", source_url, e);
                source_url.to_string()
            }
        }
    }

    async fn fetch_params(&self, token: &str) -> Option<DecodingParams> {
        let primary = format!("{}/articles/{}", self.base_url, token);
        let params = match self.scrape_params(&primary).await {
            Ok(params) => params,
            Err(e) => {
                debug!("Article page scrape failed ({}), trying the RSS page", e);
                let secondary = format!("{}/rss/articles/{}", self.base_url, token);
                match self.scrape_params(&secondary).await {
                    Ok(params) => params,
                    Err(e) => {
                        warn!("Could not get decoding params for token {}: {}", token, e);
                        return None;
                    }
                }
            }
        };

        if params.is_empty() {
            warn!("Decoding params for token {} are empty", token);
            return None;
        }
        Some(params)
    }

    async fn scrape_params(&self, url: &str) -> std::result::Result<DecodingParams, ResolveError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status));
        }
        let html = response.text().await?;
        parse_params(&html).ok_or(ResolveError::MissingParams)
    }

    async fn request_decoded(&self, token: &str, params: &DecodingParams) -> std::result::Result<String, ResolveError> {
        let url = format!("{}{}", self.base_url, BATCH_PATH);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded;charset=UTF-8")
            .body(batch_request_body(token, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status));
        }
        let body = response.text().await?;
        parse_batch_response(&body)
    }
}

#[async_trait]
impl LinkResolver for GoogleNewsResolver {
    async fn resolve(&self, url: &str) -> String {
        self.decode(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "CBMigwFBVV95cUxOTFpsQlJPS2VUR2d6R2F4X1ZBRUpab3lNM2NsSGJlQ3JTdjN3NGEzMFNBUFgxajROWnJwOUI1cmVBdnNqUDg4WWlBblNNQ1pwdG9hOEdoY0pjZmd6RXJ4bTZTZjlFSk54akVyZmxrbzZpdnlncVppSmZaSmlXTGdFR1JKdw";

    #[test]
    fn test_extract_token_from_rss_link() {
        let url = format!("https://news.google.com/rss/articles/{}?oc=5", TOKEN);
        assert_eq!(extract_token(&url), Some(TOKEN.to_string()));
        assert_eq!(extract_token("https://news.google.com/read/abc"), Some("abc".to_string()));
    }

    #[test]
    fn test_extract_token_rejects_other_shapes() {
        assert_eq!(extract_token("https://example.com/rss/articles/abc"), None);
        assert_eq!(extract_token("https://news.google.com/topics/abc"), None);
        assert_eq!(extract_token("https://news.google.com/articles/"), None);
        assert_eq!(extract_token("not a url"), None);
        assert_eq!(extract_token("url"), None);
    }

    #[test]
    fn test_parse_params() {
        let html = r#"<html><body><c-wiz><div jscontroller="x" data-n-a-sg="SIG" data-n-a-ts="1700000000"></div></c-wiz></body></html>"#;
        assert_eq!(
            parse_params(html),
            Some(DecodingParams {
                signature: "SIG".to_string(),
                timestamp: "1700000000".to_string(),
            })
        );
        assert_eq!(parse_params("<html><body><div jscontroller></div></body></html>"), None);
    }

    #[test]
    fn test_batch_request_body_embeds_params() {
        let params = DecodingParams {
            signature: "SIG".to_string(),
            timestamp: "1700000000".to_string(),
        };
        let body = batch_request_body("TOKEN", &params);
        assert!(body.starts_with("f.req="));

        let decoded: String = url::form_urlencoded::parse(body.as_bytes())
            .find(|(key, _)| key == "f.req")
            .map(|(_, value)| value.into_owned())
            .unwrap();
        let envelope: Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(envelope[0][0][0], "Fbv4je");
        let request: Value = serde_json::from_str(envelope[0][0][1].as_str().unwrap()).unwrap();
        assert_eq!(request[0], "garturlreq");
        assert_eq!(request[2], "TOKEN");
        assert_eq!(request[3], 1700000000);
        assert_eq!(request[4], "SIG");
    }

    #[test]
    fn test_parse_batch_response() {
        let body = ")]}'\n\n[[\"wrb.fr\",\"Fbv4je\",\"[\\\"garturlres\\\",\\\"https://mashable.com/article/x\\\",1]\",null,null,null,\"generic\"],[\"di\",10],[\"af.httprm\",10,\"1\",9]]";
        assert_eq!(parse_batch_response(body).unwrap(), "https://mashable.com/article/x");
    }

    #[test]
    fn test_parse_batch_response_shape_errors() {
        assert!(parse_batch_response("no separator").is_err());
        assert!(parse_batch_response(")]}'\n\nnot json").is_err());
        assert!(parse_batch_response(")]}'\n\n[[\"wrb.fr\",\"Fbv4je\",null]]").is_err());
        assert!(parse_batch_response(")]}'\n\n[[\"wrb.fr\",\"Fbv4je\",\"[\\\"garturlres\\\"]\"]]").is_err());
    }

    #[tokio::test]
    async fn test_decode_returns_non_matching_url_unchanged() {
        let resolver = GoogleNewsResolver::new(&ResolverConfig::default()).unwrap();
        assert_eq!(resolver.decode("https://example.com/story").await, "https://example.com/story");
        assert_eq!(resolver.decode("url").await, "url");
    }
}
