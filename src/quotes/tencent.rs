//! Tencent quote endpoint adapter (`qt.gtimg.cn`)

use crate::config::QuoteConfig;
use crate::error::{AppError, Result};
use crate::quotes::decode::decode_body;
use crate::quotes::parser::{self, JSON_KEY_PREFIX};
use crate::quotes::types::QuoteSnapshot;
use crate::quotes::QuoteSource;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::collections::HashMap;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Quote source backed by the Tencent finance HTTP endpoint
pub struct TencentQuoteSource {
    client: Client,
    base_url: String,
}

impl TencentQuoteSource {
    pub fn new(config: &QuoteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.8,en;q=0.6"));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn single_url(&self, code: &str) -> String {
        format!("{}/q={}", self.base_url, code.to_lowercase())
    }

    fn batch_url(&self, codes: &[String]) -> String {
        let keys: Vec<String> = codes
            .iter()
            .map(|c| format!("{}{}", JSON_KEY_PREFIX, c.to_lowercase()))
            .collect();
        format!("{}/q={}&fmt=json", self.base_url, keys.join(","))
    }

    /// GET `url` and return the raw body; any transport failure, timeout or
    /// non-success status is `UpstreamUnavailable`
    async fn get_bytes(&self, url: &str, accept: &'static str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Reading {} failed: {}", url, e)))?;

        Ok(body.to_vec())
    }
}

#[async_trait]
impl QuoteSource for TencentQuoteSource {
    fn id(&self) -> &'static str {
        "tencent"
    }

    async fn fetch_one(&self, code: &str) -> Result<QuoteSnapshot> {
        let url = self.single_url(code);
        let bytes = self.get_bytes(&url, "text/html,*/*;q=0.8").await?;
        let body = decode_body(&bytes);

        let quote = parser::parse_text_record(code, &body)?;

        tracing::debug!(
            code = %code,
            name = %quote.name,
            price = ?quote.price,
            yesterday_close = ?quote.yesterday_close,
            "Fetched single quote"
        );

        Ok(quote)
    }

    async fn fetch_batch(&self, codes: &[String]) -> Result<HashMap<String, QuoteSnapshot>> {
        let mut unique: Vec<String> = Vec::with_capacity(codes.len());
        for code in codes {
            if !unique.iter().any(|c| c.eq_ignore_ascii_case(code)) {
                unique.push(code.clone());
            }
        }

        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.batch_url(&unique);
        let bytes = self.get_bytes(&url, "application/json").await?;
        let body = decode_body(&bytes);

        let quotes = parser::parse_json_batch(&unique, &body)?;

        tracing::debug!(
            requested = unique.len(),
            received = quotes.len(),
            "Fetched batch quotes"
        );

        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quotes::parser::tests::{record, text_body};
    use axum::{http::StatusCode, http::Uri, response::IntoResponse, Router};
    use std::time::Duration;

    /// Serve `handler` on an ephemeral local port and return its base URL
    async fn spawn_provider<F>(handler: F) -> String
    where
        F: Fn(String) -> (StatusCode, Vec<u8>) + Clone + Send + Sync + 'static,
    {
        let app = Router::new().fallback(move |uri: Uri| {
            let handler = handler.clone();
            async move { handler(uri.path().to_string()).into_response() }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn source(base_url: String, timeout: Duration) -> TencentQuoteSource {
        TencentQuoteSource::new(&QuoteConfig { base_url, timeout }).unwrap()
    }

    #[test]
    fn test_urls() {
        let src = source("https://qt.gtimg.cn/".to_string(), Duration::from_secs(10));
        assert_eq!(src.single_url("SH600000"), "https://qt.gtimg.cn/q=sh600000");
        assert_eq!(
            src.batch_url(&["sh600000".to_string(), "SZ000001".to_string()]),
            "https://qt.gtimg.cn/q=r_sh600000,r_sz000001&fmt=json"
        );
    }

    #[tokio::test]
    async fn test_fetch_one_gbk_body() {
        let base = spawn_provider(|path| {
            assert_eq!(path, "/q=sh600000");
            let text = text_body("sh600000", &record("浦发银行", "10.00", "9.50", 50));
            let (gbk, _, _) = encoding_rs::GBK.encode(&text);
            (StatusCode::OK, gbk.into_owned())
        })
        .await;

        let quote = source(base, Duration::from_secs(5))
            .fetch_one("SH600000")
            .await
            .unwrap();

        assert_eq!(quote.code, "SH600000");
        assert_eq!(quote.name, "浦发银行");
        assert_eq!(quote.price, Some(10.0));
        assert_eq!(quote.yesterday_close, Some(9.5));
    }

    #[tokio::test]
    async fn test_fetch_one_malformed() {
        let base = spawn_provider(|_| (StatusCode::OK, b"v_pv_none_match=\"1\";".to_vec())).await;

        let err = source(base, Duration::from_secs(5))
            .fetch_one("sh999999")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_one_server_error() {
        let base = spawn_provider(|_| (StatusCode::BAD_GATEWAY, Vec::new())).await;

        let err = source(base, Duration::from_secs(5))
            .fetch_one("sh600000")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_batch_partial() {
        let base = spawn_provider(|path| {
            assert_eq!(path, "/q=r_sh600000,r_sz000001,r_sz000002&fmt=json");
            let body = serde_json::json!({
                "r_sh600000": record("浦发银行", "10.00", "9.50", 45),
                "r_sz000001": record("平安银行", "12.00", "11.80", 45),
            });
            (StatusCode::OK, body.to_string().into_bytes())
        })
        .await;

        let codes = vec![
            "sh600000".to_string(),
            "sz000001".to_string(),
            "sz000002".to_string(),
            "SH600000".to_string(),
        ];
        let quotes = source(base, Duration::from_secs(5))
            .fetch_batch(&codes)
            .await
            .unwrap();

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes["sh600000"].price, Some(10.0));
        assert_eq!(quotes["sz000001"].yesterday_close, Some(11.8));
        assert!(!quotes.contains_key("sz000002"));
    }

    #[tokio::test]
    async fn test_fetch_batch_empty_makes_no_request() {
        // Nothing listens on this port
        let src = source("http://127.0.0.1:9".to_string(), Duration::from_secs(1));
        assert!(src.fetch_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_batch_unreachable() {
        let src = source("http://127.0.0.1:9".to_string(), Duration::from_secs(1));
        let err = src.fetch_batch(&["sh600000".to_string()]).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_silent_provider_hits_timeout() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let src = source(format!("http://{}", addr), Duration::from_millis(300));

        let started = std::time::Instant::now();
        let err = src.fetch_batch(&["sh600000".to_string()]).await.unwrap_err();
        let elapsed = started.elapsed();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)), "{}", err);
        assert!(elapsed >= Duration::from_millis(250), "returned after {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "returned after {:?}", elapsed);

        let started = std::time::Instant::now();
        let err = src.fetch_one("sh600000").await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)), "{}", err);
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
