//! Quote source adapters

mod decode;
mod parser;
pub mod tencent;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub use decode::decode_body;
pub use tencent::TencentQuoteSource;
pub use types::{percent_change, QuoteSnapshot};

/// External market-data provider
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Provider ID (e.g., "tencent")
    fn id(&self) -> &'static str;

    /// Fetch one code. Fails with `MalformedResponse` when the record is
    /// short or its price or previous close is not numeric, and with
    /// `UpstreamUnavailable` on network errors or timeouts.
    async fn fetch_one(&self, code: &str) -> Result<QuoteSnapshot>;

    /// Fetch many codes in one request, keyed by the caller's code.
    ///
    /// Codes without usable data are absent from the map; that is not an
    /// error. A network failure fails the whole call.
    async fn fetch_batch(&self, codes: &[String]) -> Result<HashMap<String, QuoteSnapshot>>;
}
