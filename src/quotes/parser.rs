//! Positional quote record parsing
//!
//! Both the single-code text format (`v_sh600000="1~name~code~price~..."`)
//! and the multi-code JSON format (`{"r_sh600000": ["1", "name", ...]}`)
//! carry the same positional record. One field table serves both.

use crate::error::{AppError, Result};
use crate::quotes::types::QuoteSnapshot;
use serde_json::Value;
use std::collections::HashMap;

/// Field positions in a provider record
pub mod field {
    pub const NAME: usize = 1;
    pub const PRICE: usize = 3;
    pub const YESTERDAY_CLOSE: usize = 4;
    pub const OPEN: usize = 5;
    pub const QUOTE_TIME: usize = 30;
    pub const HIGH: usize = 33;
    pub const LOW: usize = 34;
    pub const VOLUME: usize = 36;
    pub const AMOUNT: usize = 37;
}

/// Minimum field count of a single-code text record
pub const MIN_TEXT_FIELDS: usize = 40;

/// Minimum element count of a multi-code JSON record
pub const MIN_JSON_FIELDS: usize = field::AMOUNT + 1;

/// Key prefix the provider uses for JSON records
pub const JSON_KEY_PREFIX: &str = "r_";

fn numeric(fields: &[Option<String>], index: usize) -> Option<f64> {
    fields
        .get(index)?
        .as_deref()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn text(fields: &[Option<String>], index: usize) -> Option<String> {
    fields
        .get(index)?
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build a snapshot from positional fields. Missing or non-numeric
/// positions become `None`.
fn snapshot_from_fields(code: &str, fields: &[Option<String>]) -> QuoteSnapshot {
    QuoteSnapshot {
        code: code.to_string(),
        name: text(fields, field::NAME).unwrap_or_default(),
        price: numeric(fields, field::PRICE),
        yesterday_close: numeric(fields, field::YESTERDAY_CLOSE),
        open: numeric(fields, field::OPEN),
        high: numeric(fields, field::HIGH),
        low: numeric(fields, field::LOW),
        volume: numeric(fields, field::VOLUME),
        amount: numeric(fields, field::AMOUNT),
        quote_time: text(fields, field::QUOTE_TIME),
    }
}

/// Parse a single-code `~`-delimited record.
///
/// Fails with `MalformedResponse` when the record is too short or when the
/// price or previous close is not numeric.
pub fn parse_text_record(code: &str, body: &str) -> Result<QuoteSnapshot> {
    let fields: Vec<Option<String>> = body.split('~').map(|f| Some(f.to_string())).collect();

    if fields.len() < MIN_TEXT_FIELDS {
        return Err(AppError::MalformedResponse(format!(
            "{}: expected at least {} fields, got {}",
            code,
            MIN_TEXT_FIELDS,
            fields.len()
        )));
    }

    let snapshot = snapshot_from_fields(code, &fields);

    if snapshot.price.is_none() {
        return Err(AppError::MalformedResponse(format!("{}: price is not numeric", code)));
    }
    if snapshot.yesterday_close.is_none() {
        return Err(AppError::MalformedResponse(format!(
            "{}: previous close is not numeric",
            code
        )));
    }

    Ok(snapshot)
}

fn value_to_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a multi-code JSON response.
///
/// Codes that are missing, not arrays, or shorter than [`MIN_JSON_FIELDS`]
/// are left out of the result. Only a body that is not a JSON object is an error.
pub fn parse_json_batch(codes: &[String], body: &str) -> Result<HashMap<String, QuoteSnapshot>> {
    let root: Value = serde_json::from_str(body.trim())
        .map_err(|e| AppError::MalformedResponse(format!("Invalid batch JSON: {}", e)))?;

    let records = root
        .as_object()
        .ok_or_else(|| AppError::MalformedResponse("Batch response is not an object".to_string()))?;

    let mut result = HashMap::with_capacity(codes.len());

    for code in codes {
        let key = format!("{}{}", JSON_KEY_PREFIX, code.to_lowercase());

        let Some(array) = records.get(&key).and_then(Value::as_array) else {
            tracing::debug!(code = %code, "No quote record in batch response");
            continue;
        };

        if array.len() < MIN_JSON_FIELDS {
            tracing::debug!(code = %code, fields = array.len(), "Quote record too short, skipping");
            continue;
        }

        let fields: Vec<Option<String>> = array.iter().map(value_to_field).collect();
        result.insert(code.clone(), snapshot_from_fields(code, &fields));
    }

    Ok(result)
}
