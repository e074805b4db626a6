//! Response body decoding
//!
//! The provider answers in UTF-8 or, for some endpoints, GBK.

use std::borrow::Cow;

/// Decode a response body to text without ever failing.
///
/// Valid UTF-8 is returned as-is. Anything else is transcoded from GBK; if
/// that also hits malformed sequences the raw bytes are decoded lossily.
pub fn decode_body(bytes: &[u8]) -> Cow<'_, str> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(text);
    }

    let (decoded, had_errors) = encoding_rs::GBK.decode_without_bom_handling(bytes);
    if !had_errors {
        return decoded;
    }

    tracing::debug!("Quote response is neither UTF-8 nor GBK, decoding lossily");
    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        let body = "v_sh600000=\"1~浦发银行~600000\";".as_bytes();
        assert!(matches!(decode_body(body), Cow::Borrowed(_)));
        assert_eq!(decode_body(body), "v_sh600000=\"1~浦发银行~600000\";");
    }

    #[test]
    fn test_gbk_is_transcoded() {
        let (gbk, _, unmappable) = encoding_rs::GBK.encode("1~浦发银行~600000");
        assert!(!unmappable);
        assert!(std::str::from_utf8(&gbk).is_err());

        assert_eq!(decode_body(&gbk), "1~浦发银行~600000");
    }

    #[test]
    fn test_undecodable_bytes_fall_back() {
        // 0xFF is neither valid UTF-8 nor a GBK lead byte
        let body = [b'1', b'~', 0xFF, b'~', b'3'];
        let text = decode_body(&body);
        assert!(text.starts_with("1~"));
        assert!(text.ends_with("~3"));
    }
}
