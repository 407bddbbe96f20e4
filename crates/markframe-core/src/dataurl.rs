//! `data:` URL encoding.

use base64::{engine::general_purpose, Engine as _};

use crate::error::{MarkframeError, MarkframeResult};

/// Encode `bytes` as `data:<mime>;base64,<payload>`.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// Decode a base64 data URL into its MIME type and bytes.
pub fn decode_data_url(url: &str) -> MarkframeResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| MarkframeError::InvalidDataUrl("missing data: scheme".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| MarkframeError::InvalidDataUrl("missing payload separator".into()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| MarkframeError::InvalidDataUrl("only base64 payloads are supported".into()))?;
    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| MarkframeError::InvalidDataUrl(e.to_string()))?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let url = to_data_url("image/png", b"\x89PNG");
        assert_eq!(url, "data:image/png;base64,iVBORw==");
        let (mime, bytes) = decode_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"\x89PNG");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "image/png;base64,AA==",
            "data:image/png;base64",
            "data:text/plain,hello",
            "data:image/png;base64,@@@",
        ] {
            assert!(
                matches!(decode_data_url(bad), Err(MarkframeError::InvalidDataUrl(_))),
                "{bad} should be rejected"
            );
        }
    }
}
