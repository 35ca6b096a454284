//! The text-safe transport encoder: URL-safe base64 without padding.
//!
//! The encoded text is handed back as bytes so it can feed a following
//! compression stage directly.

use crate::error::AssetRatioError;

/// Encodes arbitrary bytes into the URL-safe, padding-free base64 alphabet and
/// returns the ASCII text as bytes.
pub fn encode(input_bytes: &[u8]) -> Vec<u8> {
    base64_url::encode(input_bytes).into_bytes()
}

/// Decodes URL-safe base64 text back into the original bytes.
pub fn decode(input_bytes: &[u8]) -> Result<Vec<u8>, AssetRatioError> {
    base64_url::decode(input_bytes).map_err(|e| AssetRatioError::Encoding(e.to_string()))
}

//==================================================================================
// Unit Tests
//==================================================================================
