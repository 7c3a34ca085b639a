//! SASL PLAIN payload encoding (RFC 4616).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Largest payload chunk one `AUTHENTICATE` line may carry.
pub const SASL_CHUNK_SIZE: usize = 400;

/// Encode `NUL account NUL password` as base64 with an empty authzid.
pub fn encode_plain(account: &str, password: &str) -> String {
    BASE64.encode(format!("\0{account}\0{password}"))
}

/// Split an encoded payload into `AUTHENTICATE` arguments.
///
/// A payload whose length is an exact multiple of the chunk size is
/// terminated with a lone `+`.
pub fn chunk_payload(encoded: &str) -> Vec<String> {
    let mut chunks: Vec<String> = encoded
        .as_bytes()
        .chunks(SASL_CHUNK_SIZE)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect();
    if encoded.is_empty() || encoded.len() % SASL_CHUNK_SIZE == 0 {
        chunks.push("+".to_string());
    }
    chunks
}
