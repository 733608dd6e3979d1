//! Unpadded base64url, as used by `SKI` and `routerPublicKey`.

use base64::{engine::general_purpose::STANDARD, Engine as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Base64UrlError {
    #[error("base64url strings must not contain padding ('=')")]
    PaddingPresent,
    #[error("invalid base64 after alphabet translation")]
    InvalidAlphabet,
    #[error("decoded to zero bytes")]
    Empty,
}

/// Decode `-`/`_`-alphabet base64 with no trailing `=`, by translating
/// to the standard alphabet and padding out to a multiple of 4 before
/// delegating to the standard decoder.
pub fn decode(s: &str) -> Result<Vec<u8>, Base64UrlError> {
    if s.contains('=') {
        return Err(Base64UrlError::PaddingPresent);
    }

    let mut translated: String = s.chars().map(|c| match c {
        '-' => '+',
        '_' => '/',
        other => other,
    }).collect();

    let pad = (4 - translated.len() % 4) % 4;
    translated.extend(std::iter::repeat('=').take(pad));

    let bytes = STANDARD.decode(translated.as_bytes()).map_err(|_| Base64UrlError::InvalidAlphabet)?;
    if bytes.is_empty() {
        return Err(Base64UrlError::Empty);
    }
    Ok(bytes)
}
