// src/sys/bearer.rs

use std::io;
use std::path::Path;

use tokio::fs;

use crate::error::BearerTokenError;
use crate::sys::secrets::SecretToken;

/// Reads the whole bearer token file as the token, byte for byte.
///
/// Projected service-account tokens are symlinks into a `..data` directory that
/// the kubelet swaps atomically, and their reported size is not trusted, so the
/// file is read to EOF rather than sized from metadata. Content is not trimmed.
pub async fn read_bearer_token(path: &Path) -> Result<SecretToken, BearerTokenError> {
    let bytes = fs::read(path).await.map_err(|source| BearerTokenError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if bytes.is_empty() {
        return Err(BearerTokenError::Empty {
            path: path.to_path_buf(),
        });
    }

    // The token travels in a JSON string, so it has to be UTF-8.
    let token = String::from_utf8(bytes).map_err(|e| {
        let mut raw = e.into_bytes();
        zeroize::Zeroize::zeroize(&mut raw);
        BearerTokenError::Read {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, "bearer token is not valid UTF-8"),
        }
    })?;

    let token = SecretToken::new(token);
    tracing::debug!(path = %path.display(), bytes = token.len(), "loaded bearer token");
    Ok(token)
}
