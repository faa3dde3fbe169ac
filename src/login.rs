// src/login.rs

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::LoginError;
use crate::sys::bearer::read_bearer_token;
use crate::sys::exchange::exchange;
use crate::sys::sink::{TOKEN_FILE_MODE, write_file_with_perms};
use crate::sys::traits::{AclLoginClient, LoginOptions};

/// Read the bearer token, log in to Consul with it, and write the resulting
/// SecretID to `token_sink_file` with mode 0600.
///
/// Strictly linear: the first failing stage ends the run and its error is
/// returned with the stage named. Nothing is retried here.
pub async fn consul_login(
    client: &dyn AclLoginClient,
    bearer_token_file: &Path,
    auth_method: &str,
    token_sink_file: &Path,
    options: &LoginOptions,
    meta: &BTreeMap<String, String>,
) -> Result<(), LoginError> {
    // 1. Credential source
    let bearer_token = read_bearer_token(bearer_token_file).await?;

    // 2. Remote exchange (exactly one login call)
    let secret_id = exchange(client, &bearer_token, auth_method, meta, options).await?;
    drop(bearer_token);

    // 3. 🛡️ Local persistence. Synchronous on purpose: the exposed SecretID
    // must not be held across an `.await`.
    secret_id.use_secret(|secret| write_file_with_perms(token_sink_file, secret, TOKEN_FILE_MODE))?;

    tracing::info!(
        auth_method,
        token_sink_file = %token_sink_file.display(),
        "acl token written to sink"
    );
    Ok(())
}
