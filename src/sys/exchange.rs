// src/sys/exchange.rs

use std::collections::BTreeMap;

use crate::error::AuthError;
use crate::sys::secrets::SecretToken;
use crate::sys::traits::{AclLoginClient, LoginOptions, LoginRequest};

/// Trades the bearer token for an ACL token with exactly one login call and
/// returns its SecretID.
///
/// Every call mints a new token on the Consul side, so callers must not invoke
/// this twice expecting the same SecretID back.
pub async fn exchange(
    client: &dyn AclLoginClient,
    bearer_token: &SecretToken,
    auth_method: &str,
    meta: &BTreeMap<String, String>,
    options: &LoginOptions,
) -> Result<SecretToken, AuthError> {
    let request = LoginRequest {
        auth_method: auth_method.to_string(),
        bearer_token: bearer_token.use_secret(str::to_owned),
        meta: meta.clone(),
    };

    let response = client.login(&request, options).await?;

    // A 2xx without a SecretID is a protocol violation, never an empty credential.
    let secret_id = response
        .secret_id
        .map(SecretToken::from)
        .filter(|secret| !secret.is_empty())
        .ok_or_else(|| AuthError::Malformed("login response has no SecretID".into()))?;

    tracing::info!(
        auth_method,
        accessor_id = response.accessor_id.as_deref().unwrap_or("<none>"),
        "acl login succeeded"
    );
    Ok(secret_id)
}
