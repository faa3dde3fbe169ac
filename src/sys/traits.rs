use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::AuthError;

// ==============================================================================
// 1. Login Wire Types (Consul `/v1/acl/login`)
// ==============================================================================

/// Body of a login call. The bearer token is scrubbed when the request drops.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "PascalCase")]
pub struct LoginRequest {
    #[zeroize(skip)]
    pub auth_method: String,
    pub bearer_token: String,
    /// Annotations stored on the minted token, e.g. `pod=default/podName`.
    #[zeroize(skip)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("auth_method", &self.auth_method)
            .field("bearer_token", &"[REDACTED]")
            .field("meta", &self.meta)
            .finish()
    }
}

/// Optional tenancy scoping for the login. Empty strings are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginOptions {
    pub namespace: Option<String>,
    pub partition: Option<String>,
}

impl LoginOptions {
    /// Query parameters Consul expects for the set scopes.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(ns) = self.namespace.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("ns", ns));
        }
        if let Some(partition) = self.partition.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("partition", partition));
        }
        pairs
    }
}

/// ACL token returned by a successful login.
///
/// Only the two identifiers are typed; roles, service identities, timestamps and
/// raft indices are carried untouched in `extra`.
#[derive(Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "AccessorID", default)]
    pub accessor_id: Option<String>,
    #[serde(rename = "SecretID", default)]
    pub secret_id: Option<SecretString>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("accessor_id", &self.accessor_id)
            .field("secret_id", &self.secret_id.as_ref().map(|_| "[REDACTED]"))
            .field("extra", &self.extra)
            .finish()
    }
}

// ==============================================================================
// 2. Login Endpoint Abstraction
// ==============================================================================

/// Handle to an endpoint that can mint ACL tokens from a bearer token.
/// One call to `login` is one request on the wire; implementations never retry.
#[async_trait]
pub trait AclLoginClient: Send + Sync {
    async fn login(
        &self,
        request: &LoginRequest,
        options: &LoginOptions,
    ) -> Result<LoginResponse, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::sync::Arc;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn login_client_is_object_safe_send_sync() {
        _assert_send_sync::<Box<dyn AclLoginClient>>();
        _assert_send_sync::<Arc<dyn AclLoginClient>>();
    }

    #[test]
    fn request_serializes_with_consul_keys() {
        let request = LoginRequest {
            auth_method: "consul-k8s-auth-method".into(),
            bearer_token: "foo".into(),
            meta: BTreeMap::from([("pod".to_string(), "default/podName".to_string())]),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "AuthMethod": "consul-k8s-auth-method",
                "BearerToken": "foo",
                "Meta": {"pod": "default/podName"}
            })
        );
    }

    #[test]
    fn empty_meta_is_omitted() {
        let request = LoginRequest {
            auth_method: "m".into(),
            bearer_token: "t".into(),
            meta: BTreeMap::new(),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("Meta").is_none());
    }

    #[test]
    fn request_debug_hides_bearer_token() {
        let request = LoginRequest {
            auth_method: "m".into(),
            bearer_token: "super-secret-jwt".into(),
            meta: BTreeMap::new(),
        };
        let debug = format!("{:?}", request);
        assert!(!debug.contains("super-secret-jwt"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn response_keeps_untyped_fields() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"AccessorID":"926e2bd2","SecretID":"b78d37c7","Local":true,"CreateIndex":36}"#,
        )
        .unwrap();
        assert_eq!(response.accessor_id.as_deref(), Some("926e2bd2"));
        assert_eq!(
            response.secret_id.as_ref().map(|s| s.expose_secret().as_str()),
            Some("b78d37c7")
        );
        assert_eq!(response.extra["Local"], serde_json::json!(true));
        assert_eq!(response.extra["CreateIndex"], serde_json::json!(36));
        assert!(!format!("{:?}", response).contains("b78d37c7"));
    }

    #[test]
    fn response_without_secret_id_still_parses() {
        let response: LoginResponse = serde_json::from_str(r#"{"AccessorID":"a"}"#).unwrap();
        assert!(response.secret_id.is_none());
    }

    #[test]
    fn query_pairs_skip_unset_and_empty_scopes() {
        assert!(LoginOptions::default().query_pairs().is_empty());
        let blank = LoginOptions {
            namespace: Some(String::new()),
            partition: None,
        };
        assert!(blank.query_pairs().is_empty());

        let options = LoginOptions {
            namespace: Some("team-a".into()),
            partition: Some("edge".into()),
        };
        assert_eq!(
            options.query_pairs(),
            vec![("ns", "team-a"), ("partition", "edge")]
        );
    }
}
