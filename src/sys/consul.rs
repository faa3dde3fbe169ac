// src/sys/consul.rs

use async_trait::async_trait;
use std::time::Duration;
use zeroize::Zeroizing;

use crate::error::AuthError;
use crate::sys::traits::{AclLoginClient, LoginOptions, LoginRequest, LoginResponse};

const LOGIN_PATH: &str = "/v1/acl/login";

/// A login reply is a few hundred bytes. Anything past this is not read.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

// ==============================================================================
// 1. Concrete Implementation (Consul HTTP API)
// ==============================================================================

pub struct ConsulClient {
    http: reqwest::Client,
    // scheme://host:port, no trailing slash
    address: String,
}

impl ConsulClient {
    /// `timeout` bounds the whole login request; it is the only deadline in a run.
    pub fn new(address: impl Into<String>, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let address = address.into().trim_end_matches('/').to_string();

        Ok(Self {
            http: builder.build()?,
            address,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn login_url(&self) -> String {
        format!("{}{}", self.address, LOGIN_PATH)
    }
}

#[async_trait]
impl AclLoginClient for ConsulClient {
    async fn login(
        &self,
        request: &LoginRequest,
        options: &LoginOptions,
    ) -> Result<LoginResponse, AuthError> {
        let mut call = self.http.post(self.login_url()).json(request);
        let query = options.query_pairs();
        if !query.is_empty() {
            call = call.query(&query);
        }

        let mut response = call.send().await.map_err(AuthError::Transport)?;
        let status = response.status();

        // 🛡️ The raw body holds the SecretID in plaintext; it is scrubbed on drop.
        // Sized up front so growth never leaves an unscrubbed copy behind.
        let hint = response.content_length().unwrap_or(0).min(MAX_RESPONSE_BYTES as u64);
        let mut body = Zeroizing::new(Vec::with_capacity(hint as usize));
        let mut truncated = false;
        while let Some(chunk) = response.chunk().await.map_err(AuthError::Transport)? {
            let room = MAX_RESPONSE_BYTES - body.len();
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        if !status.is_success() {
            // Consul reports ACL failures as plain text ("ACL not found", "Permission denied").
            // The detail is passed on as received, cut at the read limit.
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                detail: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        if truncated {
            return Err(AuthError::Malformed(format!(
                "login response exceeds {MAX_RESPONSE_BYTES} bytes"
            )));
        }

        serde_json::from_slice::<LoginResponse>(&body).map_err(|e| AuthError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> LoginRequest {
        LoginRequest {
            auth_method: "consul-k8s-auth-method".into(),
            bearer_token: "foo".into(),
            meta: BTreeMap::from([("pod".to_string(), "default/podName".to_string())]),
        }
    }

    #[tokio::test]
    async fn posts_login_body_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/acl/login"))
            .and(body_json(serde_json::json!({
                "AuthMethod": "consul-k8s-auth-method",
                "BearerToken": "foo",
                "Meta": {"pod": "default/podName"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AccessorID": "926e2bd2-b344-d91b-0c83-ae89f372cd9b",
                "SecretID": "b78d37c7-0ca7-5f4d-99ee-6d9975ce4586",
                "Local": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ConsulClient::new(server.uri(), None).unwrap();
        let response = client
            .login(&request(), &LoginOptions::default())
            .await
            .unwrap();

        assert_eq!(
            response.accessor_id.as_deref(),
            Some("926e2bd2-b344-d91b-0c83-ae89f372cd9b")
        );
        assert_eq!(
            response.secret_id.unwrap().expose_secret(),
            "b78d37c7-0ca7-5f4d-99ee-6d9975ce4586"
        );
    }

    #[tokio::test]
    async fn scopes_are_sent_as_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/acl/login"))
            .and(query_param("ns", "team-a"))
            .and(query_param("partition", "edge"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"SecretID": "s"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ConsulClient::new(format!("{}/", server.uri()), None).unwrap();
        let options = LoginOptions {
            namespace: Some("team-a".into()),
            partition: Some("edge".into()),
        };
        client.login(&request(), &options).await.unwrap();
    }

    #[tokio::test]
    async fn rejection_surfaces_body_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/acl/login"))
            .respond_with(ResponseTemplate::new(403).set_body_string("  Permission denied\n"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ConsulClient::new(server.uri(), None).unwrap();
        let err = client
            .login(&request(), &LoginOptions::default())
            .await
            .unwrap_err();

        match err {
            AuthError::Rejected { status, detail } => {
                assert_eq!(status, 403);
                assert_eq!(detail, "  Permission denied\n");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/acl/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let client = ConsulClient::new(server.uri(), None).unwrap();
        let err = client
            .login(&request(), &LoginOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
    }

    #[tokio::test]
    async fn oversized_success_body_is_malformed() {
        let server = MockServer::start().await;
        let padding = "x".repeat(MAX_RESPONSE_BYTES);
        Mock::given(method("POST"))
            .and(path("/v1/acl/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"SecretID":"s","Padding":"{padding}"}}"#
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = ConsulClient::new(server.uri(), None).unwrap();
        let err = client
            .login(&request(), &LoginOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exceeds 65536 bytes"), "{err}");
    }

    #[tokio::test]
    async fn oversized_rejection_detail_is_cut_at_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/acl/login"))
            .respond_with(ResponseTemplate::new(500).set_body_string("e".repeat(MAX_RESPONSE_BYTES * 4)))
            .expect(1)
            .mount(&server)
            .await;

        let client = ConsulClient::new(server.uri(), None).unwrap();
        match client.login(&request(), &LoginOptions::default()).await {
            Err(AuthError::Rejected { status, detail }) => {
                assert_eq!(status, 500);
                assert_eq!(detail.len(), MAX_RESPONSE_BYTES);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let client =
            ConsulClient::new("http://127.0.0.1:1", Some(Duration::from_secs(5))).unwrap();
        let err = client
            .login(&request(), &LoginOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Transport(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = ConsulClient::new("http://consul:8500/", None).unwrap();
        assert_eq!(client.address(), "http://consul:8500");
        assert_eq!(client.login_url(), "http://consul:8500/v1/acl/login");
    }
}
