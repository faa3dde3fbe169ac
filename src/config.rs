// src/config.rs

use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, PortError};
use crate::sys::traits::LoginOptions;
use crate::telemetry::{self, LogFormat, Logger};

pub const DEFAULT_BEARER_TOKEN_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
pub const DEFAULT_TOKEN_SINK_FILE: &str = "/consul/login/acl-token";

const PORT_FLAG: &str = "--consul-port";

/// Every flag can also be supplied through its environment variable.
#[derive(Debug, Parser)]
#[command(
    name = "consul-login",
    version,
    about = "Exchange a mounted bearer token for a Consul ACL token and write it to a sink file"
)]
pub struct Cli {
    /// Consul auth method that validates the bearer token.
    #[arg(long, env = "CONSUL_LOGIN_AUTH_METHOD")]
    pub auth_method: String,

    #[arg(long, env = "CONSUL_LOGIN_BEARER_TOKEN_FILE", default_value = DEFAULT_BEARER_TOKEN_FILE)]
    pub bearer_token_file: PathBuf,

    #[arg(long, env = "CONSUL_LOGIN_TOKEN_SINK_FILE", default_value = DEFAULT_TOKEN_SINK_FILE)]
    pub token_sink_file: PathBuf,

    /// key=value annotation stored on the ACL token. Repeatable; the value is kept
    /// verbatim, commas included.
    #[arg(long = "meta")]
    pub meta: Vec<String>,

    /// Comma separated key=value annotations. Entries from --meta win on a key clash.
    #[arg(long = "meta-list", env = "CONSUL_LOGIN_META", value_delimiter = ',')]
    pub meta_list: Vec<String>,

    #[arg(long, env = "CONSUL_NAMESPACE")]
    pub namespace: Option<String>,

    #[arg(long, env = "CONSUL_PARTITION")]
    pub partition: Option<String>,

    #[arg(long, env = "CONSUL_LOGIN_SCHEME", default_value = "http")]
    pub consul_scheme: String,

    #[arg(long, env = "CONSUL_LOGIN_HOST", default_value = "127.0.0.1")]
    pub consul_host: String,

    /// Kept as a string so validation can name the flag and the raw value.
    #[arg(long, env = "CONSUL_LOGIN_PORT", default_value = "8500")]
    pub consul_port: String,

    /// Deadline for the login request. 0 disables it.
    #[arg(long, env = "CONSUL_LOGIN_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "CONSUL_LOGIN_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "CONSUL_LOGIN_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Debug, Clone)]
pub struct LoginConfig {
    pub auth_method: String,
    pub bearer_token_file: PathBuf,
    pub token_sink_file: PathBuf,
    pub meta: BTreeMap<String, String>,
    pub options: LoginOptions,

    // 🛡️ SLA Boundary: Network
    pub consul_address: String,
    pub request_timeout: Option<Duration>,

    pub logger: Logger,
    pub log_format: LogFormat,
}

impl LoginConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let logger = telemetry::logger(&cli.log_level)?;
        let port = validate_unprivileged_port(PORT_FLAG, &cli.consul_port)?;

        let scheme = cli.consul_scheme.to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ConfigError::Scheme(cli.consul_scheme));
        }

        let meta = cli
            .meta_list
            .iter()
            .chain(cli.meta.iter())
            .filter(|entry| !entry.is_empty())
            .map(|entry| parse_meta(entry))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let options = LoginOptions {
            namespace: cli.namespace.filter(|s| !s.is_empty()),
            partition: cli.partition.filter(|s| !s.is_empty()),
        };

        Ok(Self {
            auth_method: cli.auth_method,
            bearer_token_file: cli.bearer_token_file,
            token_sink_file: cli.token_sink_file,
            meta,
            options,
            consul_address: format!("{}://{}:{}", scheme, cli.consul_host, port),
            request_timeout: (cli.request_timeout_secs > 0)
                .then(|| Duration::from_secs(cli.request_timeout_secs)),
            logger,
            log_format: if cli.log_json { LogFormat::Json } else { LogFormat::Text },
        })
    }
}

fn parse_meta(entry: &str) -> Result<(String, String), ConfigError> {
    match entry.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::Meta(entry.to_string())),
    }
}

/// Accepts `value` only if it is an integer in 1024-65535. `flag` names the
/// offending flag in the error.
pub fn validate_unprivileged_port(flag: &str, value: &str) -> Result<u16, PortError> {
    let port = value.parse::<i64>().map_err(|_| PortError::NotInteger {
        flag: flag.to_string(),
        value: value.to_string(),
    })?;

    if !(1024..=65535).contains(&port) {
        return Err(PortError::OutOfRange {
            flag: flag.to_string(),
            value: value.to_string(),
        });
    }

    Ok(port as u16)
}
