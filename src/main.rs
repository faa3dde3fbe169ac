// src/main.rs

use clap::Parser;
use std::process::ExitCode;

mod config;
mod error;
mod login;
mod sys;
mod telemetry;

use crate::config::{Cli, LoginConfig};
use crate::error::ConfigError;
use crate::login::consul_login;
use crate::sys::consul::ConsulClient;

const EXIT_CONFIG: u8 = 1;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // ==============================================================================
    // 1. Configuration & Environment
    // ==============================================================================

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() {
                ExitCode::from(EXIT_CONFIG)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match LoginConfig::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("consul-login: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = config.logger.init(config.log_format) {
        eprintln!("consul-login: failed to initialize logging: {e}");
        return ExitCode::from(EXIT_CONFIG);
    }

    // ==============================================================================
    // 2. Endpoint Handle
    // ==============================================================================

    let client = match ConsulClient::new(config.consul_address.clone(), config.request_timeout) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %ConfigError::Client(e), "invalid consul client configuration");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    tracing::info!(
        consul = client.address(),
        auth_method = %config.auth_method,
        namespace = config.options.namespace.as_deref().unwrap_or(""),
        partition = config.options.partition.as_deref().unwrap_or(""),
        "⚙️ starting consul acl login"
    );
    if config.logger.is_debug() {
        tracing::debug!(
            bearer_token_file = %config.bearer_token_file.display(),
            token_sink_file = %config.token_sink_file.display(),
            meta = ?config.meta,
            "login parameters"
        );
    }

    // ==============================================================================
    // 3. Read -> Login -> Persist
    // ==============================================================================

    match consul_login(
        &client,
        &config.bearer_token_file,
        &config.auth_method,
        &config.token_sink_file,
        &config.options,
        &config.meta,
    )
    .await
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let class = e.failure_class();
            tracing::error!(error = %e, failure = ?class, "consul acl login failed");
            ExitCode::from(class.exit_code())
        }
    }
}
