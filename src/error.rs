// src/error.rs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ==============================================================================
// 1. Stage Errors (one enum per step of the login sequence)
// ==============================================================================

/// Failures while loading the platform-mounted bearer token.
#[derive(Debug, Error)]
pub enum BearerTokenError {
    /// The file could not be opened or read.
    #[error("unable to read bearer token file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was readable but held zero bytes (misconfigured mount).
    #[error("no bearer token found in {}", path.display())]
    Empty { path: PathBuf },
}

/// Failures of the single call to the Consul login endpoint.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("login request could not be completed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Consul answered with a non-success status. `detail` is the body verbatim.
    #[error("login rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// A success status whose body is unusable.
    #[error("malformed login response: {0}")]
    Malformed(String),
}

/// Failures while persisting the SecretID to the token sink file.
#[derive(Debug, Error)]
pub enum SinkWriteError {
    #[error("unable to delete existing file {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to create file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to write file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to set permissions on {}: {source}", path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to move token into place at {}: {source}", path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file {} has mode {actual:o}, expected {expected:o}", path.display())]
    ModeMismatch {
        path: PathBuf,
        expected: u32,
        actual: u32,
    },
}

// ==============================================================================
// 2. Orchestration Error (stage context, kind preserved)
// ==============================================================================

/// Which remediation path an operator should take for a failed login run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The bearer token mount is missing, unreadable or empty.
    CredentialSource,
    /// Consul rejected the login or could not be reached.
    RemoteRejection,
    /// The SecretID could not be persisted locally.
    LocalPersistence,
}

impl FailureClass {
    /// Process exit status for this class. 1 is reserved for configuration errors.
    pub fn exit_code(self) -> u8 {
        match self {
            FailureClass::CredentialSource => 2,
            FailureClass::RemoteRejection => 3,
            FailureClass::LocalPersistence => 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("error reading bearer token: {0}")]
    BearerToken(#[from] BearerTokenError),

    #[error("error logging in: {0}")]
    Auth(#[from] AuthError),

    #[error("error writing token to file sink: {0}")]
    Sink(#[from] SinkWriteError),
}

impl LoginError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            LoginError::BearerToken(_) => FailureClass::CredentialSource,
            LoginError::Auth(_) => FailureClass::RemoteRejection,
            LoginError::Sink(_) => FailureClass::LocalPersistence,
        }
    }
}

// ==============================================================================
// 3. Collaborator Errors (flag and log-level validation)
// ==============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct UnknownLevelError(pub String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("{flag} value of {value} is not a valid integer")]
    NotInteger { flag: String, value: String },

    #[error("{flag} value of {value} is not in the unprivileged port range 1024-65535")]
    OutOfRange { flag: String, value: String },
}

/// Rejected command-line or environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    LogLevel(#[from] UnknownLevelError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("invalid meta entry '{0}': expected key=value")]
    Meta(String),

    #[error("unsupported consul scheme '{0}': expected http or https")]
    Scheme(String),

    #[error("failed to build consul client: {0}")]
    Client(#[source] reqwest::Error),
}
