//! Connection bootstrap: turns raw flags into a validated target.

use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Flags as the user supplied them, before validation.
#[derive(Debug, Clone, Default)]
pub struct ConnectionFlags {
    pub host: Option<String>,
    pub port: Option<String>,
    pub insecure: bool,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

/// How the channel is secured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSecurity {
    Plaintext,
    /// The certificate is both the trust root and, with the key, the client
    /// identity.
    Tls { cert_file: PathBuf, key_file: PathBuf },
}

/// A validated target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub security: TransportSecurity,
}

/// Request compression for a whole pass of the suite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Compression {
    #[default]
    Identity,
    Gzip,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Identity => write!(f, "identity"),
            Compression::Gzip => write!(f, "gzip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingPort,
    InvalidPort(String),
    InsecureWithCredentials,
    MissingCredentials,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingPort => write!(f, "port must be specified"),
            ConfigError::InvalidPort(port) => write!(f, "invalid port: {}", port),
            ConfigError::InsecureWithCredentials => {
                write!(f, "insecure cannot be used with certFile or keyFile")
            }
            ConfigError::MissingCredentials => {
                write!(f, "insecure or certFile and keyFile must be specified")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConnectionFlags {
    /// Check the flags. The port is checked first, then the security mode:
    /// exactly one of `insecure` or both `cert_file` and `key_file`.
    pub fn validate(self) -> Result<ConnectionConfig, ConfigError> {
        let ConnectionFlags {
            host,
            port,
            insecure,
            cert_file,
            key_file,
        } = self;

        let port = match port.as_deref().map(str::trim) {
            None | Some("") => return Err(ConfigError::MissingPort),
            Some(port) => match port.parse::<u16>() {
                Ok(0) | Err(_) => return Err(ConfigError::InvalidPort(port.to_string())),
                Ok(port) => port,
            },
        };

        let security = match (insecure, cert_file, key_file) {
            (true, None, None) => TransportSecurity::Plaintext,
            (true, _, _) => return Err(ConfigError::InsecureWithCredentials),
            (false, Some(cert_file), Some(key_file)) => TransportSecurity::Tls {
                cert_file,
                key_file,
            },
            (false, _, _) => return Err(ConfigError::MissingCredentials),
        };

        let host = host
            .filter(|host| !host.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        Ok(ConnectionConfig {
            host,
            port,
            security,
        })
    }
}

impl ConnectionConfig {
    pub fn plaintext(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            security: TransportSecurity::Plaintext,
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.security, TransportSecurity::Tls { .. })
    }

    /// URI of the configured host.
    pub fn uri(&self) -> String {
        self.uri_for(&self.host)
    }

    /// URI of `host` on the configured port and scheme. IPv6 literals are
    /// bracketed.
    pub fn uri_for(&self, host: &str) -> String {
        let scheme = if self.is_tls() { "https" } else { "http" };
        if host.contains(':') && !host.starts_with('[') {
            format!("{}://[{}]:{}", scheme, host, self.port)
        } else {
            format!("{}://{}:{}", scheme, host, self.port)
        }
    }
}
