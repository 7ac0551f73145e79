//! The shared context every scenario runs against.
//!
//! [`Interop::connect`] builds the one channel of a run and the stubs over
//! it; [`Interop::shutdown`] tears them down. Scenarios only see `&Interop`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity};

use crate::config::{Compression, ConnectionConfig, TransportSecurity};
use crate::stub::{RpcChannel, TestServiceClient, UnimplementedServiceClient};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure to set up the channel. Fatal to the whole run.
#[derive(Debug)]
pub enum ConnectError {
    Credentials {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidUri {
        uri: String,
        source: tonic::transport::Error,
    },
    Tls(tonic::transport::Error),
    Transport {
        uri: String,
        source: tonic::transport::Error,
    },
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Credentials { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ConnectError::InvalidUri { uri, source } => write!(f, "invalid target {}: {}", uri, source),
            ConnectError::Tls(e) => write!(f, "invalid TLS configuration: {}", e),
            ConnectError::Transport { uri, source } => {
                write!(f, "failed to connect to {}: {}", uri, source)
            }
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectError::Credentials { source, .. } => Some(source),
            ConnectError::InvalidUri { source, .. } => Some(source),
            ConnectError::Tls(e) => Some(e),
            ConnectError::Transport { source, .. } => Some(source),
        }
    }
}

/// Channel and stubs for one run of the suite.
#[derive(Debug, Clone)]
pub struct Interop {
    config: ConnectionConfig,
    compression: Compression,
    test_service: TestServiceClient,
    unimplemented_service: UnimplementedServiceClient,
}

impl Interop {
    /// Connect eagerly, so an unreachable server fails the run up front.
    pub async fn connect(
        config: ConnectionConfig,
        compression: Compression,
    ) -> Result<Self, ConnectError> {
        let endpoint = endpoint(&config, &config.host).await?;
        let uri = endpoint.uri().to_string();
        tracing::info!(%uri, %compression, tls = config.is_tls(), "connecting");

        let channel = endpoint
            .connect()
            .await
            .map_err(|source| ConnectError::Transport { uri, source })?;
        Ok(Self::with_channel(config, compression, channel))
    }

    pub fn with_channel(config: ConnectionConfig, compression: Compression, channel: Channel) -> Self {
        let rpc = RpcChannel::new(channel, compression);
        Self {
            config,
            compression,
            test_service: TestServiceClient::new(rpc.clone()),
            unimplemented_service: UnimplementedServiceClient::new(rpc),
        }
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn test_service(&self) -> &TestServiceClient {
        &self.test_service
    }

    pub fn unimplemented_service(&self) -> &UnimplementedServiceClient {
        &self.unimplemented_service
    }

    /// A TestService client for `host`, on the configured port and security,
    /// whose channel only connects on first use.
    pub async fn lazy_test_service(&self, host: &str) -> Result<TestServiceClient, ConnectError> {
        let channel = endpoint(&self.config, host).await?.connect_lazy();
        Ok(TestServiceClient::new(RpcChannel::new(channel, self.compression)))
    }

    /// Drop the stubs. The connection closes once the last clone of this
    /// `Interop`, and with it the last handle on the channel, is gone.
    pub fn shutdown(self) {
        tracing::debug!(uri = %self.config.uri(), "closing channel");
        let Interop {
            test_service,
            unimplemented_service,
            ..
        } = self;
        drop(test_service);
        drop(unimplemented_service);
    }
}

async fn read_pem(path: &Path) -> Result<Vec<u8>, ConnectError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| ConnectError::Credentials {
            path: path.to_path_buf(),
            source,
        })
}

async fn endpoint(config: &ConnectionConfig, host: &str) -> Result<Endpoint, ConnectError> {
    let uri = config.uri_for(host);
    let endpoint = Endpoint::from_shared(uri.clone())
        .map_err(|source| ConnectError::InvalidUri { uri, source })?
        .connect_timeout(CONNECT_TIMEOUT);

    match &config.security {
        TransportSecurity::Plaintext => Ok(endpoint),
        TransportSecurity::Tls {
            cert_file,
            key_file,
        } => {
            let cert = read_pem(cert_file).await?;
            let key = read_pem(key_file).await?;
            let tls = ClientTlsConfig::new()
                .domain_name(host.trim_start_matches('[').trim_end_matches(']'))
                .ca_certificate(Certificate::from_pem(&cert))
                .identity(Identity::from_pem(cert, key));
            endpoint.tls_config(tls).map_err(ConnectError::Tls)
        }
    }
}
