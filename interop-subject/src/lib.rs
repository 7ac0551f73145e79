//! Reference `grpc.testing` server.
//!
//! Implements TestService the way the interop suite expects every server to
//! behave, and leaves UnimplementedService unregistered. The conformance
//! harness runs against it in its own integration tests.

use std::fmt;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Server, ServerTlsConfig};

pub mod echo;
pub mod router;
pub mod service;

use echo::EchoMetadataLayer;
use router::TestServiceServer;
use service::Reference;

/// Error starting or stopping the subject.
#[derive(Debug)]
pub enum SubjectError {
    Bind(std::io::Error),
    Credentials(std::io::Error),
    Tls(tonic::transport::Error),
    Serve(tonic::transport::Error),
    Join(tokio::task::JoinError),
}

impl fmt::Display for SubjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectError::Bind(e) => write!(f, "failed to bind listener: {}", e),
            SubjectError::Credentials(e) => write!(f, "failed to read TLS credentials: {}", e),
            SubjectError::Tls(e) => write!(f, "invalid TLS configuration: {}", e),
            SubjectError::Serve(e) => write!(f, "server failed: {}", e),
            SubjectError::Join(e) => write!(f, "server task failed: {}", e),
        }
    }
}

impl std::error::Error for SubjectError {}

/// A running subject. Dropping it leaves the server running until the
/// runtime shuts down; call [`SubjectHandle::shutdown`] to stop it.
pub struct SubjectHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<(), tonic::transport::Error>>,
}

impl SubjectHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting calls and wait for the server task.
    pub async fn shutdown(self) -> Result<(), SubjectError> {
        let _ = self.shutdown.send(());
        self.task
            .await
            .map_err(SubjectError::Join)?
            .map_err(SubjectError::Serve)
    }
}

/// Bind `addr` (port 0 picks a free one) and serve TestService on it.
pub async fn spawn(
    addr: SocketAddr,
    tls: Option<ServerTlsConfig>,
) -> Result<SubjectHandle, SubjectError> {
    let listener = TcpListener::bind(addr).await.map_err(SubjectError::Bind)?;
    let local_addr = listener.local_addr().map_err(SubjectError::Bind)?;

    let mut builder = Server::builder();
    if let Some(tls) = tls {
        builder = builder.tls_config(tls).map_err(SubjectError::Tls)?;
    }
    let router = builder
        .layer(EchoMetadataLayer)
        .add_service(TestServiceServer::new(Reference));

    let (shutdown, signal) = oneshot::channel::<()>();
    let task = tokio::spawn(router.serve_with_incoming_shutdown(
        TcpListenerStream::new(listener),
        async {
            let _ = signal.await;
        },
    ));

    tracing::info!(%local_addr, "interop subject listening");
    Ok(SubjectHandle {
        local_addr,
        shutdown,
        task,
    })
}
