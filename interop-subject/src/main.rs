//! interop-subject: reference grpc.testing server.
//!
//! # Usage
//!
//! ```bash
//! interop-subject --port 8080
//! interop-subject --port 8443 --certFile server.crt --keyFile server.key
//! ```
//!
//! The bound address is printed to stdout once the server is listening.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use interop_subject::SubjectError;
use tonic::transport::{Identity, ServerTlsConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "interop-subject")]
#[command(about = "Reference grpc.testing server")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on (0 picks a free port)
    #[arg(long, env = "PORT", default_value_t = 0)]
    port: u16,

    /// PEM certificate; enables TLS together with --keyFile
    #[arg(long = "certFile", visible_alias = "cert-file", env = "CERT_FILE", requires = "key_file")]
    cert_file: Option<PathBuf>,

    /// PEM private key
    #[arg(long = "keyFile", visible_alias = "key-file", env = "KEY_FILE", requires = "cert_file")]
    key_file: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let args = Args::parse();

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create runtime: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = rt.block_on(serve(args)) {
        tracing::error!(error = %e, "subject stopped");
        std::process::exit(1);
    }
}

async fn serve(args: Args) -> Result<(), SubjectError> {
    let tls = match (&args.cert_file, &args.key_file) {
        (Some(cert), Some(key)) => {
            let cert = tokio::fs::read(cert).await.map_err(SubjectError::Credentials)?;
            let key = tokio::fs::read(key).await.map_err(SubjectError::Credentials)?;
            Some(ServerTlsConfig::new().identity(Identity::from_pem(cert, key)))
        }
        _ => None,
    };

    let handle = interop_subject::spawn(SocketAddr::new(args.host, args.port), tls).await?;
    println!("{}", handle.local_addr());

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to wait for ctrl-c");
    }
    tracing::info!("shutting down");
    handle.shutdown().await
}
