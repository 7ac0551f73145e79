//! Runs scenarios over mutual TLS against the in-process subject, with
//! certificates generated per test.

use std::net::SocketAddr;
use std::path::PathBuf;

use interop_conformance::config::{Compression, ConnectionConfig, TransportSecurity};
use interop_conformance::harness::{ConnectError, Interop};
use interop_conformance::tests;
use interop_subject::SubjectHandle;
use rcgen::CertifiedKey;
use tempfile::TempDir;
use tonic::transport::{Identity, ServerTlsConfig};

/// A self-signed certificate for the loopback names, written out as PEM.
struct Credentials {
    _dir: TempDir,
    cert_file: PathBuf,
    key_file: PathBuf,
    cert_pem: String,
    key_pem: String,
}

fn credentials() -> Credentials {
    let CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();
    let cert_pem = cert.pem();
    let key_pem = key_pair.serialize_pem();

    let dir = tempfile::tempdir().unwrap();
    let cert_file = dir.path().join("client.crt");
    let key_file = dir.path().join("client.key");
    std::fs::write(&cert_file, &cert_pem).unwrap();
    std::fs::write(&key_file, &key_pem).unwrap();

    Credentials {
        _dir: dir,
        cert_file,
        key_file,
        cert_pem,
        key_pem,
    }
}

async fn tls_subject(server: &Credentials) -> SubjectHandle {
    let tls = ServerTlsConfig::new().identity(Identity::from_pem(&server.cert_pem, &server.key_pem));
    interop_subject::spawn(SocketAddr::from(([127, 0, 0, 1], 0)), Some(tls))
        .await
        .unwrap()
}

fn tls_config(port: u16, client: &Credentials) -> ConnectionConfig {
    ConnectionConfig {
        host: "127.0.0.1".into(),
        port,
        security: TransportSecurity::Tls {
            cert_file: client.cert_file.clone(),
            key_file: client.key_file.clone(),
        },
    }
}

#[tokio::test]
async fn scenarios_pass_over_tls() {
    let creds = credentials();
    let subject = tls_subject(&creds).await;
    let port = subject.local_addr().port();

    let interop = Interop::connect(tls_config(port, &creds), Compression::Identity)
        .await
        .unwrap();
    for name in ["unary.empty_unary", "unary.large_unary", "stream.ping_pong"] {
        let case = tests::find(name).unwrap();
        let result = case.run(&interop).await;
        assert!(result.passed, "{}: {:?}", name, result.error);
    }

    interop.shutdown();
    subject.shutdown().await.unwrap();
}

#[tokio::test]
async fn untrusted_server_certificate_is_a_transport_error() {
    let server = credentials();
    let client = credentials();
    let subject = tls_subject(&server).await;
    let port = subject.local_addr().port();

    let err = Interop::connect(tls_config(port, &client), Compression::Identity)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectError::Transport { .. }), "{}", err);

    subject.shutdown().await.unwrap();
}
