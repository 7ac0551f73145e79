//! interop-conformance: drives a grpc.testing server through the suite.
//!
//! # Usage
//!
//! Run every scenario against a plaintext server:
//! ```bash
//! interop-conformance --port 8080 --insecure
//! ```
//!
//! Run one category over TLS, with gzip-compressed requests:
//! ```bash
//! interop-conformance --port 8443 --certFile client.crt --keyFile client.key \
//!     --category metadata --compression gzip
//! ```
//!
//! List test cases:
//! ```bash
//! interop-conformance --list
//! interop-conformance --list --category status --format json
//! ```
//!
//! # Exit Codes
//!
//! - 0: Every selected scenario passed
//! - 1: A scenario failed, or the flags were invalid
//! - 2: The harness could not run (transport failure, unknown case)

use std::path::PathBuf;

use clap::Parser;
use interop_conformance::config::{Compression, ConnectionFlags};
use interop_conformance::harness::Interop;
use interop_conformance::{ConformanceTest, report, runner, tests};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "interop-conformance")]
#[command(about = "Interop conformance suite for grpc.testing servers")]
struct Args {
    /// Server host
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Server port
    #[arg(long, env = "PORT")]
    port: Option<String>,

    /// Connect over plaintext HTTP/2
    #[arg(long)]
    insecure: bool,

    /// PEM certificate, used as trust root and client identity
    #[arg(long = "certFile", visible_alias = "cert-file", env = "CERT_FILE")]
    cert_file: Option<PathBuf>,

    /// PEM private key for the client identity
    #[arg(long = "keyFile", visible_alias = "key-file", env = "KEY_FILE")]
    key_file: Option<PathBuf>,

    /// Run a single test case (e.g., "unary.large_unary")
    #[arg(long)]
    case: Option<String>,

    /// List available test cases
    #[arg(long)]
    list: bool,

    /// Filter by category (unary, stream, cancel, metadata, status, error, transport)
    #[arg(long)]
    category: Option<String>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: String,

    /// Request compression
    #[arg(long, value_enum, default_value_t = Compression::Identity)]
    compression: Compression,
}

fn main() {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let args = Args::parse();

    let cases = match select(&args) {
        Ok(cases) => cases,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    if args.list {
        list_tests(&args, &cases);
        return;
    }

    let flags = ConnectionFlags {
        host: args.host.clone(),
        port: args.port.clone(),
        insecure: args.insecure,
        cert_file: args.cert_file.clone(),
        key_file: args.key_file.clone(),
    };
    let config = match flags.validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

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

    let code = rt.block_on(async {
        let interop = match Interop::connect(config, args.compression).await {
            Ok(interop) => interop,
            Err(e) => {
                tracing::error!(error = %e, "cannot run the suite");
                eprintln!("error: {}", e);
                return 2;
            }
        };

        let suite = runner::run_suite(&interop, &cases).await;
        interop.shutdown();

        if args.format == "json" {
            println!("{}", report::suite_json(&suite));
        } else {
            println!("{}", report::suite_text(&suite));
        }

        if suite.is_success() { 0 } else { 1 }
    });

    std::process::exit(code);
}

/// The scenarios named by `--case` or `--category`, or all of them.
fn select(args: &Args) -> Result<Vec<&'static ConformanceTest>, String> {
    if let Some(name) = &args.case {
        return tests::find(name)
            .map(|case| vec![case])
            .ok_or_else(|| format!("unknown test case: {}", name));
    }
    match &args.category {
        Some(category) => tests::list_category(category).ok_or_else(|| {
            format!(
                "unknown category: {} (expected one of {})",
                category,
                tests::CATEGORIES.join(", ")
            )
        }),
        None => Ok(tests::all()),
    }
}

fn list_tests(args: &Args, cases: &[&ConformanceTest]) {
    if args.format == "json" {
        println!("{}", report::listing_json(cases));
    } else {
        println!("{}", report::listing_text(cases));
    }
}
