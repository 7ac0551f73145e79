#![deny(unsafe_code)]

//! Service contract for the `grpc.testing` interop suite.
//!
//! These types define the wire format shared by the conformance harness and
//! the reference subject. They are written out by hand in the shape prost
//! generates, so neither side needs a schema compiler at build time.

pub mod contract;
pub mod messages;
pub mod service;

pub use messages::*;
pub use service::{MethodDescriptor, MethodKind};
