//! Status validation: codes, messages and structured error details.

use std::fmt;

use interop_proto::{ErrorDetail, RpcStatus};
use prost::Message;
use tonic::{Code, Status};

pub fn expect_ok(status: &Status) -> Result<(), String> {
    expect_code(status, Code::Ok)
}

pub fn expect_code(status: &Status, code: Code) -> Result<(), String> {
    if status.code() == code {
        Ok(())
    } else {
        Err(format!(
            "expected status {:?}, got {:?} ({:?})",
            code,
            status.code(),
            status.message()
        ))
    }
}

/// Code and message, compared exactly.
pub fn expect_status(status: &Status, code: Code, message: &str) -> Result<(), String> {
    expect_code(status, code)?;
    if status.message() != message {
        return Err(format!(
            "expected status message {:?}, got {:?}",
            message,
            status.message()
        ));
    }
    Ok(())
}

/// How an unimplemented method or service was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unimplemented {
    Exact,
    /// UNKNOWN instead of UNIMPLEMENTED: a known server deviation for
    /// unregistered services, accepted but reported.
    ToleratedUnknown,
}

impl Unimplemented {
    pub fn warning(self) -> Option<&'static str> {
        match self {
            Unimplemented::Exact => None,
            Unimplemented::ToleratedUnknown => {
                Some("server answered an unknown service with UNKNOWN instead of UNIMPLEMENTED")
            }
        }
    }
}

/// UNIMPLEMENTED only.
pub fn expect_unimplemented(status: &Status) -> Result<(), String> {
    expect_code(status, Code::Unimplemented)
}

/// UNIMPLEMENTED, or UNKNOWN as a tolerated deviation.
pub fn expect_unimplemented_service(status: &Status) -> Result<Unimplemented, String> {
    match status.code() {
        Code::Unimplemented => Ok(Unimplemented::Exact),
        Code::Unknown => {
            tracing::warn!(
                message = status.message(),
                "tolerating UNKNOWN for an unimplemented service"
            );
            Ok(Unimplemented::ToleratedUnknown)
        }
        other => Err(format!(
            "expected status Unimplemented (or tolerated Unknown), got {:?} ({:?})",
            other,
            status.message()
        )),
    }
}

#[derive(Debug)]
pub enum StatusDecodeError {
    /// The details blob is not a `google.rpc.Status`.
    Envelope(prost::DecodeError),
    /// The envelope carries no details.
    NoDetails,
    /// The first detail is not an `ErrorDetail`.
    Detail {
        type_url: String,
        source: prost::DecodeError,
    },
}

impl fmt::Display for StatusDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusDecodeError::Envelope(e) => write!(f, "status details are not a google.rpc.Status: {}", e),
            StatusDecodeError::NoDetails => write!(f, "status carries no error details"),
            StatusDecodeError::Detail { type_url, source } => {
                write!(f, "detail {:?} is not an ErrorDetail: {}", type_url, source)
            }
        }
    }
}

impl std::error::Error for StatusDecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StatusDecodeError::Envelope(e) => Some(e),
            StatusDecodeError::Detail { source, .. } => Some(source),
            StatusDecodeError::NoDetails => None,
        }
    }
}

/// Decode the details blob and its first detail.
pub fn decode_error_detail(status: &Status) -> Result<(RpcStatus, ErrorDetail), StatusDecodeError> {
    let envelope = RpcStatus::decode(status.details()).map_err(StatusDecodeError::Envelope)?;
    let first = envelope.details.first().ok_or(StatusDecodeError::NoDetails)?;
    let detail =
        ErrorDetail::decode(first.value.as_slice()).map_err(|source| StatusDecodeError::Detail {
            type_url: first.type_url.clone(),
            source,
        })?;
    Ok((envelope, detail))
}

/// The terminal status and its envelope agree on `code` and `message`, and
/// the envelope holds exactly one `ErrorDetail` whose reason is `message`
/// and whose domain is `domain`. Strings compare byte for byte.
pub fn expect_structured_error(
    status: &Status,
    code: Code,
    message: &str,
    domain: &str,
) -> Result<(), String> {
    expect_status(status, code, message)?;

    let (envelope, detail) = decode_error_detail(status).map_err(|e| e.to_string())?;
    if envelope.code != code as i32 {
        return Err(format!(
            "details envelope code: expected {}, got {}",
            code as i32, envelope.code
        ));
    }
    if envelope.message != message {
        return Err(format!(
            "details envelope message: expected {:?}, got {:?}",
            message, envelope.message
        ));
    }
    if envelope.details.len() != 1 {
        return Err(format!(
            "expected exactly one error detail, got {}",
            envelope.details.len()
        ));
    }
    if detail.reason != message {
        return Err(format!(
            "error detail reason: expected {:?}, got {:?}",
            message, detail.reason
        ));
    }
    if detail.domain != domain {
        return Err(format!(
            "error detail domain: expected {:?}, got {:?}",
            domain, detail.domain
        ));
    }
    Ok(())
}
