//! Metadata codec: binary header values, header folding and the echo
//! metadata the custom-metadata scenarios send and expect back.

use std::fmt;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use http::{HeaderMap, HeaderName, HeaderValue};
use interop_proto::contract::{
    LEADING_METADATA_KEY, LEADING_METADATA_SECOND_VALUE, LEADING_METADATA_VALUE,
    TRAILING_METADATA_KEY, TRAILING_METADATA_SECOND_VALUE, TRAILING_METADATA_VALUE,
};

use crate::call::CallContext;

/// Standard alphabet; pads on encode, accepts either form on decode.
const BINARY: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug)]
pub enum MetadataError {
    InvalidValue {
        key: &'static str,
        value: String,
    },
    InvalidBase64 {
        value: String,
        source: base64::DecodeError,
    },
    Mismatch {
        key: &'static str,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::InvalidValue { key, value } => {
                write!(f, "{:?} is not a valid value for {}", value, key)
            }
            MetadataError::InvalidBase64 { value, source } => {
                write!(f, "binary metadata {:?} is not base64: {}", value, source)
            }
            MetadataError::Mismatch {
                key,
                expected,
                actual,
            } => write!(f, "metadata {}: expected {}, got {}", key, expected, actual),
        }
    }
}

impl std::error::Error for MetadataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetadataError::InvalidBase64 { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub fn encode_binary(value: &[u8]) -> String {
    BINARY.encode(value)
}

pub fn decode_binary(value: &str) -> Result<Vec<u8>, MetadataError> {
    BINARY
        .decode(value.trim())
        .map_err(|source| MetadataError::InvalidBase64 {
            value: value.to_string(),
            source,
        })
}

/// Undo header folding. Some transports join repeated headers into a single
/// `", "`-separated value; when `expected` values were sent but exactly one
/// came back, split it.
pub fn unfold(expected: usize, observed: Vec<String>) -> Vec<String> {
    match observed.as_slice() {
        [single] if expected != 1 => single.split(", ").map(str::to_string).collect(),
        _ => observed,
    }
}

/// Multiset equality: same values, same multiplicities, any order.
pub fn same_values<T: Ord + Clone>(expected: &[T], actual: &[T]) -> bool {
    let mut expected = expected.to_vec();
    let mut actual = actual.to_vec();
    expected.sort();
    actual.sort();
    expected == actual
}

/// Every value of `key`, decoded lossily as UTF-8.
pub fn text_values(headers: &HeaderMap, key: &str) -> Vec<String> {
    headers
        .get_all(key)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .collect()
}

fn hex(values: &[Vec<u8>]) -> String {
    let rendered: Vec<String> = values
        .iter()
        .map(|value| value.iter().map(|b| format!("{:02x}", b)).collect())
        .collect();
    format!("{:?}", rendered)
}

/// Leading and trailing values a scenario sends and expects echoed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoMetadata {
    pub leading: Vec<String>,
    pub trailing: Vec<Vec<u8>>,
}

impl EchoMetadata {
    pub fn single() -> Self {
        Self {
            leading: vec![LEADING_METADATA_VALUE.to_string()],
            trailing: vec![TRAILING_METADATA_VALUE.to_vec()],
        }
    }

    /// Two values under each key.
    pub fn duplicated() -> Self {
        Self {
            leading: vec![
                LEADING_METADATA_VALUE.to_string(),
                LEADING_METADATA_SECOND_VALUE.to_string(),
            ],
            trailing: vec![
                TRAILING_METADATA_VALUE.to_vec(),
                TRAILING_METADATA_SECOND_VALUE.to_vec(),
            ],
        }
    }

    /// Add the values to the outgoing metadata of `ctx`.
    pub fn attach(&self, ctx: &mut CallContext) -> Result<(), MetadataError> {
        let headers = ctx.metadata_mut();
        for value in &self.leading {
            let value = HeaderValue::from_str(value).map_err(|_| MetadataError::InvalidValue {
                key: LEADING_METADATA_KEY,
                value: value.clone(),
            })?;
            headers.append(HeaderName::from_static(LEADING_METADATA_KEY), value);
        }
        for value in &self.trailing {
            let encoded = encode_binary(value);
            let value = HeaderValue::from_str(&encoded).map_err(|_| MetadataError::InvalidValue {
                key: TRAILING_METADATA_KEY,
                value: encoded.clone(),
            })?;
            headers.append(HeaderName::from_static(TRAILING_METADATA_KEY), value);
        }
        Ok(())
    }

    /// Check that the leading values came back in `headers` and the trailing
    /// ones in `trailers`.
    pub fn verify(&self, headers: &HeaderMap, trailers: &HeaderMap) -> Result<(), MetadataError> {
        let leading = unfold(self.leading.len(), text_values(headers, LEADING_METADATA_KEY));
        if !same_values(&self.leading, &leading) {
            return Err(MetadataError::Mismatch {
                key: LEADING_METADATA_KEY,
                expected: format!("{:?}", self.leading),
                actual: format!("{:?}", leading),
            });
        }

        let trailing = unfold(self.trailing.len(), text_values(trailers, TRAILING_METADATA_KEY))
            .iter()
            .map(|value| decode_binary(value))
            .collect::<Result<Vec<_>, _>>()?;
        if !same_values(&self.trailing, &trailing) {
            return Err(MetadataError::Mismatch {
                key: TRAILING_METADATA_KEY,
                expected: hex(&self.trailing),
                actual: hex(&trailing),
            });
        }

        Ok(())
    }
}
