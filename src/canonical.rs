//! Canonicalization functionality for QingStor signature v1.
//!
//! This turns an [Operation] into the exact string that gets signed:
//!
//! ```text
//! {METHOD}\n
//! {Content-MD5}\n
//! {Content-Type}\n
//! {timestamp}\n
//! {x-qs-* headers, each "name:value\n"}{resource}
//! ```
//!
//! Nothing in this module touches credentials.

use {
    crate::{constants::*, operation::Operation, SignatureError},
    http::{
        header::{HeaderMap, HeaderValue},
        uri::Uri,
    },
    log::trace,
    percent_encoding::percent_decode_str,
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

/// The deterministic text derived from an [Operation] that a signature is computed over.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StringToSign(String);

impl StringToSign {
    /// Returns the string to sign as a `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwraps the underlying string.
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for StringToSign {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<[u8]> for StringToSign {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Display for StringToSign {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<String> for StringToSign {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StringToSign {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where the timestamp line of the string to sign comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SigningTimestamp {
    /// Query signing: the expiry, in seconds since the epoch.
    Expires(i64),

    /// Header signing: the `Date` header, or nothing if `X-QS-Date` is present.
    DateHeader,
}

/// Canonicalize an operation into its string to sign.
///
/// # Errors
/// * [SignatureError::InvalidInput] if the URI cannot be parsed, or if `timestamp` is
///   [SigningTimestamp::DateHeader] and the operation has neither a `Date` nor an `X-QS-Date` header.
pub fn canonicalize(operation: &Operation, timestamp: SigningTimestamp) -> Result<StringToSign, SignatureError> {
    let headers = operation.headers();
    let timestamp = timestamp_line(headers, timestamp)?;
    let resource = canonicalize_resource(operation.uri(), operation.params())?;

    let mut result = String::with_capacity(64 + resource.len());
    result.push_str(&operation.method().to_ascii_uppercase());
    result.push('\n');
    result.push_str(&first_header_value(headers, HDR_CONTENT_MD5));
    result.push('\n');
    result.push_str(&first_header_value(headers, HDR_CONTENT_TYPE));
    result.push('\n');
    result.push_str(&timestamp);
    result.push('\n');
    result.push_str(&canonicalize_headers(headers));
    result.push_str(&resource);

    trace!("String to sign: {:?}", result);
    Ok(StringToSign(result))
}

/// Render the `x-qs-` headers of a request, sorted by name, each as `name:value\n`. Repeated headers
/// are joined with `,` in the order they were added.
pub fn canonicalize_headers(headers: &HeaderMap<HeaderValue>) -> String {
    let mut result = String::new();

    for (key, values) in normalize_headers(headers) {
        if key.starts_with(HDR_X_QS_PREFIX) {
            result.push_str(&key);
            result.push(':');
            result.push_str(&values.join(","));
            result.push('\n');
        }
    }

    result
}

/// Render the resource line: the URI path (`/` if empty) followed by the signable query parameters.
///
/// Parameters are collected from the URI's query string and then from `params`, which wins on
/// conflict. Only names in the signable allow-list are kept. They are sorted by name; each is
/// rendered as `key=value` with the value percent-decoded, or as a bare `key` if the value is empty.
pub fn canonicalize_resource(uri: &str, params: &BTreeMap<String, String>) -> Result<String, SignatureError> {
    let (path, query) = if uri.is_empty() {
        ("/".to_string(), None)
    } else {
        let parsed =
            Uri::from_str(uri).map_err(|e| SignatureError::InvalidInput(format!("Invalid URI {}: {}", uri, e)))?;
        let path = if parsed.path().is_empty() {
            "/".to_string()
        } else {
            parsed.path().to_string()
        };
        (path, parsed.query().map(|q| q.to_string()))
    };

    let mut signable = BTreeMap::<String, String>::new();
    if let Some(query) = query {
        for (key, value) in split_query(&query) {
            if is_signable_param(&key) {
                signable.insert(key, value);
            }
        }
    }

    for (key, value) in params.iter() {
        if is_signable_param(key) {
            signable.insert(key.clone(), value.clone());
        }
    }

    if signable.is_empty() {
        return Ok(path);
    }

    let query = signable
        .iter()
        .map(|(key, value)| {
            let value = percent_decode_str(value).decode_utf8_lossy();
            if value.is_empty() {
                key.clone()
            } else {
                format!("{}={}", key, value)
            }
        })
        .collect::<Vec<String>>()
        .join("&");

    Ok(format!("{}?{}", path, query))
}

/// Indicates whether the query parameter takes part in the canonicalized resource.
#[inline]
pub fn is_signable_param(name: &str) -> bool {
    SIGNABLE_PARAMS.binary_search(&name).is_ok()
}

/// Decode a header value as UTF-8. Invalid sequences become U+FFFD.
pub fn header_value_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Returns a sorted dictionary containing the header names and their normalized values.
pub fn normalize_headers(headers: &HeaderMap<HeaderValue>) -> BTreeMap<String, Vec<String>> {
    let mut result = BTreeMap::<String, Vec<String>>::new();
    for (key, value) in headers.iter() {
        let key = key.as_str().to_lowercase();
        let value = normalize_header_value(value.as_bytes());
        result.entry(key).or_default().push(value);
    }

    result
}

/// Normalizes a header value by trimming leading and trailing whitespace.
pub fn normalize_header_value(value: &[u8]) -> String {
    header_value_to_string(value).trim_matches(|c: char| c == ' ' || c == '\t').to_string()
}

/// The first value of a header, or an empty string if it's absent.
fn first_header_value(headers: &HeaderMap<HeaderValue>, name: &str) -> String {
    headers.get(name).map(|v| header_value_to_string(v.as_bytes())).unwrap_or_default()
}

/// Split a raw query string into key/value pairs. Keys are percent-decoded; values are left as
/// transmitted and decoded when the resource is rendered.
fn split_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (percent_decode_str(key).decode_utf8_lossy().to_string(), value.to_string())
        })
        .collect()
}

fn timestamp_line(headers: &HeaderMap<HeaderValue>, timestamp: SigningTimestamp) -> Result<String, SignatureError> {
    match timestamp {
        SigningTimestamp::Expires(expires) => Ok(expires.to_string()),
        SigningTimestamp::DateHeader => {
            // The date then travels in the canonicalized x-qs-date header instead.
            if headers.contains_key(HDR_X_QS_DATE) {
                return Ok(String::new());
            }

            match headers.get(HDR_DATE) {
                Some(date) => Ok(normalize_header_value(date.as_bytes())),
                None => Err(SignatureError::InvalidInput(MSG_HEADER_DATE_REQUIRED.to_string())),
            }
        }
    }
}
