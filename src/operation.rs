//! The client-side description of a storage API request that needs to be signed.
use {
    crate::{
        canonical::{canonicalize, SigningTimestamp, StringToSign},
        SignatureError,
    },
    bytes::Bytes,
    derive_builder::Builder,
    http::header::{HeaderMap, HeaderName, HeaderValue},
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

/// Default HTTP method for an operation that doesn't specify one.
const DEFAULT_METHOD: &str = "GET";

/// A storage API request, as built by the client before it is sent.
///
/// The JSON form of an `Operation` is the request body of the `/operation` endpoint. Every field
/// is optional on the wire; missing fields take the values of [`Operation::default`].
#[derive(Builder, Clone, Debug, Deserialize, PartialEq, Serialize)]
#[builder(default, derive(Debug))]
pub struct Operation {
    /// The HTTP method, uppercased.
    #[builder(setter(custom))]
    #[serde(default = "default_method", deserialize_with = "method::deserialize")]
    method: String,

    /// The target URI. This may be absolute (`https://host:443/bucket`) or just a path and query.
    #[builder(setter(into))]
    #[serde(default)]
    uri: String,

    /// The request body. This is not part of the string to sign; integrity is conveyed through the
    /// `Content-MD5` header, if any.
    #[builder(setter(into))]
    #[serde(default, with = "body")]
    body: Bytes,

    /// Request headers. Names are case-insensitive; repeated names keep their insertion order.
    #[serde(default, with = "header_map")]
    headers: HeaderMap,

    /// Query parameters to be added to the URI. These take precedence over parameters of the same
    /// name already present in the URI's query string.
    #[serde(default, deserialize_with = "params::deserialize")]
    params: BTreeMap<String, String>,

    /// Expiry in seconds since the epoch. Only required for query signing.
    #[builder(setter(into, strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires: Option<i64>,
}

impl Default for Operation {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            uri: String::new(),
            body: Bytes::new(),
            headers: HeaderMap::new(),
            params: BTreeMap::new(),
            expires: None,
        }
    }
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

impl Operation {
    /// Create an [OperationBuilder] to construct an [Operation].
    #[inline]
    pub fn builder() -> OperationBuilder {
        OperationBuilder::default()
    }

    /// The HTTP method of the operation.
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The target URI, without any signature parameters applied.
    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The request body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The request headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the request headers.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The query parameters to be added to the URI.
    #[inline]
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Mutable access to the query parameters.
    #[inline]
    pub fn params_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.params
    }

    /// The expiry timestamp for query signing, if set.
    #[inline]
    pub fn expires(&self) -> Option<i64> {
        self.expires
    }

    /// Set or clear the expiry timestamp for query signing.
    #[inline]
    pub fn set_expires(&mut self, expires: Option<i64>) {
        self.expires = expires;
    }

    /// The string to sign for query signing with the given expiry.
    pub fn query_string_to_sign(&self, expires: i64) -> Result<StringToSign, SignatureError> {
        canonicalize(self, SigningTimestamp::Expires(expires))
    }

    /// The string to sign for header signing, dated by the `Date` or `X-QS-Date` header.
    pub fn header_string_to_sign(&self) -> Result<StringToSign, SignatureError> {
        canonicalize(self, SigningTimestamp::DateHeader)
    }

    /// Render the URI that should be transmitted: the operation's URI with [params](Self::params)
    /// merged into its query string.
    pub fn request_uri(&self) -> String {
        if self.params.is_empty() {
            return self.uri.clone();
        }

        let (base, query) = match self.uri.split_once('?') {
            Some((base, query)) => (base, query),
            None => (self.uri.as_str(), ""),
        };

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if !self.params.contains_key(&*key) {
                serializer.append_pair(&key, &value);
            }
        }

        for (key, value) in self.params.iter() {
            if value.is_empty() {
                serializer.append_key_only(key);
            } else {
                serializer.append_pair(key, value);
            }
        }

        let base = if base.is_empty() { "/" } else { base };

        format!("{}?{}", base, serializer.finish())
    }
}

impl OperationBuilder {
    /// Set the HTTP method. It is stored uppercased.
    pub fn method<S: Into<String>>(&mut self, method: S) -> &mut Self {
        self.method = Some(method.into().to_ascii_uppercase());
        self
    }
}

/// Header and parameter values on the wire may be strings, numbers, or booleans.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
    Null,
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
            Self::Flag(b) => b.to_string(),
            Self::Null => String::new(),
        }
    }
}

mod method {
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(String::deserialize(deserializer)?.to_ascii_uppercase())
    }
}

mod body {
    use {
        bytes::Bytes,
        serde::{Deserialize, Deserializer, Serializer},
    };

    pub(super) fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(body))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.map(Bytes::from).unwrap_or_default())
    }
}

mod header_map {
    use {
        super::{HeaderMap, HeaderName, HeaderValue, Scalar},
        crate::canonical::header_value_to_string,
        serde::{
            de::{Error as _, MapAccess, Visitor},
            ser::SerializeMap,
            Deserialize, Deserializer, Serializer,
        },
        std::fmt::{Formatter, Result as FmtResult},
    };

    /// A header on the wire: a single value or a list of values.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        One(Scalar),
        Many(Vec<Scalar>),
    }

    pub(super) fn serialize<S: Serializer>(headers: &HeaderMap, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(headers.keys_len()))?;
        for name in headers.keys() {
            let mut values: Vec<String> =
                headers.get_all(name).iter().map(|value| header_value_to_string(value.as_bytes())).collect();
            if values.len() == 1 {
                map.serialize_entry(name.as_str(), &values.remove(0))?;
            } else {
                map.serialize_entry(name.as_str(), &values)?;
            }
        }
        map.end()
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HeaderMap, D::Error> {
        Ok(Option::<WireHeaders>::deserialize(deserializer)?.map(|h| h.0).unwrap_or_default())
    }

    /// Headers in the order they appear on the wire, so case-variant duplicates keep that order.
    struct WireHeaders(HeaderMap);

    impl<'de> Deserialize<'de> for WireHeaders {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_map(WireHeadersVisitor)
        }
    }

    struct WireHeadersVisitor;

    impl<'de> Visitor<'de> for WireHeadersVisitor {
        type Value = WireHeaders;

        fn expecting(&self, f: &mut Formatter) -> FmtResult {
            f.write_str("a map of header names to values")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut headers = HeaderMap::with_capacity(access.size_hint().unwrap_or(0));

            while let Some((name, field)) = access.next_entry::<String, Field>()? {
                let header_name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| A::Error::custom(format!("Invalid header name: {}", name)))?;
                let values = match field {
                    Field::One(value) => vec![value],
                    Field::Many(values) => values,
                };

                for value in values {
                    let header_value = HeaderValue::from_str(&value.into_string())
                        .map_err(|_| A::Error::custom(format!("Invalid value for header {}", name)))?;
                    headers.append(header_name.clone(), header_value);
                }
            }

            Ok(WireHeaders(headers))
        }
    }
}

mod params {
    use {
        super::Scalar,
        serde::{Deserialize, Deserializer},
        std::collections::BTreeMap,
    };

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        let raw = Option::<BTreeMap<String, Scalar>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(raw.into_iter().map(|(key, value)| (key, value.into_string())).collect())
    }
}
