//! HMAC-SHA256 signing of strings to sign, in query, header, and raw modes.
//!
//! This is the only place the secret access key is used.
use {
    crate::{
        credentials::Credentials,
        crypto::{base64_encode, hmac_sha256, SHA256_OUTPUT_LEN},
    },
    log::debug,
    qs_signature::{HeaderAuthorization, Operation, QuerySignature, SignatureError, StringToSign},
    std::{
        fmt::{Debug, Formatter, Result as FmtResult},
        sync::Arc,
    },
};

/// Compute the raw HMAC-SHA256 of a string to sign.
pub fn sign(string_to_sign: &StringToSign, credentials: &Credentials) -> [u8; SHA256_OUTPUT_LEN] {
    hmac_sha256(credentials.secret_access_key().as_ref(), string_to_sign.as_str().as_bytes())
}

/// Compute the base64 signature of an arbitrary string.
pub fn sign_raw(string_to_sign: &str, credentials: &Credentials) -> String {
    base64_encode(&hmac_sha256(credentials.secret_access_key().as_ref(), string_to_sign.as_bytes()))
}

/// Canonicalize and sign an operation for query-parameter authentication.
///
/// # Errors
/// [SignatureError::InvalidInput] if `expires` is `None` or the operation cannot be canonicalized.
/// Nothing is signed in that case.
pub fn sign_for_query(
    operation: &Operation,
    credentials: &Credentials,
    expires: Option<i64>,
) -> Result<QuerySignature, SignatureError> {
    let expires = expires.ok_or_else(SignatureError::expires_required)?;
    let string_to_sign = operation.query_string_to_sign(expires)?;
    Ok(query_signature(string_to_sign.as_str(), credentials, expires))
}

/// Canonicalize and sign an operation for `Authorization` header authentication.
///
/// # Errors
/// [SignatureError::InvalidInput] if the operation has neither a `Date` nor an `X-QS-Date` header, or
/// cannot be canonicalized.
pub fn sign_for_header(operation: &Operation, credentials: &Credentials) -> Result<HeaderAuthorization, SignatureError> {
    let string_to_sign = operation.header_string_to_sign()?;
    Ok(header_authorization(string_to_sign.as_str(), credentials))
}

/// Sign a string to sign that the client canonicalized itself, for query-parameter authentication.
///
/// # Errors
/// [SignatureError::InvalidInput] if `expires` is `None`.
pub fn sign_string_for_query(
    string_to_sign: &str,
    credentials: &Credentials,
    expires: Option<i64>,
) -> Result<QuerySignature, SignatureError> {
    let expires = expires.ok_or_else(SignatureError::expires_required)?;
    Ok(query_signature(string_to_sign, credentials, expires))
}

/// Sign a string to sign that the client canonicalized itself, for `Authorization` header
/// authentication.
pub fn sign_string_for_header(string_to_sign: &str, credentials: &Credentials) -> HeaderAuthorization {
    header_authorization(string_to_sign, credentials)
}

fn query_signature(string_to_sign: &str, credentials: &Credentials, expires: i64) -> QuerySignature {
    let signature = sign_raw(string_to_sign, credentials);
    debug!("Query signature computed for access key {}", credentials.access_key_id());
    QuerySignature {
        access_key_id: credentials.access_key_id().to_string(),
        signature,
        expires,
    }
}

fn header_authorization(string_to_sign: &str, credentials: &Credentials) -> HeaderAuthorization {
    let signature = sign_raw(string_to_sign, credentials);
    debug!("Authorization computed for access key {}", credentials.access_key_id());
    HeaderAuthorization::new(credentials.access_key_id(), &signature)
}

/// Shared handle on the service's credentials that exposes the signing operations.
#[derive(Clone)]
pub struct Signer {
    credentials: Arc<Credentials>,
}

impl Signer {
    /// Create a signer owning `credentials`.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }

    /// The access key id signatures are issued for.
    #[inline]
    pub fn access_key_id(&self) -> &str {
        self.credentials.access_key_id()
    }

    /// See [sign_raw].
    #[inline]
    pub fn sign_raw(&self, string_to_sign: &str) -> String {
        sign_raw(string_to_sign, &self.credentials)
    }

    /// See [sign_for_query].
    #[inline]
    pub fn sign_for_query(&self, operation: &Operation, expires: Option<i64>) -> Result<QuerySignature, SignatureError> {
        sign_for_query(operation, &self.credentials, expires)
    }

    /// See [sign_for_header].
    #[inline]
    pub fn sign_for_header(&self, operation: &Operation) -> Result<HeaderAuthorization, SignatureError> {
        sign_for_header(operation, &self.credentials)
    }

    /// See [sign_string_for_query].
    #[inline]
    pub fn sign_string_for_query(
        &self,
        string_to_sign: &str,
        expires: Option<i64>,
    ) -> Result<QuerySignature, SignatureError> {
        sign_string_for_query(string_to_sign, &self.credentials, expires)
    }

    /// See [sign_string_for_header].
    #[inline]
    pub fn sign_string_for_header(&self, string_to_sign: &str) -> HeaderAuthorization {
        sign_string_for_header(string_to_sign, &self.credentials)
    }
}

impl Debug for Signer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Signer").field("access_key_id", &self.credentials.access_key_id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{sign, sign_for_header, sign_for_query, sign_raw, sign_string_for_header, sign_string_for_query, Signer},
        crate::credentials::Credentials,
        http::header::HeaderValue,
        pretty_assertions::assert_eq,
        qs_signature::{canonicalize, Operation, SignatureError, SigningTimestamp, StringToSign},
        regex::Regex,
        std::collections::BTreeMap,
    };

    fn creds() -> Credentials {
        Credentials::new("AKID", "SECRET").unwrap()
    }

    fn list_objects() -> Operation {
        let mut params = BTreeMap::new();
        params.insert("prefix".to_string(), "test/".to_string());
        Operation::builder().uri("https://pek3a.qingstor.com:443/bucket?prefix=test/").params(params).build().unwrap()
    }

    fn put_object() -> Operation {
        let mut op = Operation::builder()
            .method("PUT")
            .uri("https://pek3a.qingstor.com:443/bucket/test-file")
            .body(&b"Hello"[..])
            .build()
            .unwrap();
        op.headers_mut().insert("content-length", HeaderValue::from_static("5"));
        op.headers_mut().insert("date", HeaderValue::from_static("Wed, 15 Mar 2017 08:57:16 GMT"));
        op
    }

    #[test_log::test]
    fn raw_vectors() {
        let creds = creds();
        assert_eq!(sign_raw("GET\n\n\n1489571836\n/bucket", &creds), "a1xLNCjtokGUIl7naluQbLsuGKTU79QBDuN8OeZ24vQ=");
        assert_eq!(
            sign_raw("GET\n\n\n1489571836\n/bucket/test-file", &creds),
            "h3KVkN9c0j7LkptkjN9bpSFvcfMD1ebHqLeXASHcKRg="
        );
        assert_eq!(
            sign_raw("DELETE\n\n\nWed, 15 Mar 2017 08:57:16 GMT\n/bucket/test-file", &creds),
            "L2TMnsFVnkBzW9svwHSLqN3Zs0gZtJgqHLYwgG3G2QQ="
        );
        assert_eq!(sign_raw("", &creds), "lcztumGz1CJU4k5eZR5RQawGoHFHkpaSTm4l0OeIKFk=");

        let digest = sign(&StringToSign::from("GET\n\n\n1489571836\n/bucket"), &creds);
        assert_eq!(&digest[..4], &[0x6bu8, 0x5c, 0x4b, 0x34][..]);
    }

    #[test_log::test]
    fn query_list_objects() {
        let sig = sign_for_query(&list_objects(), &creds(), Some(1489571836)).unwrap();
        assert_eq!(sig.access_key_id, "AKID");
        assert_eq!(sig.signature, "a1xLNCjtokGUIl7naluQbLsuGKTU79QBDuN8OeZ24vQ=");
        assert_eq!(sig.expires, 1489571836);
    }

    #[test_log::test]
    fn query_requires_expires() {
        let e = sign_for_query(&list_objects(), &creds(), None).unwrap_err();
        assert!(matches!(e, SignatureError::InvalidInput(_)));
        assert_eq!(e.to_string(), "Query signing requires 'expires'.");

        let e = sign_string_for_query("GET\n\n\n1\n/", &creds(), None).unwrap_err();
        assert!(matches!(e, SignatureError::InvalidInput(_)));
    }

    #[test_log::test]
    fn header_put_object() {
        let auth = sign_for_header(&put_object(), &creds()).unwrap();
        assert_eq!(auth.authorization, "QS AKID:73yyLeG63woWE/UbyPbIZANpAvrBKIHUnHVCSy+JE7I=");

        let mut op = put_object();
        op.headers_mut().remove("date");
        op.headers_mut().insert("x-qs-date", HeaderValue::from_static("Wed, 15 Mar 2017 08:57:16 GMT"));
        let auth = sign_for_header(&op, &creds()).unwrap();
        assert_eq!(auth.authorization, "QS AKID:2MPtnI/Whf226wgGdft9CPHeoGQabIdwPXeL1/Eh9hk=");
    }

    #[test_log::test]
    fn header_requires_date() {
        let mut op = put_object();
        op.headers_mut().remove("date");
        let e = sign_for_header(&op, &creds()).unwrap_err();
        assert!(matches!(e, SignatureError::InvalidInput(_)));
    }

    #[test_log::test]
    fn channel_equivalence() {
        let creds = creds();
        for expires in [0, 1489571836, i64::MAX] {
            let op = list_objects();
            let by_operation = sign_for_query(&op, &creds, Some(expires)).unwrap();
            let sts = canonicalize(&op, SigningTimestamp::Expires(expires)).unwrap();
            assert_eq!(by_operation.signature, sign_raw(sts.as_str(), &creds));
            assert_eq!(by_operation, sign_string_for_query(sts.as_str(), &creds, Some(expires)).unwrap());
        }

        let op = put_object();
        let sts = op.header_string_to_sign().unwrap();
        assert_eq!(sign_for_header(&op, &creds).unwrap(), sign_string_for_header(sts.as_str(), &creds));
    }

    #[test_log::test]
    fn header_format() {
        let re = Regex::new(r"^QS AKID:[A-Za-z0-9+/]+={0,2}$").unwrap();
        for sts in ["", "a", "GET\n\n\n1\n/", "\u{1F600}"] {
            let auth = sign_string_for_header(sts, &creds());
            assert!(re.is_match(&auth.authorization), "{}", auth.authorization);
            let (id, sig) = auth.parse().unwrap();
            assert_eq!(id, "AKID");
            assert_eq!(sig.len(), 44);
        }
    }

    #[test_log::test]
    fn signer_handle() {
        let signer = Signer::new(creds());
        assert_eq!(signer.access_key_id(), "AKID");
        assert_eq!(format!("{:?}", signer), r#"Signer { access_key_id: "AKID" }"#);
        assert!(!format!("{:?}", signer).contains("SECRET"));

        let clone = signer.clone();
        assert_eq!(
            clone.sign_for_query(&list_objects(), Some(1489571836)).unwrap(),
            signer.sign_string_for_query("GET\n\n\n1489571836\n/bucket", Some(1489571836)).unwrap()
        );
        assert_eq!(signer.sign_for_header(&put_object()).unwrap().parse().unwrap().0, "AKID");
        assert_eq!(signer.sign_raw(""), "lcztumGz1CJU4k5eZR5RQawGoHFHkpaSTm4l0OeIKFk=");
    }
}
