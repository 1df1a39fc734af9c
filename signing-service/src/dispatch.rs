//! Maps an (endpoint, channel) pair to the signing function that serves it.
use {
    crate::signer::Signer,
    log::{debug, warn},
    qs_signature::{
        channel::Empty, Channel, DelegationResponse, Endpoint, OperationRequest, SignatureError, StringToSignRequest,
    },
    serde::de::{DeserializeOwned, IgnoredAny},
};

/// Content-Type string for HTML forms
const APPLICATION_X_WWW_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// How a request body is encoded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BodyFormat {
    /// `application/json`, or anything unrecognized.
    #[default]
    Json,

    /// `application/x-www-form-urlencoded`. Only the `/string-to-sign` endpoint accepts this.
    Form,
}

impl BodyFormat {
    /// Determine the body format from a `Content-Type` header value. Parameters such as `charset`
    /// are ignored.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let media_type = content_type.and_then(|ct| ct.split(';').next()).map(|mt| mt.trim().to_ascii_lowercase());

        match media_type.as_deref() {
            Some(APPLICATION_X_WWW_FORM_URLENCODED) => Self::Form,
            _ => Self::Json,
        }
    }
}

/// Handle one delegation request.
///
/// An empty body is treated as `{}`. An unrecognized channel is answered with
/// [DelegationResponse::Empty] and nothing is signed; its body only has to be well-formed JSON, not
/// a valid request.
///
/// # Errors
/// [SignatureError::InvalidInput] if the body cannot be decoded or the request cannot be signed on
/// the requested channel.
pub fn dispatch(
    endpoint: Endpoint,
    channel: &Channel,
    body: &[u8],
    format: BodyFormat,
    signer: &Signer,
) -> Result<DelegationResponse, SignatureError> {
    if let Channel::Unknown(name) = channel {
        if format == BodyFormat::Json {
            decode_json::<Option<IgnoredAny>>(body)?;
        }

        warn!("Unknown channel {:?} on {}; nothing signed", name, endpoint);
        return Ok(DelegationResponse::Empty(Empty {}));
    }

    let response: DelegationResponse = match endpoint {
        Endpoint::Operation => {
            let request: OperationRequest = decode_json(body)?;
            match channel {
                Channel::Query => signer.sign_for_query(&request, request.expires())?.into(),
                _ => signer.sign_for_header(&request)?.into(),
            }
        }
        Endpoint::StringToSign => {
            let request = match format {
                BodyFormat::Json => decode_json::<StringToSignRequest>(body)?,
                BodyFormat::Form => StringToSignRequest::from_form(body)?,
            };
            match channel {
                Channel::Query => signer.sign_string_for_query(&request.string_to_sign, request.expires)?.into(),
                _ => signer.sign_string_for_header(&request.string_to_sign).into(),
            }
        }
    };

    Ok(response)
}

fn decode_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, SignatureError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        debug!("Empty request body; using defaults");
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| SignatureError::InvalidInput(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use {
        super::{dispatch, BodyFormat},
        crate::{credentials::Credentials, signer::Signer},
        pretty_assertions::assert_eq,
        qs_signature::{
            channel::Empty, Channel, DelegationResponse, Endpoint, HeaderAuthorization, QuerySignature, SignatureError,
        },
    };

    fn signer() -> Signer {
        Signer::new(Credentials::new("AKID", "SECRET").unwrap())
    }

    fn query(signature: &str, expires: i64) -> DelegationResponse {
        DelegationResponse::Query(QuerySignature {
            access_key_id: "AKID".to_string(),
            signature: signature.to_string(),
            expires,
        })
    }

    #[test_log::test]
    fn body_format() {
        assert_eq!(BodyFormat::from_content_type(None), BodyFormat::Json);
        assert_eq!(BodyFormat::from_content_type(Some("application/json; charset=utf-8")), BodyFormat::Json);
        assert_eq!(BodyFormat::from_content_type(Some("application/x-www-form-urlencoded")), BodyFormat::Form);
        assert_eq!(
            BodyFormat::from_content_type(Some("Application/X-WWW-Form-URLEncoded; charset=UTF-8")),
            BodyFormat::Form
        );
        assert_eq!(BodyFormat::from_content_type(Some("text/plain")), BodyFormat::Json);
    }

    #[test_log::test]
    fn operation_query() {
        let body = br#"{"uri":"https://pek3a.qingstor.com:443/bucket?prefix=test/","params":{"prefix":"test/"},"expires":1489571836}"#;
        let response = dispatch(Endpoint::Operation, &Channel::Query, body, BodyFormat::Json, &signer()).unwrap();
        assert_eq!(response, query("a1xLNCjtokGUIl7naluQbLsuGKTU79QBDuN8OeZ24vQ=", 1489571836));
    }

    #[test_log::test]
    fn operation_query_without_expires() {
        let body = br#"{"uri":"/bucket"}"#;
        let e = dispatch(Endpoint::Operation, &Channel::Query, body, BodyFormat::Json, &signer()).unwrap_err();
        assert!(matches!(e, SignatureError::InvalidInput(_)));
    }

    #[test_log::test]
    fn operation_header() {
        let body = br#"{
            "method": "PUT",
            "uri": "https://pek3a.qingstor.com:443/bucket/test-file",
            "body": "Hello",
            "headers": {"Content-Length": 5, "Date": "Wed, 15 Mar 2017 08:57:16 GMT"}
        }"#;
        let response = dispatch(Endpoint::Operation, &Channel::Header, body, BodyFormat::Json, &signer()).unwrap();
        assert_eq!(
            response,
            DelegationResponse::Header(HeaderAuthorization::new("AKID", "73yyLeG63woWE/UbyPbIZANpAvrBKIHUnHVCSy+JE7I="))
        );
    }

    #[test_log::test]
    fn string_to_sign_json() {
        let body = br#"{"string_to_sign":"GET\n\n\n1489571836\n/bucket/test-file","expires":1489571836}"#;
        let response = dispatch(Endpoint::StringToSign, &Channel::Query, body, BodyFormat::Json, &signer()).unwrap();
        assert_eq!(response, query("h3KVkN9c0j7LkptkjN9bpSFvcfMD1ebHqLeXASHcKRg=", 1489571836));

        let body = br#"{"string_to_sign":"DELETE\n\n\nWed, 15 Mar 2017 08:57:16 GMT\n/bucket/test-file"}"#;
        let response = dispatch(Endpoint::StringToSign, &Channel::Header, body, BodyFormat::Json, &signer()).unwrap();
        assert_eq!(
            response,
            DelegationResponse::Header(HeaderAuthorization::new("AKID", "L2TMnsFVnkBzW9svwHSLqN3Zs0gZtJgqHLYwgG3G2QQ="))
        );
    }

    #[test_log::test]
    fn string_to_sign_form() {
        let body = b"string_to_sign=GET%0A%0A%0A1489571836%0A%2Fbucket%2Ftest-file&expires=1489571836";
        let response = dispatch(Endpoint::StringToSign, &Channel::Query, body, BodyFormat::Form, &signer()).unwrap();
        assert_eq!(response, query("h3KVkN9c0j7LkptkjN9bpSFvcfMD1ebHqLeXASHcKRg=", 1489571836));
    }

    #[test_log::test]
    fn empty_string_to_sign() {
        let response = dispatch(Endpoint::StringToSign, &Channel::Header, b"", BodyFormat::Json, &signer()).unwrap();
        assert_eq!(
            response,
            DelegationResponse::Header(HeaderAuthorization::new("AKID", "lcztumGz1CJU4k5eZR5RQawGoHFHkpaSTm4l0OeIKFk="))
        );
    }

    #[test_log::test]
    fn unknown_channel() {
        for endpoint in [Endpoint::Operation, Endpoint::StringToSign] {
            for channel in [Channel::from("bogus"), Channel::from("")] {
                let response = dispatch(endpoint, &channel, b"{}", BodyFormat::Json, &signer()).unwrap();
                assert_eq!(response, DelegationResponse::Empty(Empty {}));
            }
        }
    }

    #[test_log::test]
    fn unknown_channel_ignores_request_shape() {
        let bodies: [&[u8]; 6] = [
            br#"{"headers":{"Bad Name":"x"}}"#,
            br#"{"expires":"soon"}"#,
            br#"{"method":5}"#,
            br#"{"string_to_sign":["a"]}"#,
            b"[1, 2, 3]",
            b"  ",
        ];

        for endpoint in [Endpoint::Operation, Endpoint::StringToSign] {
            for body in bodies {
                let response = dispatch(endpoint, &Channel::from("bogus"), body, BodyFormat::Json, &signer()).unwrap();
                assert_eq!(response, DelegationResponse::Empty(Empty {}), "{}", String::from_utf8_lossy(body));
            }
        }

        let response =
            dispatch(Endpoint::StringToSign, &Channel::from("bogus"), b"expires=x", BodyFormat::Form, &signer()).unwrap();
        assert_eq!(response, DelegationResponse::Empty(Empty {}));
    }

    #[test_log::test]
    fn malformed_body() {
        let e = dispatch(Endpoint::Operation, &Channel::Header, b"{", BodyFormat::Json, &signer()).unwrap_err();
        assert!(matches!(e, SignatureError::InvalidInput(_)));
        assert!(e.to_string().starts_with("Invalid request body: "));

        // Unknown channels still need well-formed JSON.
        let e = dispatch(Endpoint::Operation, &Channel::from("bogus"), b"{", BodyFormat::Json, &signer()).unwrap_err();
        assert!(matches!(e, SignatureError::InvalidInput(_)));

        let e = dispatch(Endpoint::Operation, &Channel::Query, br#"{"method":5}"#, BodyFormat::Json, &signer())
            .unwrap_err();
        assert!(matches!(e, SignatureError::InvalidInput(_)));

        let e = dispatch(Endpoint::StringToSign, &Channel::Query, b"expires=x", BodyFormat::Form, &signer()).unwrap_err();
        assert!(matches!(e, SignatureError::InvalidInput(_)));
    }

    #[test_log::test]
    fn no_secret_in_any_response() {
        let bodies: [(Endpoint, Channel, &[u8]); 4] = [
            (Endpoint::Operation, Channel::Query, br#"{"expires":1}"#),
            (Endpoint::Operation, Channel::Header, br#"{"headers":{"Date":"Wed, 15 Mar 2017 08:57:16 GMT"}}"#),
            (Endpoint::StringToSign, Channel::Query, br#"{"string_to_sign":"SECRET","expires":1}"#),
            (Endpoint::StringToSign, Channel::Header, br#"{"string_to_sign":"x"}"#),
        ];

        let signer = Signer::new(Credentials::new("AKID", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY").unwrap());
        for (endpoint, channel, body) in bodies {
            let response = dispatch(endpoint, &channel, body, BodyFormat::Json, &signer).unwrap();
            let json = serde_json::to_string(&response).unwrap();
            assert!(!json.contains("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"), "{}", json);
        }
    }
}
