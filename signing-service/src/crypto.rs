use {
    base64::{engine::general_purpose::STANDARD as BASE64, Engine},
    hmac::{Hmac, Mac},
    sha2::Sha256,
};

/// Length of a SHA-256 digest, in bytes.
pub(crate) const SHA256_OUTPUT_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Wrapper function to form a HMAC-SHA256 operation.
#[inline(always)]
pub(crate) fn hmac_sha256(key: &[u8], value: &[u8]) -> [u8; SHA256_OUTPUT_LEN] {
    // HMAC accepts keys of any length; new_from_slice cannot fail here.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take a key of any size");
    mac.update(value);

    let mut result = [0u8; SHA256_OUTPUT_LEN];
    result.copy_from_slice(&mac.finalize().into_bytes());
    result
}

/// Standard-alphabet, padded base64.
#[inline(always)]
pub(crate) fn base64_encode(value: &[u8]) -> String {
    BASE64.encode(value)
}

#[cfg(test)]
mod tests {
    use {
        super::{base64_encode, hmac_sha256},
        pretty_assertions::assert_eq,
    };

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test_log::test]
    fn known_answers() {
        let digest = hmac_sha256(b"SECRET", b"GET\n\n\n1489571836\n/bucket");
        assert_eq!(hex(&digest), "6b5c4b3428eda24194225ee76a5b906cbb2e18a4d4efd4010ee37c39e676e2f4");
        assert_eq!(base64_encode(&digest), "a1xLNCjtokGUIl7naluQbLsuGKTU79QBDuN8OeZ24vQ=");

        let digest = hmac_sha256(b"SECRET", b"");
        assert_eq!(hex(&digest), "95ccedba61b3d42254e24e5e651e5141ac06a071479296924e6e25d0e7882859");
    }

    #[test_log::test]
    fn base64_padding() {
        assert_eq!(base64_encode(b""), "");
        assert_eq!(base64_encode(b"f"), "Zg==");
        assert_eq!(base64_encode(b"\xfb\xff"), "+/8=");
    }
}
