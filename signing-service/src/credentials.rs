use std::{
    error::Error,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
};

/// A raw QingStor secret access key.
///
/// Neither `Debug` nor `Display` reveal the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretAccessKey {
    key: String,
}

impl SecretAccessKey {
    /// Wrap a raw secret key.
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self {
            key: key.into(),
        }
    }

    /// Indicates whether the key is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl AsRef<[u8]> for SecretAccessKey {
    fn as_ref(&self) -> &[u8] {
        self.key.as_bytes()
    }
}

impl Debug for SecretAccessKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("SecretAccessKey")
    }
}

impl Display for SecretAccessKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("SecretAccessKey")
    }
}

/// The long-lived credential pair. Loaded once at startup and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: SecretAccessKey,
}

impl Credentials {
    /// Create a credential pair.
    ///
    /// # Errors
    /// [CredentialsError] if either half is empty.
    pub fn new<A, S>(access_key_id: A, secret_access_key: S) -> Result<Self, CredentialsError>
    where
        A: Into<String>,
        S: Into<String>,
    {
        let access_key_id = access_key_id.into();
        if access_key_id.is_empty() {
            return Err(CredentialsError::MissingAccessKeyId);
        }

        let secret_access_key = SecretAccessKey::new(secret_access_key);
        if secret_access_key.is_empty() {
            return Err(CredentialsError::MissingSecretAccessKey);
        }

        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }

    /// The public half of the credential pair. This is safe to log and to return to clients.
    #[inline]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    #[inline]
    pub(crate) fn secret_access_key(&self) -> &SecretAccessKey {
        &self.secret_access_key
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key)
            .finish()
    }
}

/// Error returned when credentials are incomplete.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CredentialsError {
    /// No access key id was configured.
    MissingAccessKeyId,

    /// No secret access key was configured.
    MissingSecretAccessKey,
}

impl Display for CredentialsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::MissingAccessKeyId => f.write_str("access_key_id is not configured"),
            Self::MissingSecretAccessKey => f.write_str("secret_access_key is not configured"),
        }
    }
}

impl Error for CredentialsError {}

#[cfg(test)]
mod tests {
    use {
        super::{Credentials, CredentialsError, SecretAccessKey},
        pretty_assertions::assert_eq,
    };

    #[test_log::test]
    fn redacted() {
        let creds = Credentials::new("AKID", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY").unwrap();
        let debug = format!("{:?}", creds);
        assert_eq!(debug, r#"Credentials { access_key_id: "AKID", secret_access_key: SecretAccessKey }"#);
        assert!(!debug.contains("wJalr"));
        assert_eq!(format!("{}", creds.secret_access_key()), "SecretAccessKey");
        assert_eq!(format!("{:#?}", SecretAccessKey::new("hunter2")), "SecretAccessKey");
        assert_eq!(creds.access_key_id(), "AKID");
        assert_eq!(creds.secret_access_key().as_ref(), b"wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
    }

    #[test_log::test]
    fn incomplete() {
        assert_eq!(Credentials::new("", "SECRET").unwrap_err(), CredentialsError::MissingAccessKeyId);
        assert_eq!(Credentials::new("AKID", "").unwrap_err(), CredentialsError::MissingSecretAccessKey);
        assert_eq!(CredentialsError::MissingAccessKeyId.to_string(), "access_key_id is not configured");
        assert_eq!(CredentialsError::MissingSecretAccessKey.to_string(), "secret_access_key is not configured");
    }
}
