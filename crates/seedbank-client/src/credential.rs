use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

/// Tolerance applied to `exp` when checking a credential.
pub const CLOCK_SKEW_SECS: u64 = 60;

/// A credential issued by the seed bank whose signature has been checked.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    raw: String,
    expires_at: DateTime<Utc>,
    subject: Option<String>,
}

impl AuthToken {
    /// The compact token exactly as received; this is what gets sent back on submit.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// Keep the bearer string out of logs.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("expires_at", &self.expires_at)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

/// Why a verification key could not be loaded.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("unable to read verification key {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid verification key: {0}")]
    Parse(#[from] JwtError),
}

#[derive(Debug, Deserialize)]
struct CredentialClaims {
    exp: i64,
    #[serde(default)]
    sub: Option<String>,
}

/// Checks ES256 credentials against the seed bank's public key.
#[derive(Clone)]
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    /// `pem` is an SPKI public key (`-----BEGIN PUBLIC KEY-----`).
    pub fn from_pem(pem: &[u8]) -> Result<Self, JwtError> {
        let key = DecodingKey::from_ec_pem(pem)?;
        let mut validation = Validation::new(Algorithm::ES256);
        validation.leeway = CLOCK_SKEW_SECS;
        validation.validate_aud = false;
        Ok(Self { key, validation })
    }

    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|source| KeyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_pem(&pem)?)
    }

    /// Verify the signature and expiry of `token`. Surrounding whitespace is ignored.
    pub fn verify(&self, token: &str) -> Result<AuthToken, JwtError> {
        let token = token.trim();
        let data = decode::<CredentialClaims>(token, &self.key, &self.validation)?;
        let expires_at = DateTime::<Utc>::from_timestamp(data.claims.exp, 0)
            .ok_or_else(|| JwtError::from(JwtErrorKind::InvalidToken))?;
        Ok(AuthToken {
            raw: token.to_string(),
            expires_at,
            subject: data.claims.sub,
        })
    }
}

impl fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}
