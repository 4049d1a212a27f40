use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use crate::services::auth::token_store::{TokenStore, TokenStoreError};

/// Only symmetric (HMAC) signatures are accepted.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Why a bearer credential was not accepted.
///
/// All variants end up as the same 401 for the client; the distinction is
/// only kept for logs.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token record not found")]
    NotFound,
    #[error("token store unavailable: {0}")]
    StoreUnavailable(#[from] TokenStoreError),
    #[error("malformed token: {0}")]
    Malformed(jsonwebtoken::errors::Error),
    #[error("unexpected signing method: {0:?}")]
    UnknownSigningMethod(Algorithm),
    #[error("signature verification failed")]
    BadSignature,
    #[error("token outside its validity window")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => Self::Expired,
            _ => Self::Malformed(e),
        }
    }
}

/// Claims carried by a verified access token.
///
/// - `scope` is a single capability label (e.g. "user", "admin")
/// - anything else the issuer put in the token is kept in `extra`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub", default)]
    pub subject: Option<String>,

    // A scope that is not a JSON string is treated as "no scope",
    // so authorization fails closed instead of authentication erroring out.
    #[serde(default, deserialize_with = "string_or_none")]
    pub scope: Option<String>,

    #[serde(rename = "exp", default)]
    pub expiry: Option<i64>,
    #[serde(rename = "iat", default)]
    pub issued_at: Option<i64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

/// HMAC access-token verifier backed by the shared token store.
///
/// - Key material is intentionally not printable via Debug.
pub struct TokenVerifier {
    store: Arc<dyn TokenStore>,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(secret: &[u8], leeway_seconds: u64, store: Arc<dyn TokenStore>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        // exp/nbf are checked when present; the store record is what proves liveness.
        validation.set_required_spec_claims::<&str>(&[]);
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = leeway_seconds;

        Self {
            store,
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Resolve a bearer credential into verified claims.
    ///
    /// 1. fetch the record stored for the credential
    /// 2. reject non-HMAC algorithms before touching the signature
    /// 3. verify signature (+ exp/nbf) and decode claims
    pub async fn verify(&self, credential: &str) -> Result<Claims, TokenError> {
        let record = self
            .store
            .fetch(credential)
            .await?
            .ok_or(TokenError::NotFound)?;

        let header = jsonwebtoken::decode_header(&record).map_err(TokenError::Malformed)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::UnknownSigningMethod(header.alg));
        }

        let data = jsonwebtoken::decode::<Claims>(&record, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }
}
