use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::TokenClaims;
use super::errors::TokenCodecError;

/// Signed token encoder/decoder.
///
/// HS256 (HMAC with SHA-256) over [`TokenClaims`]. The codec owns signature
/// and structural validity only; expiry and credential freshness are checked
/// by the token service against an injected clock and the subject's current
/// state.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenCodec {
    /// Create a codec from a shared secret.
    ///
    /// The secret should be at least 256 bits and come from configuration,
    /// never from source.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Encode and sign claims into an opaque token string.
    ///
    /// # Errors
    /// * `EncodingFailed` - serialization or signing failed
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenCodecError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenCodecError::EncodingFailed(e.to_string()))
    }

    /// Decode a token, verifying signature and structure.
    ///
    /// Any failure (bad signature, wrong shape, truncation) collapses into
    /// `Malformed`; callers cannot distinguish tampering from corruption and
    /// must not retry either.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenCodecError> {
        let mut validation = Validation::new(self.algorithm);
        // No `exp` claim on the wire; the service applies the window itself.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenCodecError::Malformed(e.to_string()))?;

        Ok(token_data.claims)
    }
}
