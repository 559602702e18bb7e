use std::sync::Arc;

use auth::AliasCache;
use auth::Clock;
use auth::TokenClaims;
use auth::TokenCodec;
use auth::TokenCodecError;
use uuid::Uuid;

use crate::domain::access::errors::AccessError;
use crate::domain::access::principal::AuthenticatedPrincipal;
use crate::domain::subject::models::Subject;
use crate::domain::subject::ports::SubjectLookup;

/// Issues, refreshes and validates stateless authentication tokens.
///
/// A token carries its subject, a time-to-live marker, and the subject's
/// credential fingerprint at issuance. Validation re-reads the subject and
/// compares fingerprints, so a password change invalidates every outstanding
/// token without any revocation list; the price is one subject lookup per
/// validation, which the caller needs anyway to build the principal.
pub struct TokenService<L, C>
where
    L: SubjectLookup,
    C: Clock,
{
    codec: TokenCodec,
    clock: Arc<C>,
    lookup: Arc<L>,
    ttl_window_millis: i64,
    aliases: AliasCache<C>,
}

impl<L, C> TokenService<L, C>
where
    L: SubjectLookup,
    C: Clock,
{
    pub fn new(
        codec: TokenCodec,
        clock: Arc<C>,
        lookup: Arc<L>,
        ttl_window_millis: i64,
        aliases: AliasCache<C>,
    ) -> Self {
        Self {
            codec,
            clock,
            lookup,
            ttl_window_millis,
            aliases,
        }
    }

    /// Issue a token for the subject, marked at the current instant.
    ///
    /// Pure with respect to persisted state.
    pub fn issue(&self, subject: &Subject) -> Result<String, AccessError> {
        self.issue_with_marker(subject, self.clock.now_millis())
    }

    /// Issue a token with a caller-chosen time-to-live marker.
    ///
    /// A marker far enough in the future yields an effectively non-expiring
    /// token; policy over how far is the caller's.
    pub fn issue_with_marker(
        &self,
        subject: &Subject,
        ttl_marker_millis: i64,
    ) -> Result<String, AccessError> {
        let claims = TokenClaims::new(subject.id, ttl_marker_millis, subject.fingerprint_millis());
        self.codec
            .encode(&claims)
            .map_err(|e| AccessError::TokenCreation(e.to_string()))
    }

    /// Decode and fully validate a presented token.
    ///
    /// # Errors
    /// * `MalformedToken` - bad signature or structure
    /// * `ExpiredToken` - marker aged out of the window (valid exactly at the boundary)
    /// * `SubjectNotFound` - the subject no longer exists
    /// * `StaleCredentials` - the subject's credentials changed after issuance
    /// * `Storage` - subject lookup failed
    pub async fn parse_and_validate(
        &self,
        raw: &str,
    ) -> Result<AuthenticatedPrincipal, AccessError> {
        let claims = self.codec.decode(raw).map_err(|e| match e {
            TokenCodecError::Malformed(reason) => {
                tracing::warn!(%reason, "rejected malformed token");
                AccessError::MalformedToken
            }
            TokenCodecError::EncodingFailed(reason) => {
                tracing::warn!(%reason, "rejected undecodable token");
                AccessError::MalformedToken
            }
        })?;

        if claims.is_expired(self.clock.now_millis(), self.ttl_window_millis) {
            return Err(AccessError::ExpiredToken);
        }

        let subject = self
            .lookup
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AccessError::SubjectNotFound)?;

        if claims.fingerprint_millis != subject.fingerprint_millis() {
            tracing::warn!(subject = %subject.id, "rejected token with stale credential fingerprint");
            return Err(AccessError::StaleCredentials);
        }

        Ok(AuthenticatedPrincipal::new(subject))
    }

    /// Re-issue a token for an already-authenticated principal.
    ///
    /// Requires a bound principal; a raw token is not enough, the caller must
    /// have passed `parse_and_validate` earlier in this request.
    pub fn refresh(
        &self,
        principal: Option<&AuthenticatedPrincipal>,
    ) -> Result<String, AccessError> {
        let principal = principal.ok_or(AccessError::NoPrincipal)?;
        self.issue(principal.subject())
    }

    /// Mint a short-lived alias that can later be exchanged for a token.
    pub fn mint_alias(&self, subject_id: Uuid) -> Uuid {
        self.aliases.mint(subject_id)
    }

    /// Exchange an alias for a freshly issued token.
    ///
    /// An unknown or expired alias, and an alias whose subject has since been
    /// deleted, all yield `Ok(None)`: the request simply proceeds without the
    /// expected authentication token rather than failing.
    pub async fn redeem_alias(&self, alias: Uuid) -> Result<Option<String>, AccessError> {
        let Some(subject_id) = self.aliases.resolve(alias) else {
            tracing::debug!(%alias, "alias unknown or expired, continuing unauthenticated");
            return Ok(None);
        };

        let Some(subject) = self.lookup.find_by_id(&subject_id).await? else {
            tracing::debug!(%alias, subject = %subject_id, "alias subject no longer exists");
            return Ok(None);
        };

        Ok(Some(self.issue(&subject)?))
    }
}
