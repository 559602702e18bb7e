use std::sync::Arc;

use auth::Clock;

use crate::domain::access::errors::AccessError;
use crate::domain::access::principal::AuthenticatedPrincipal;
use crate::domain::access::principal::RequestContext;
use crate::domain::access::tokens::TokenService;
use crate::domain::subject::models::SubjectState;
use crate::domain::subject::ports::SubjectLookup;

/// Turns a presented token into an authentication decision.
///
/// Token validity (signature, expiry, credential freshness) is the token
/// service's job; the gate layers the subject's lifecycle checks on top and
/// binds the resulting principal to the request.
pub struct AuthenticationGate<L, C>
where
    L: SubjectLookup,
    C: Clock,
{
    tokens: Arc<TokenService<L, C>>,
}

impl<L, C> AuthenticationGate<L, C>
where
    L: SubjectLookup,
    C: Clock,
{
    pub fn new(tokens: Arc<TokenService<L, C>>) -> Self {
        Self { tokens }
    }

    /// Fully authenticate a raw token.
    ///
    /// # Errors
    /// Token-level failures from [`TokenService::parse_and_validate`], plus:
    /// * `AccountDisabled` - the subject is still waiting for activation
    /// * `AccountLocked` - the subject is blocked from logging in
    pub async fn authenticate(&self, raw: &str) -> Result<AuthenticatedPrincipal, AccessError> {
        let principal = self.tokens.parse_and_validate(raw).await?;

        match principal.subject().state {
            SubjectState::Waiting => {
                tracing::warn!(subject = %principal.id(), "authentication rejected: account disabled");
                Err(AccessError::AccountDisabled)
            }
            SubjectState::Blocked => {
                tracing::warn!(subject = %principal.id(), "authentication rejected: account locked");
                Err(AccessError::AccountLocked)
            }
            SubjectState::Active => Ok(principal),
        }
    }

    /// Authenticate the request's token header, if any.
    ///
    /// An absent header leaves the context anonymous and is not an error;
    /// a present header must authenticate fully or the request is rejected.
    pub async fn authenticate_request(
        &self,
        context: &mut RequestContext,
        raw: Option<&str>,
    ) -> Result<(), AccessError> {
        let Some(raw) = raw else {
            return Ok(());
        };

        let principal = self.authenticate(raw).await?;
        context.bind(principal);
        Ok(())
    }
}
