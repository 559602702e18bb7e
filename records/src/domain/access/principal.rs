use uuid::Uuid;

use crate::domain::subject::models::Subject;
use crate::domain::subject::models::SubjectRole;

/// Successfully authenticated subject, as attached to one in-flight request.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    subject: Subject,
}

impl AuthenticatedPrincipal {
    pub fn new(subject: Subject) -> Self {
        Self { subject }
    }

    pub fn id(&self) -> Uuid {
        self.subject.id
    }

    pub fn role(&self) -> SubjectRole {
        self.subject.role
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }
}

/// Per-request holder for the authenticated principal.
///
/// Passed explicitly through the call chain rather than living in ambient
/// task-local state; a context is built fresh for each request and dropped
/// with it, so nothing can leak across requests. Anonymous requests simply
/// never bind a principal.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    principal: Option<AuthenticatedPrincipal>,
}

impl RequestContext {
    /// Fresh, anonymous context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the principal for the remainder of this request.
    pub fn bind(&mut self, principal: AuthenticatedPrincipal) {
        self.principal = Some(principal);
    }

    pub fn principal(&self) -> Option<&AuthenticatedPrincipal> {
        self.principal.as_ref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.principal.is_none()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::record::models::RecordKind;
    use crate::domain::subject::models::SubjectDraft;
    use crate::domain::subject::models::SubjectKind;
    use crate::domain::subject::models::SubjectState;

    fn subject() -> Subject {
        let draft = SubjectDraft::parse(
            "alice".to_string(),
            "alice@example.com".to_string(),
            None,
            SubjectRole::Member,
            SubjectState::Active,
        )
        .unwrap();
        SubjectKind.materialize(draft, Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_context_starts_anonymous() {
        let ctx = RequestContext::new();
        assert!(ctx.is_anonymous());
        assert!(ctx.principal().is_none());
    }

    #[test]
    fn test_bind_attaches_principal() {
        let subject = subject();
        let id = subject.id;

        let mut ctx = RequestContext::new();
        ctx.bind(AuthenticatedPrincipal::new(subject));

        assert!(!ctx.is_anonymous());
        assert_eq!(ctx.principal().unwrap().id(), id);
        assert_eq!(ctx.principal().unwrap().role(), SubjectRole::Member);
    }
}
