use serde::{Deserialize, Serialize};

use crate::models::SessionId;

/// Per-client state threaded through every call by the presentation shell.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: Option<SessionId>,
}

impl SessionContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_session(session_id: SessionId) -> Self {
        Self {
            session_id: Some(session_id),
        }
    }

    /// Builds a context from a client token; malformed tokens count as absent.
    pub fn from_token(token: Option<&str>) -> Self {
        Self {
            session_id: token.and_then(SessionId::parse),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.session_id.as_ref().map(SessionId::as_str)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedSession {
    pub context: SessionContext,
    pub session_id: SessionId,
    pub created: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SessionRegistry;

impl SessionRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Returns the context's session, minting one when absent. The returned context
    /// must replace the caller's copy.
    pub fn resolve_or_create(&self, context: &SessionContext) -> ResolvedSession {
        match &context.session_id {
            Some(session_id) => {
                tracing::debug!(session_id = session_id.as_str(), "using existing session");
                ResolvedSession {
                    context: context.clone(),
                    session_id: session_id.clone(),
                    created: false,
                }
            }
            None => {
                let session_id = SessionId::generate();
                tracing::info!(session_id = session_id.as_str(), "created new session");
                ResolvedSession {
                    context: SessionContext::with_session(session_id.clone()),
                    session_id,
                    created: true,
                }
            }
        }
    }

    /// Never mints a session.
    pub fn resolve(&self, context: &SessionContext) -> Option<SessionId> {
        context.session_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionContext, SessionRegistry};
    use crate::models::SessionId;

    #[test]
    fn empty_context_gets_a_fresh_session() {
        let registry = SessionRegistry::new();
        let resolved = registry.resolve_or_create(&SessionContext::empty());

        assert!(resolved.created);
        assert_eq!(resolved.context.session_id, Some(resolved.session_id.clone()));
    }

    #[test]
    fn resolving_a_threaded_context_is_idempotent() {
        let registry = SessionRegistry::new();
        let first = registry.resolve_or_create(&SessionContext::empty());
        let second = registry.resolve_or_create(&first.context);

        assert!(!second.created);
        assert_eq!(first.session_id, second.session_id);
        assert_eq!(first.context, second.context);
    }

    #[test]
    fn distinct_clients_get_distinct_sessions() {
        let registry = SessionRegistry::new();
        let a = registry.resolve_or_create(&SessionContext::empty());
        let b = registry.resolve_or_create(&SessionContext::empty());
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn resolve_never_mints() {
        let registry = SessionRegistry::new();
        assert!(registry.resolve(&SessionContext::empty()).is_none());

        let session = SessionId::generate();
        let context = SessionContext::with_session(session.clone());
        assert_eq!(registry.resolve(&context), Some(session));
    }

    #[test]
    fn malformed_token_is_treated_as_absent() {
        assert_eq!(
            SessionContext::from_token(Some("garbage")),
            SessionContext::empty()
        );
        assert_eq!(SessionContext::from_token(None), SessionContext::empty());

        let session = SessionId::generate();
        let context = SessionContext::from_token(Some(session.as_str()));
        assert_eq!(context.token(), Some(session.as_str()));
    }
}
