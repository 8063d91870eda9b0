//! Route guards.
//!
//! A guard holds only its static requirement. Every decision is recomputed
//! from the session snapshot it is handed, so guards carry no state between
//! navigations. Denials are ordinary outcomes, traced at debug level only.

use tracing::debug;

use crate::identity::{PermissionEvaluator, Session};
use crate::navigation::{DASHBOARD_PATH, FORBIDDEN_PATH, LOGIN_PATH};

/// Permission a route asks for. When both keys are set the id decides and the
/// name is never consulted. When neither is set any authenticated session
/// passes; that is a permissive default, so routes should always name one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionRequirement {
    pub id: Option<u32>,
    pub name: Option<String>,
}

impl PermissionRequirement {
    pub fn by_id(id: u32) -> Self { Self { id: Some(id), name: None } }

    pub fn by_name<S: Into<String>>(name: S) -> Self { Self { id: None, name: Some(name.into()) } }

    pub fn none() -> Self { Self::default() }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_unconstrained(&self) -> bool { self.id.is_none() && self.name.is_none() }

    pub fn is_satisfied_by(&self, ev: &PermissionEvaluator<'_>) -> bool {
        match (self.id, self.name.as_deref()) {
            (Some(id), _) => ev.has_permission_by_id(id),
            (None, Some(name)) => ev.has_permission_by_name(name),
            (None, None) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Only for visitors without a session (login, password reset).
    PublicOnly,
    /// Any authenticated session.
    Authenticated,
    /// Authenticated and holding the requirement.
    Permission(PermissionRequirement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    AuthenticatedUnauthorized,
    AuthenticatedAuthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
    /// Replace the current history entry instead of pushing.
    pub replace: bool,
}

impl Redirect {
    pub fn replace<S: Into<String>>(to: S) -> Self { Redirect { to: to.into(), replace: true } }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(Redirect),
}

impl GuardDecision {
    pub fn is_render(&self) -> bool { matches!(self, GuardDecision::Render) }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardDecision::Redirect(r) => Some(r.to.as_str()),
            GuardDecision::Render => None,
        }
    }
}

impl Guard {
    pub fn permission_id(id: u32) -> Self { Guard::Permission(PermissionRequirement::by_id(id)) }

    pub fn permission_name<S: Into<String>>(name: S) -> Self { Guard::Permission(PermissionRequirement::by_name(name)) }

    pub fn state(&self, session: Option<&Session>) -> GuardState {
        let Some(s) = session.filter(|s| s.is_authenticated()) else {
            return GuardState::Unauthenticated;
        };
        match self {
            Guard::PublicOnly | Guard::Authenticated => GuardState::AuthenticatedAuthorized,
            Guard::Permission(req) => {
                if req.is_satisfied_by(&PermissionEvaluator::new(Some(&s.principal))) {
                    GuardState::AuthenticatedAuthorized
                } else {
                    GuardState::AuthenticatedUnauthorized
                }
            }
        }
    }

    pub fn decide(&self, session: Option<&Session>) -> GuardDecision {
        let state = self.state(session);
        let decision = match (self, state) {
            (Guard::PublicOnly, GuardState::Unauthenticated) => GuardDecision::Render,
            (Guard::PublicOnly, _) => GuardDecision::Redirect(Redirect::replace(DASHBOARD_PATH)),
            (_, GuardState::Unauthenticated) => GuardDecision::Redirect(Redirect::replace(LOGIN_PATH)),
            (_, GuardState::AuthenticatedUnauthorized) => GuardDecision::Redirect(Redirect::replace(FORBIDDEN_PATH)),
            (_, GuardState::AuthenticatedAuthorized) => GuardDecision::Render,
        };
        if let GuardDecision::Redirect(r) = &decision {
            debug!(target: "guard", "{:?} in state {:?} -> {}", self, state, r.to);
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Grant, PermissionSet, Principal};

    fn session(grants: Vec<Grant>) -> Session {
        Session {
            token: "tok".into(),
            principal: Principal {
                id: 3,
                first_name: "Eva".into(),
                last_name: "Ruiz".into(),
                email: "eva@mp.gob.gt".into(),
                dpi: None,
                phone: None,
                active: None,
                role: None,
                permissions: PermissionSet::new(grants),
            },
        }
    }

    #[test]
    fn public_only() {
        assert_eq!(Guard::PublicOnly.decide(None), GuardDecision::Render);
        let s = session(vec![]);
        assert_eq!(Guard::PublicOnly.decide(Some(&s)).redirect_target(), Some(DASHBOARD_PATH));
    }

    #[test]
    fn authenticated_only() {
        assert_eq!(Guard::Authenticated.decide(None).redirect_target(), Some(LOGIN_PATH));
        assert!(Guard::Authenticated.decide(Some(&session(vec![]))).is_render());
    }

    #[test]
    fn permission_by_id() {
        let g = Guard::permission_id(1);
        assert_eq!(g.decide(None).redirect_target(), Some(LOGIN_PATH));
        assert_eq!(g.decide(Some(&session(vec![Grant::with_id(2, "ver")]))).redirect_target(), Some(FORBIDDEN_PATH));
        assert!(g.decide(Some(&session(vec![Grant::with_id(1, "crear")]))).is_render());
    }

    #[test]
    fn id_wins_over_name() {
        // name matches, id does not: id decides
        let g = Guard::Permission(PermissionRequirement::by_id(11).with_name("gestionar_sistema"));
        let s = session(vec![Grant::named("gestionar_sistema")]);
        assert_eq!(g.decide(Some(&s)).redirect_target(), Some(FORBIDDEN_PATH));
        let s = session(vec![Grant::with_id(11, "otro_nombre")]);
        assert!(g.decide(Some(&s)).is_render());
    }

    #[test]
    fn name_only_requirement() {
        let g = Guard::permission_name("gestionar_sistema");
        assert!(g.decide(Some(&session(vec![Grant::named("gestionar_sistema")]))).is_render());
        assert_eq!(g.decide(Some(&session(vec![]))).redirect_target(), Some(FORBIDDEN_PATH));
    }

    #[test]
    fn unconstrained_requirement_degrades_to_authenticated() {
        let g = Guard::Permission(PermissionRequirement::none());
        for s in [session(vec![]), session(vec![Grant::with_id(4, "x")])] {
            assert_eq!(g.decide(Some(&s)), Guard::Authenticated.decide(Some(&s)));
        }
        assert_eq!(g.decide(None), Guard::Authenticated.decide(None));
    }

    #[test]
    fn redirects_replace_history() {
        match Guard::Authenticated.decide(None) {
            GuardDecision::Redirect(r) => assert!(r.replace),
            GuardDecision::Render => panic!("expected redirect"),
        }
    }
}
