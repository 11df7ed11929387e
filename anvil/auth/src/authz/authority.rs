// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Where a token's authority comes from
//!
//! The two token trust models differ in exactly one place: whose word we
//! take for the roles and permissions the caller holds.
//!
//! - API tokens are long-lived machine credentials.  Their authority is
//!   baked in at issuance time and used exactly as stored, even if stale
//!   relative to current membership.  That staleness is an accepted
//!   trade-off for credentials that must keep working unattended.
//! - User tokens are short-lived interactive credentials.  Their authority
//!   is never trusted from the token itself: it is recomputed from live
//!   membership data on every call, so that permission changes and
//!   revocations take effect immediately without reissuing tokens.
//!
//! Each model is an [`AuthorityProvider`] implementation, selected by token
//! type, so the two can be tested in isolation.  Both produce a fresh
//! [`TokenAuthority`] view; the caller-supplied token is never written to,
//! which keeps the original available for logging and audit and rules out
//! aliasing between concurrent checks that share a token value.

use anvil_common::api::external::Error;
use anvil_types::external_api::shared::AdminRole;
use anvil_types::external_api::shared::EffectiveRoles;
use anvil_types::external_api::shared::InfraRole;
use anvil_types::external_api::shared::MethodPermission;
use anvil_types::external_api::shared::ProjectRole;
use anvil_types::external_api::shared::TenantRole;
use anvil_types::external_api::shared::Token;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Computes the live membership view for a user
///
/// Implementations consult membership records (a network or database round
/// trip) and expand transitive inheritance, e.g. tenant ownership conferring
/// project roles.  The returned view is owned by the caller for the duration
/// of one authorization call and never cached by the engine.
///
/// The future returned here must propagate the caller's cancellation: if
/// the authorization check is dropped while this call is outstanding, the
/// call is abandoned with it.  There is no retry logic in the engine; a
/// failure here fails the check outright.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    async fn effective_roles(&self, user: &str)
        -> Result<EffectiveRoles, Error>;
}

/// A token's resolved authority, as consumed by permission resolution
///
/// A fresh view produced per call by an [`AuthorityProvider`]; see the
/// module documentation for why this is a copy rather than the token.
#[derive(Clone, Debug)]
pub struct TokenAuthority {
    pub admin_role: Option<AdminRole>,
    pub infra_role: Option<InfraRole>,
    pub tenant_roles: BTreeMap<String, TenantRole>,
    pub project_roles: BTreeMap<String, ProjectRole>,
    pub permissions: Vec<MethodPermission>,
}

/// Produces the [`TokenAuthority`] for a token under one trust model
#[async_trait]
pub trait AuthorityProvider: Send + Sync {
    async fn authority(&self, token: &Token) -> Result<TokenAuthority, Error>;
}

/// Authority for API tokens: exactly what is stored on the token
#[derive(Debug)]
pub struct StaticAuthority;

#[async_trait]
impl AuthorityProvider for StaticAuthority {
    async fn authority(&self, token: &Token) -> Result<TokenAuthority, Error> {
        Ok(TokenAuthority {
            admin_role: token.admin_role,
            infra_role: token.infra_role,
            tenant_roles: token.tenant_roles.clone(),
            project_roles: token.project_roles.clone(),
            permissions: token.permissions.clone(),
        })
    }
}

/// Authority for user tokens: the live membership view, nothing else
///
/// Any admin role or explicit permissions stored on the token are dropped;
/// only the membership resolver's answer counts.
pub struct LiveAuthority {
    membership: Arc<dyn MembershipResolver>,
}

impl LiveAuthority {
    pub fn new(membership: Arc<dyn MembershipResolver>) -> LiveAuthority {
        LiveAuthority { membership }
    }
}

#[async_trait]
impl AuthorityProvider for LiveAuthority {
    async fn authority(&self, token: &Token) -> Result<TokenAuthority, Error> {
        // The check cannot proceed without this data: any failure here is
        // terminal for the current request.
        let view = self
            .membership
            .effective_roles(&token.user)
            .await
            .map_err(|error| {
                Error::internal_error(&format!(
                    "resolving effective roles for user {:?}: {}",
                    token.user, error
                ))
            })?;

        Ok(TokenAuthority {
            admin_role: None,
            infra_role: token.infra_role,
            tenant_roles: view.tenant_roles,
            project_roles: view.project_roles,
            permissions: Vec::new(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::AuthorityProvider;
    use super::LiveAuthority;
    use super::MembershipResolver;
    use super::StaticAuthority;
    use anvil_common::api::external::Error;
    use anvil_types::external_api::shared::AdminRole;
    use anvil_types::external_api::shared::EffectiveRoles;
    use anvil_types::external_api::shared::ProjectRole;
    use anvil_types::external_api::shared::TenantRole;
    use anvil_types::external_api::shared::Token;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedMembership(EffectiveRoles);

    #[async_trait]
    impl MembershipResolver for FixedMembership {
        async fn effective_roles(
            &self,
            _user: &str,
        ) -> Result<EffectiveRoles, Error> {
            Ok(self.0.clone())
        }
    }

    struct FailingMembership;

    #[async_trait]
    impl MembershipResolver for FailingMembership {
        async fn effective_roles(
            &self,
            _user: &str,
        ) -> Result<EffectiveRoles, Error> {
            Err(Error::unavail("membership store has no quorum"))
        }
    }

    fn stuffed_user_token() -> Token {
        serde_json::from_value(serde_json::json!({
            "user": "eve",
            "token_type": "user",
            "admin_role": "editor",
            "tenant_roles": { "t-baked": "owner" },
            "project_roles": { "p-baked": "owner" },
            "permissions": [
                { "subject": "*", "methods": ["MachineService/Delete"] }
            ],
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_static_authority_reads_token_as_is() {
        let authority =
            StaticAuthority.authority(&stuffed_user_token()).await.unwrap();
        assert_eq!(authority.admin_role, Some(AdminRole::Editor));
        assert_eq!(authority.tenant_roles["t-baked"], TenantRole::Owner);
        assert_eq!(authority.permissions.len(), 1);
    }

    #[tokio::test]
    async fn test_live_authority_ignores_baked_in_fields() {
        let mut view = EffectiveRoles::default();
        view.project_roles
            .insert(String::from("p-live"), ProjectRole::Viewer);
        let provider = LiveAuthority::new(Arc::new(FixedMembership(view)));

        let token = stuffed_user_token();
        let authority = provider.authority(&token).await.unwrap();
        assert_eq!(authority.admin_role, None);
        assert!(authority.permissions.is_empty());
        assert!(authority.tenant_roles.is_empty());
        assert_eq!(authority.project_roles["p-live"], ProjectRole::Viewer);
        // The caller-supplied token itself is untouched.
        assert_eq!(token.admin_role, Some(AdminRole::Editor));
    }

    #[tokio::test]
    async fn test_live_authority_failure_is_internal() {
        let provider = LiveAuthority::new(Arc::new(FailingMembership));
        let error = provider
            .authority(&stuffed_user_token())
            .await
            .unwrap_err();
        assert_matches!(error, Error::InternalError { .. });
    }
}
