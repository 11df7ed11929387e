// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Permission resolution
//!
//! Given a credential token (or its absence), produce the per-call
//! [`PermissionTable`]: a mapping from method identifier to the set of
//! subjects authorized to invoke it.  Grants are merged from five
//! independently-sourced origins -- explicit per-subject grants, tenant-role
//! grants, project-role grants, administrative-role overrides, and the
//! public/self visibility classes -- under the precedence and short-circuit
//! rules documented on [`PermissionResolver::resolve`].
//!
//! The table is built fresh, locally, on every call and discarded
//! afterwards.  Nothing here caches or shares resolution results: a
//! permission change upstream is visible on the very next check.

use crate::authn;
use crate::authz::authority::AuthorityProvider;
use crate::authz::authority::LiveAuthority;
use crate::authz::authority::MembershipResolver;
use crate::authz::authority::StaticAuthority;
use crate::authz::catalog::ServicePermissions;
use anvil_common::api::external::Error;
use anvil_types::external_api::shared::AdminRole;
use anvil_types::external_api::shared::InfraRole;
use anvil_types::external_api::shared::ProjectRole;
use anvil_types::external_api::shared::Subject;
use anvil_types::external_api::shared::TenantRole;
use anvil_types::external_api::shared::TokenType;
use slog::trace;
use slog::Logger;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// The subjects authorized to invoke one method
///
/// `Any` is absorbing in both directions: adding a concrete id to `Any`
/// changes nothing, and widening a concrete set to `Any` discards the ids.
/// That makes merging grants idempotent and order-insensitive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubjectSet {
    /// Any subject satisfies the grant, including one never seen before.
    Any,
    /// Exactly these project/tenant ids.
    Ids(BTreeSet<String>),
}

impl SubjectSet {
    /// Returns whether a request scoped to `subject` (or to no subject at
    /// all) is satisfied by this set
    pub fn allows(&self, subject: Option<&str>) -> bool {
        match self {
            SubjectSet::Any => true,
            SubjectSet::Ids(ids) => {
                subject.is_some_and(|subject| ids.contains(subject))
            }
        }
    }

    fn insert(&mut self, subject: Subject) {
        match subject {
            Subject::Any => *self = SubjectSet::Any,
            Subject::Id(id) => {
                if let SubjectSet::Ids(ids) = self {
                    ids.insert(id);
                }
            }
        }
    }
}

/// The per-call resolved mapping from method to authorized subjects
///
/// Built fresh per authorization call; never persisted and never shared
/// across calls.  A small BTree-backed structure accumulated by the
/// resolver and then consulted once for the decision.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PermissionTable {
    methods: BTreeMap<String, SubjectSet>,
}

impl PermissionTable {
    pub fn new() -> PermissionTable {
        PermissionTable::default()
    }

    /// Adds `subject` to the set of subjects allowed to invoke `method`
    ///
    /// Merges into any existing grant for `method`; never overwrites.
    pub fn grant(&mut self, method: &str, subject: Subject) {
        self.methods
            .entry(method.to_string())
            .or_insert_with(|| SubjectSet::Ids(BTreeSet::new()))
            .insert(subject);
    }

    /// Grants `method` to any subject
    pub fn grant_any(&mut self, method: &str) {
        self.grant(method, Subject::Any);
    }

    /// Returns the subjects allowed to invoke `method`, if any grant exists
    pub fn lookup(&self, method: &str) -> Option<&SubjectSet> {
        self.methods.get(method)
    }

    /// Merges every grant of `other` into this table
    pub fn absorb(&mut self, other: PermissionTable) {
        for (method, subjects) in other.methods {
            match subjects {
                SubjectSet::Any => self.grant_any(&method),
                SubjectSet::Ids(ids) => {
                    for id in ids {
                        self.grant(&method, Subject::Id(id));
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Builds a [`PermissionTable`] from a credential token
///
/// Holds no per-request state; one resolver serves arbitrarily many
/// concurrent checks.
pub struct PermissionResolver {
    log: Logger,
    catalog: Arc<ServicePermissions>,
    static_authority: StaticAuthority,
    live_authority: LiveAuthority,
}

impl PermissionResolver {
    pub fn new(
        log: Logger,
        catalog: Arc<ServicePermissions>,
        membership: Arc<dyn MembershipResolver>,
    ) -> PermissionResolver {
        PermissionResolver {
            log,
            catalog,
            static_authority: StaticAuthority,
            live_authority: LiveAuthority::new(membership),
        }
    }

    /// Resolves the permission table for the caller described by `authn`
    ///
    /// The accumulation order is load-bearing:
    ///
    /// 1. An anonymous caller gets exactly the public methods, wildcard
    ///    subject.
    /// 2. A token's authority comes from its trust model: API tokens are
    ///    read as stored, user tokens from the live membership view (see
    ///    [`crate::authz::authority`]).
    /// 3. An admin editor gets every method for any subject and resolution
    ///    stops there: nothing else on the token can reduce that authority.
    ///    An admin viewer gets the viewer-level baseline for any subject
    ///    but resolution continues, because the token may carry stronger
    ///    per-subject grants (e.g. owner of one specific project).
    /// 4. Explicit grants, tenant-role grants and project-role grants merge
    ///    in, subject by subject.
    /// 5. User tokens additionally get the public and self methods for any
    ///    subject.  API tokens do not: a machine credential must explicitly
    ///    carry whatever access it needs.
    ///
    /// Tenant-role grants are not expanded into the projects owned by that
    /// tenant here.  That inheritance is the membership resolver's job and
    /// is therefore only ever reflected for user tokens.
    pub async fn resolve(
        &self,
        authn: &authn::Context,
    ) -> Result<PermissionTable, Error> {
        let Some(token) = authn.token() else {
            let mut table = PermissionTable::new();
            for method in self.catalog.public_methods() {
                table.grant_any(method);
            }
            trace!(self.log, "resolved permissions for anonymous caller";
                "methods" => table.len(),
            );
            return Ok(table);
        };

        trace!(self.log, "resolving permissions";
            "token_type" => ?token.token_type,
            "user" => &token.user,
        );

        let authority = match token.token_type {
            TokenType::Api => self.static_authority.authority(token).await?,
            TokenType::User => self.live_authority.authority(token).await?,
        };

        let mut table = PermissionTable::new();

        match authority.admin_role {
            Some(AdminRole::Editor) => {
                for method in self.catalog.all_methods() {
                    table.grant_any(method);
                }
                trace!(self.log, "resolved permissions for admin editor";
                    "methods" => table.len(),
                );
                return Ok(table);
            }
            Some(AdminRole::Viewer) => {
                let baseline = self
                    .catalog
                    .methods_for_tenant_role(TenantRole::Viewer)
                    .chain(
                        self.catalog
                            .methods_for_project_role(ProjectRole::Viewer),
                    )
                    .chain(
                        self.catalog.methods_for_admin_role(AdminRole::Viewer),
                    )
                    .chain(
                        self.catalog.methods_for_infra_role(InfraRole::Viewer),
                    )
                    .chain(self.catalog.public_methods())
                    .chain(self.catalog.self_methods());
                for method in baseline {
                    table.grant_any(method);
                }
            }
            None => {}
        }

        for grant in &authority.permissions {
            for method in &grant.methods {
                table.grant(method, grant.subject.clone());
            }
        }

        for (tenant_id, role) in &authority.tenant_roles {
            for method in self.catalog.methods_for_tenant_role(*role) {
                table.grant(method, Subject::Id(tenant_id.clone()));
            }
        }

        for (project_id, role) in &authority.project_roles {
            for method in self.catalog.methods_for_project_role(*role) {
                table.grant(method, Subject::Id(project_id.clone()));
            }
        }

        if token.is_user() {
            for method in self
                .catalog
                .public_methods()
                .chain(self.catalog.self_methods())
            {
                table.grant_any(method);
            }
        }

        trace!(self.log, "resolved permissions";
            "user" => &token.user,
            "methods" => table.len(),
        );
        Ok(table)
    }
}
