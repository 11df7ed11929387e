// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The service permission catalog
//!
//! A static classification of every method the server exposes into
//! visibility and role buckets: public methods, self-service methods, and
//! the per-role method tables for tenant, project, admin and infra roles.
//! The mapping from role to method set is data, not code -- adding a method
//! or a role is a catalog update, never an engine change.
//!
//! The catalog is assembled once at startup from the full set of exposed
//! methods and their declared visibility/role requirements, then shared
//! read-only for the life of the process.  It is never mutated at request
//! time, which is what makes unsynchronized concurrent reads by arbitrarily
//! many authorization checks safe.

use anvil_common::api::external::Error;
use anvil_common::bail_unless;
use anvil_types::external_api::shared::AdminRole;
use anvil_types::external_api::shared::InfraRole;
use anvil_types::external_api::shared::ProjectRole;
use anvil_types::external_api::shared::TenantRole;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// How a method keys on a scoped resource, for subject extraction
///
/// Methods that are public, self-service, or admin/infra-only do not key on
/// a concrete subject at all.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MethodScope {
    /// The request payload must carry a project id.
    Project,
    /// The request payload must carry a tenant id.
    Tenant,
    /// The method does not key on a concrete subject.
    Global,
}

/// The static classification of every exposed method
///
/// See the module documentation.  Instances are built with
/// [`ServicePermissionsBuilder`] and are immutable afterwards.
#[derive(Debug)]
pub struct ServicePermissions {
    public_methods: BTreeSet<String>,
    self_methods: BTreeSet<String>,
    all_methods: BTreeSet<String>,
    tenant_role_methods: BTreeMap<TenantRole, BTreeSet<String>>,
    project_role_methods: BTreeMap<ProjectRole, BTreeSet<String>>,
    admin_role_methods: BTreeMap<AdminRole, BTreeSet<String>>,
    infra_role_methods: BTreeMap<InfraRole, BTreeSet<String>>,
    // Derived at build time from the role tables above.
    project_scoped_methods: BTreeSet<String>,
    tenant_scoped_methods: BTreeSet<String>,
}

impl ServicePermissions {
    /// Methods invocable by anyone, including anonymous callers
    pub fn public_methods(&self) -> impl Iterator<Item = &String> {
        self.public_methods.iter()
    }

    /// Methods invocable by any authenticated interactive user
    pub fn self_methods(&self) -> impl Iterator<Item = &String> {
        self.self_methods.iter()
    }

    /// Every method the server exposes
    pub fn all_methods(&self) -> impl Iterator<Item = &String> {
        self.all_methods.iter()
    }

    /// Methods granted by holding `role` on a tenant
    pub fn methods_for_tenant_role(
        &self,
        role: TenantRole,
    ) -> impl Iterator<Item = &String> {
        self.tenant_role_methods.get(&role).into_iter().flatten()
    }

    /// Methods granted by holding `role` on a project
    pub fn methods_for_project_role(
        &self,
        role: ProjectRole,
    ) -> impl Iterator<Item = &String> {
        self.project_role_methods.get(&role).into_iter().flatten()
    }

    /// Methods granted by holding the global admin `role`
    pub fn methods_for_admin_role(
        &self,
        role: AdminRole,
    ) -> impl Iterator<Item = &String> {
        self.admin_role_methods.get(&role).into_iter().flatten()
    }

    /// Methods granted by holding the infra `role`
    pub fn methods_for_infra_role(
        &self,
        role: InfraRole,
    ) -> impl Iterator<Item = &String> {
        self.infra_role_methods.get(&role).into_iter().flatten()
    }

    /// Returns how `method` keys on a scoped resource
    ///
    /// Unknown methods are `Global`: they carry no subject to extract, and
    /// the permission table lookup will deny them anyway.
    pub fn scope_of(&self, method: &str) -> MethodScope {
        if self.project_scoped_methods.contains(method) {
            MethodScope::Project
        } else if self.tenant_scoped_methods.contains(method) {
            MethodScope::Tenant
        } else {
            MethodScope::Global
        }
    }
}

/// Assembles a [`ServicePermissions`] catalog at startup
///
/// Every registration also records the method into the all-methods set, so
/// the "every exposed method appears in `all_methods`" invariant holds by
/// construction.  [`ServicePermissionsBuilder::build`] verifies the
/// cross-bucket invariants that registration alone cannot guarantee.
#[derive(Debug, Default)]
pub struct ServicePermissionsBuilder {
    public_methods: BTreeSet<String>,
    self_methods: BTreeSet<String>,
    all_methods: BTreeSet<String>,
    tenant_role_methods: BTreeMap<TenantRole, BTreeSet<String>>,
    project_role_methods: BTreeMap<ProjectRole, BTreeSet<String>>,
    admin_role_methods: BTreeMap<AdminRole, BTreeSet<String>>,
    infra_role_methods: BTreeMap<InfraRole, BTreeSet<String>>,
}

impl ServicePermissionsBuilder {
    pub fn new() -> ServicePermissionsBuilder {
        ServicePermissionsBuilder::default()
    }

    /// Registers a method with no visibility or role bucket
    ///
    /// Such methods are reachable only through an explicit token permission
    /// or an admin-editor override.
    pub fn method(mut self, method: &str) -> Self {
        self.all_methods.insert(method.to_string());
        self
    }

    /// Registers a public method
    pub fn public_method(mut self, method: &str) -> Self {
        self.public_methods.insert(method.to_string());
        self.all_methods.insert(method.to_string());
        self
    }

    /// Registers a self-service method
    pub fn self_method(mut self, method: &str) -> Self {
        self.self_methods.insert(method.to_string());
        self.all_methods.insert(method.to_string());
        self
    }

    /// Registers a tenant-scoped method granted by `role`
    pub fn tenant_role_method(
        mut self,
        role: TenantRole,
        method: &str,
    ) -> Self {
        self.tenant_role_methods
            .entry(role)
            .or_default()
            .insert(method.to_string());
        self.all_methods.insert(method.to_string());
        self
    }

    /// Registers a project-scoped method granted by `role`
    pub fn project_role_method(
        mut self,
        role: ProjectRole,
        method: &str,
    ) -> Self {
        self.project_role_methods
            .entry(role)
            .or_default()
            .insert(method.to_string());
        self.all_methods.insert(method.to_string());
        self
    }

    /// Registers an admin-only method granted by `role`
    pub fn admin_role_method(mut self, role: AdminRole, method: &str) -> Self {
        self.admin_role_methods
            .entry(role)
            .or_default()
            .insert(method.to_string());
        self.all_methods.insert(method.to_string());
        self
    }

    /// Registers an infra-only method granted by `role`
    pub fn infra_role_method(mut self, role: InfraRole, method: &str) -> Self {
        self.infra_role_methods
            .entry(role)
            .or_default()
            .insert(method.to_string());
        self.all_methods.insert(method.to_string());
        self
    }

    /// Validates the cross-bucket invariants and produces the catalog
    ///
    /// A method belongs to at most one of public, self, tenant-scoped,
    /// project-scoped, admin-only, or infra-only as far as subject
    /// extraction is concerned.  A violation is a startup-time
    /// misconfiguration and fails the build step rather than serving.
    pub fn build(self) -> Result<ServicePermissions, Error> {
        let tenant_scoped_methods: BTreeSet<String> =
            self.tenant_role_methods.values().flatten().cloned().collect();
        let project_scoped_methods: BTreeSet<String> =
            self.project_role_methods.values().flatten().cloned().collect();
        let admin_only_methods: BTreeSet<String> =
            self.admin_role_methods.values().flatten().cloned().collect();
        let infra_only_methods: BTreeSet<String> =
            self.infra_role_methods.values().flatten().cloned().collect();

        let buckets: [(&str, &BTreeSet<String>); 6] = [
            ("public", &self.public_methods),
            ("self", &self.self_methods),
            ("tenant-scoped", &tenant_scoped_methods),
            ("project-scoped", &project_scoped_methods),
            ("admin-only", &admin_only_methods),
            ("infra-only", &infra_only_methods),
        ];
        for (i, (label_a, bucket_a)) in buckets.iter().enumerate() {
            for (label_b, bucket_b) in buckets.iter().skip(i + 1) {
                let overlap = bucket_a.intersection(bucket_b).next();
                bail_unless!(
                    overlap.is_none(),
                    "method {:?} is classified both {} and {}",
                    overlap.unwrap_or(&String::new()),
                    label_a,
                    label_b
                );
            }
        }

        Ok(ServicePermissions {
            public_methods: self.public_methods,
            self_methods: self.self_methods,
            all_methods: self.all_methods,
            tenant_role_methods: self.tenant_role_methods,
            project_role_methods: self.project_role_methods,
            admin_role_methods: self.admin_role_methods,
            infra_role_methods: self.infra_role_methods,
            project_scoped_methods,
            tenant_scoped_methods,
        })
    }
}
