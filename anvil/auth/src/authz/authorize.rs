// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The authorization decision
//!
//! [`Authorizer::authorize`] is the entry point the transport layer calls
//! once per inbound request, after authentication and before dispatch.  It
//! determines the method and the scoped subject the request targets, asks
//! the [`PermissionResolver`] for the caller's permission table, and renders
//! an allow/deny decision.  Each call is independent and stateless; there
//! is no decision state machine beyond this linear sequence.

use crate::authn;
use crate::authz::authority::MembershipResolver;
use crate::authz::catalog::MethodScope;
use crate::authz::catalog::ServicePermissions;
use crate::authz::resolver::PermissionResolver;
use crate::authz::resolver::SubjectSet;
use anvil_common::api::external::Error;
use slog::debug;
use slog::trace;
use slog::Logger;
use std::sync::Arc;

/// Access to the already-deserialized request envelope
///
/// The transport layer owns request payloads; the authorizer only ever
/// needs the method identifier and, for scoped methods, the project or
/// tenant id the payload carries.  Implementations pull the id out of
/// whatever payload shape the method uses.
pub trait RequestEnvelope {
    /// The RPC method identifier of the request, e.g. `IPService/Get`.
    fn method(&self) -> &str;

    /// The project id carried in the payload, if any.
    fn project(&self) -> Option<&str>;

    /// The tenant id carried in the payload, if any.
    fn tenant(&self) -> Option<&str>;
}

/// Renders allow/deny decisions for inbound requests
pub struct Authorizer {
    log: Logger,
    catalog: Arc<ServicePermissions>,
    resolver: PermissionResolver,
}

impl Authorizer {
    pub fn new(
        log: Logger,
        catalog: Arc<ServicePermissions>,
        membership: Arc<dyn MembershipResolver>,
    ) -> Authorizer {
        let resolver = PermissionResolver::new(
            log.clone(),
            Arc::clone(&catalog),
            membership,
        );
        Authorizer { log, catalog, resolver }
    }

    /// Decides whether the caller described by `authn` may perform `request`
    ///
    /// Returns `Ok(())` when allowed.  Failure modes:
    ///
    /// - `InvalidRequest` when a project- or tenant-scoped request does not
    ///   carry the subject id it must carry.  This is checked before any
    ///   permission resolution happens.
    /// - `InternalError` when the permission table cannot be resolved.
    /// - `Forbidden` when the method is absent from the caller's table, or
    ///   present but the request's subject is not among the allowed
    ///   subjects.  The message names the method and, in the latter case,
    ///   the sorted subjects that would have been accepted -- all derivable
    ///   from the caller's own token, so nothing unrelated leaks.
    pub async fn authorize(
        &self,
        authn: &authn::Context,
        request: &dyn RequestEnvelope,
    ) -> Result<(), Error> {
        let method = request.method();
        let subject = match self.catalog.scope_of(method) {
            MethodScope::Project => Some(request.project().ok_or_else(
                || {
                    Error::invalid_request(
                        "no project found in project-scoped request",
                    )
                },
            )?),
            MethodScope::Tenant => {
                Some(request.tenant().ok_or_else(|| {
                    Error::invalid_request(
                        "no tenant found in tenant-scoped request",
                    )
                })?)
            }
            MethodScope::Global => None,
        };

        trace!(self.log, "authorize begin";
            "method" => method,
            "subject" => subject.unwrap_or(""),
        );

        let table = self.resolver.resolve(authn).await?;

        let Some(subjects) = table.lookup(method) else {
            debug!(self.log, "authorize result";
                "method" => method,
                "result" => "denied",
                "reason" => "method not granted",
            );
            return Err(Error::forbidden(&format!(
                "method {:?} is not part of the token's permissions",
                method
            )));
        };

        match subjects {
            SubjectSet::Any => {
                debug!(self.log, "authorize result";
                    "method" => method,
                    "result" => "allowed",
                );
                Ok(())
            }
            SubjectSet::Ids(ids)
                if subject.is_some_and(|subject| ids.contains(subject)) =>
            {
                debug!(self.log, "authorize result";
                    "method" => method,
                    "subject" => subject.unwrap_or(""),
                    "result" => "allowed",
                );
                Ok(())
            }
            SubjectSet::Ids(ids) => {
                debug!(self.log, "authorize result";
                    "method" => method,
                    "subject" => subject.unwrap_or(""),
                    "result" => "denied",
                    "reason" => "subject not granted",
                );
                // BTreeSet iteration yields the allowed subjects sorted.
                let allowed: Vec<&str> =
                    ids.iter().map(String::as_str).collect();
                Err(Error::forbidden(&format!(
                    "subject {:?} is not allowed to invoke method {:?} \
                     (allowed subjects: {:?})",
                    subject.unwrap_or(""),
                    method,
                    allowed
                )))
            }
        }
    }
}
