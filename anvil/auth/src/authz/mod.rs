// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Authorization subsystem
//!
//! ## Authorization basics
//!
//! For every inbound call, the server must decide from the caller's
//! credential token whether the requested *method* may be invoked against
//! the *subject* (a project or a tenant) the request targets.  Grants come
//! from five independently-sourced origins:
//!
//! - **explicit per-subject grants** carried on the token (`permissions`),
//! - **tenant-role grants**: a role held on a tenant maps to a method set,
//! - **project-role grants**: likewise for projects,
//! - **administrative-role overrides**: global editor/viewer roles that
//!   cut across subjects,
//! - **method visibility classes**: public methods (anyone, even
//!   anonymous) and self-service methods (any authenticated user).
//!
//! The mapping from role or visibility class to method set is static data,
//! owned by the [`catalog`] and assembled once at process startup -- the
//! engine never hard-codes per-method branches.
//!
//! ## Two trust models
//!
//! The same request can arrive under two kinds of token, and they are
//! trusted very differently:
//!
//! - An **API token** is a long-lived machine credential.  Whatever roles
//!   and permissions were baked into it at issuance are exactly what it
//!   has, even if membership has since changed.
//! - A **user token** is a short-lived interactive credential.  Nothing
//!   baked into it counts; its authority is recomputed from the live
//!   membership records on every single call, so revocations take effect
//!   immediately.
//!
//! The [`authority`] module expresses this split as a strategy seam.
//!
//! ## Authorization control flow
//!
//! Suppose we receive a request from a CI token to acquire an IP in project
//! "monster-foodies".  The transport layer authenticates the token and
//! hands us the request envelope.  Then:
//!
//! 1. The [`Authorizer`] classifies the method.  `IPService/Acquire` is
//!    project-scoped, so the project id is pulled from the payload; a
//!    payload without one is rejected outright.
//! 2. The [`PermissionResolver`] builds the caller's [`PermissionTable`]:
//!    every method the token can invoke, each mapped to the subjects it may
//!    be invoked against (or to "any subject").  For a user token this is
//!    where the membership round trip happens.
//! 3. The authorizer looks up the method in the table and checks the
//!    subject.  A wildcard entry admits any subject; otherwise the
//!    project id must be among the granted subjects.
//!
//! The table lives for exactly one check.  Nothing is cached across calls,
//! no locks are taken, and concurrent checks share only the read-only
//! catalog.

mod authority;
mod authorize;
mod catalog;
mod resolver;

pub use authority::AuthorityProvider;
pub use authority::LiveAuthority;
pub use authority::MembershipResolver;
pub use authority::StaticAuthority;
pub use authority::TokenAuthority;
pub use authorize::Authorizer;
pub use authorize::RequestEnvelope;
pub use catalog::MethodScope;
pub use catalog::ServicePermissions;
pub use catalog::ServicePermissionsBuilder;
pub use resolver::PermissionResolver;
pub use resolver::PermissionTable;
pub use resolver::SubjectSet;
