// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Types shared between the authorization subsystem and API clients
//!
//! The central type here is the credential [`Token`]: the caller's authority
//! as presented with a request.  Tokens are constructed by the upstream
//! authentication layer, read-only within the server, and discarded after
//! the call.

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FormatResult;

/// Roles a subject can hold on a tenant
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    JsonSchema,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TenantRole {
    Owner,
    Editor,
    Viewer,
    Guest,
}

/// Roles a subject can hold on a project
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    JsonSchema,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectRole {
    Owner,
    Editor,
    Viewer,
}

/// Global administrative override roles, distinct from per-tenant and
/// per-project roles
///
/// This is a closed set: a token carrying any other wire value is rejected
/// at deserialization, before it ever reaches the authorization engine.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    JsonSchema,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdminRole {
    Editor,
    Viewer,
}

/// Infrastructure operator roles
///
/// Note that the engine currently consumes these only through the
/// admin-viewer baseline; whether a token may carry both an admin role and
/// an infra role at once is intentionally left unspecified.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    JsonSchema,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InfraRole {
    Editor,
    Viewer,
}

/// Distinguishes the two token trust models
///
/// API tokens are long-lived machine credentials whose authority is baked in
/// at issuance time.  User tokens are short-lived interactive credentials
/// whose authority is recomputed from live membership data on every call.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    PartialEq,
    Serialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Api,
    User,
}

/// The subject of a permission grant: a concrete scoped resource id, or any
/// subject at all
///
/// On the wire, "any subject" is the literal `"*"`.  Modeling it as a
/// variant rather than a sentinel string means a real subject id can never
/// collide with the wildcard.
#[derive(Clone, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Subject {
    /// Any subject satisfies the grant.
    Any,
    /// One concrete project or tenant id.
    Id(String),
}

/// Wire form of [`Subject::Any`]
const SUBJECT_WILDCARD: &str = "*";

impl From<String> for Subject {
    fn from(value: String) -> Self {
        if value == SUBJECT_WILDCARD {
            Subject::Any
        } else {
            Subject::Id(value)
        }
    }
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Any => SUBJECT_WILDCARD.to_owned(),
            Subject::Id(id) => id,
        }
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        match self {
            Subject::Any => f.write_str(SUBJECT_WILDCARD),
            Subject::Id(id) => f.write_str(id),
        }
    }
}

impl JsonSchema for Subject {
    fn schema_name() -> String {
        "Subject".to_string()
    }

    fn json_schema(
        generator: &mut schemars::gen::SchemaGenerator,
    ) -> schemars::schema::Schema {
        String::json_schema(generator)
    }
}

/// An explicit method grant carried on a token, independent of the role
/// systems
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, JsonSchema)]
pub struct MethodPermission {
    /// The scoped resource the grant applies to.
    pub subject: Subject,
    /// Fully-qualified method identifiers, e.g. `IPService/Get`.
    pub methods: BTreeSet<String>,
}

/// A caller's credential as presented with a request
///
/// The `user` identifier is opaque and may be empty.  Role maps are keyed by
/// tenant or project id.  Absence of a token entirely (an anonymous caller)
/// is represented by `Option<Token>` at the call boundary, not by a
/// sentinel value here.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
pub struct Token {
    #[serde(default)]
    pub user: String,
    pub token_type: TokenType,
    #[serde(default)]
    pub admin_role: Option<AdminRole>,
    #[serde(default)]
    pub infra_role: Option<InfraRole>,
    #[serde(default)]
    pub tenant_roles: BTreeMap<String, TenantRole>,
    #[serde(default)]
    pub project_roles: BTreeMap<String, ProjectRole>,
    #[serde(default)]
    pub permissions: Vec<MethodPermission>,
}

impl Token {
    pub fn is_api(&self) -> bool {
        self.token_type == TokenType::Api
    }

    pub fn is_user(&self) -> bool {
        self.token_type == TokenType::User
    }

    /// Returns whether the token carries a global administrative role.
    pub fn is_admin(&self) -> bool {
        self.admin_role.is_some()
    }
}

/// The resolved, inheritance-expanded membership view for one user
///
/// Produced by the membership resolver from live membership records: the
/// tenant roles a user holds directly and the project roles held directly
/// or inherited transitively (e.g. through tenant ownership).  Owned by the
/// caller for the duration of one authorization call and never cached.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, JsonSchema)]
pub struct EffectiveRoles {
    pub tenant_roles: BTreeMap<String, TenantRole>,
    pub project_roles: BTreeMap<String, ProjectRole>,
}

impl EffectiveRoles {
    /// Folds inherited role assignments into this view.  Directly-held
    /// assignments already present here win over inherited ones.
    pub fn absorb_inherited(&mut self, inherited: EffectiveRoles) {
        for (tenant_id, role) in inherited.tenant_roles {
            self.tenant_roles.entry(tenant_id).or_insert(role);
        }
        for (project_id, role) in inherited.project_roles {
            self.project_roles.entry(project_id).or_insert(role);
        }
    }
}
