// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authentication facilities
//!
//! All operations in the server have an associated authentication context
//! that describes who (or what) is performing the operation.  This module
//! includes generic, HTTP-agnostic facilities for representing that.
//!
//! Verifying that a presented credential is genuine happens upstream, in the
//! transport layer.  By the time a [`Context`] exists, that question has
//! been settled: the context either carries a verified [`Token`] or records
//! that the caller presented none.  An anonymous caller is not an error
//! here; public methods may still succeed for them.

use anvil_common::api::external::Error;
use anvil_types::external_api::shared::Token;
use serde::Deserialize;
use serde::Serialize;

/// Describes how the actor performing the current operation is authenticated
///
/// This is HTTP-agnostic.  Subsystems in the server could create contexts
/// for purposes unrelated to HTTP (e.g., background jobs).
#[derive(Clone, Debug)]
pub struct Context {
    /// Describes whether the caller is authenticated and provides more
    /// information that's specific to whether they're authenticated or not
    kind: Kind,
}

impl Context {
    /// Returns the caller's credential token, if any
    pub fn token(&self) -> Option<&Token> {
        self.token_required().ok()
    }

    /// Returns the caller's credential token if present or an
    /// Unauthenticated error otherwise
    pub fn token_required(&self) -> Result<&Token, Error> {
        match &self.kind {
            Kind::Authenticated(Details { token }) => Ok(token),
            Kind::Unauthenticated => Err(Error::Unauthenticated {
                internal_message: "credential token required".to_string(),
            }),
        }
    }

    /// Returns a context for an anonymous caller
    pub fn unauthenticated() -> Context {
        Context { kind: Kind::Unauthenticated }
    }

    /// Returns a context for a caller whose credential token has already
    /// been verified upstream
    pub fn authenticated(token: Token) -> Context {
        Context { kind: Kind::Authenticated(Details { token }) }
    }
}

/// Describes whether the caller is authenticated and provides more
/// information that's specific to whether they're authenticated (or not)
#[derive(Clone, Debug, Deserialize, Serialize)]
enum Kind {
    /// Client did not present a credential
    Unauthenticated,
    /// Client presented a credential that was verified upstream
    Authenticated(Details),
}

/// Describes the credential that was authenticated
#[derive(Clone, Debug, Deserialize, Serialize)]
struct Details {
    /// the token presented with the request
    token: Token,
}

#[cfg(test)]
mod test {
    use super::Context;
    use anvil_common::api::external::Error;
    use anvil_types::external_api::shared::Token;
    use anvil_types::external_api::shared::TokenType;
    use assert_matches::assert_matches;

    fn api_token() -> Token {
        serde_json::from_value(serde_json::json!({
            "user": "robot",
            "token_type": "api",
        }))
        .unwrap()
    }

    #[test]
    fn test_unauthenticated_context() {
        let authn = Context::unauthenticated();
        assert!(authn.token().is_none());
        assert_matches!(
            authn.token_required(),
            Err(Error::Unauthenticated { .. })
        );
    }

    #[test]
    fn test_authenticated_context() {
        let authn = Context::authenticated(api_token());
        assert_eq!(authn.token().unwrap().user, "robot");
        assert_eq!(authn.token_required().unwrap().token_type, TokenType::Api);
    }
}
