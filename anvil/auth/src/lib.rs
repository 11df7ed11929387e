// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request authentication and authorization for the anvil control plane
//!
//! Every inbound API call carries an (already-verified) credential token, or
//! no token at all.  The [`authn`] module represents that fact; the [`authz`]
//! module decides, per call, whether the requested method may be invoked
//! against the requested scoped resource.

pub mod authn;
pub mod authz;
