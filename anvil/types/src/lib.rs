// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Types underpinning the anvil external API
//!
//! These are shared by the API server and its clients and carry no behavior
//! beyond construction, accessors, and wire (de)serialization.

pub mod external_api;
