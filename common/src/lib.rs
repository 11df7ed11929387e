// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Anvil Control Plane
//!
//! Anvil is a control-plane API server for bare-metal infrastructure: it
//! manages machines, networks, images, partitions, switches and their
//! lifecycles.  This crate implements common facilities shared by the other
//! crates in the workspace (e.g., `anvil_auth`).
//!
//! Since this crate doesn't provide externally-consumable interfaces, the
//! rustdoc (generated with `--document-private-items`) is intended primarily
//! for engineers working on this workspace.

#![allow(rustdoc::private_intra_doc_links)]

pub mod api;
