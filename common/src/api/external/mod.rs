// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data structures and related facilities for representing resources in the
//! external API
//!
//! The contents here are all HTTP-agnostic.

mod error;
pub use error::*;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FormatResult;

/// Identifies a type of API resource
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
)]
pub enum ResourceType {
    Tenant,
    Project,
    Machine,
    Network,
    Ip,
    Image,
    Partition,
    Switch,
    FilesystemLayout,
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        write!(
            f,
            "{}",
            match self {
                ResourceType::Tenant => "tenant",
                ResourceType::Project => "project",
                ResourceType::Machine => "machine",
                ResourceType::Network => "network",
                ResourceType::Ip => "ip",
                ResourceType::Image => "image",
                ResourceType::Partition => "partition",
                ResourceType::Switch => "switch",
                ResourceType::FilesystemLayout => "filesystem layout",
            }
        )
    }
}
