// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all errors surfaced by the binary. This should be the *only*
//! error enum that is publicly visible from the CLI.

use thiserror::Error;

use crate::{config::ConfigError, merge::MergeError, source::SourceError};

#[derive(Error, Debug)]
pub enum IngestError {
    /// An error in the configuration file.
    #[error("{0}\n\nCheck the configuration file; see README.md for the available keys.")]
    Config(String),

    /// An error setting up the network sources.
    #[error("{0}\n\nCheck the network section of the configuration file.")]
    Source(String),

    /// A fatal error from the merge engine.
    #[error("{0}")]
    Merge(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

impl From<ConfigError> for IngestError {
    fn from(e: ConfigError) -> Self {
        let s = e.to_string();
        match e {
            ConfigError::IO(_) => Self::Generic(s),
            _ => Self::Config(s),
        }
    }
}

impl From<SourceError> for IngestError {
    fn from(e: SourceError) -> Self {
        let s = e.to_string();
        match e {
            SourceError::Bind { .. } => Self::Source(s),
            SourceError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<MergeError> for IngestError {
    fn from(e: MergeError) -> Self {
        Self::Merge(e.to_string())
    }
}

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
