// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for graph cache queries.

use thiserror::Error;

/// Result type for graph cache queries.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors returned by graph cache queries.
///
/// Mutations never fail in a user-visible way; semantic conflicts no-op or
/// create the missing intermediate structure instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// No participant in the graph has a node with the requested name.
    #[error("node '{name}' in namespace '{namespace}' does not exist in the graph")]
    NodeNameNonExistent { namespace: String, name: String },
}

impl GraphError {
    pub(crate) fn node_name_non_existent(namespace: &str, name: &str) -> Self {
        Self::NodeNameNonExistent {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}
