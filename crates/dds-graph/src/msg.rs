// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Announcement message exchanged between participants.
//!
//! Every local participant-scoped mutation of the cache produces a
//! [`ParticipantEntitiesInfo`] snapshot which the host broadcasts over the
//! fabric; remote peers ingest it with
//! [`GraphCache::update_participant_entities`](crate::GraphCache::update_participant_entities).
//! The actual wire encoding is delegated to the transport layer; these types
//! only fix the field layout.

use crate::gid::Gid;
use serde::{Deserialize, Serialize};

/// Topology of a single node as carried in an announcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntitiesInfo {
    pub node_namespace: String,
    pub node_name: String,
    /// Reader gids in association order.
    pub reader_gid_seq: Vec<Gid>,
    /// Writer gids in association order.
    pub writer_gid_seq: Vec<Gid>,
}

/// Full snapshot of one participant's node/endpoint topology.
///
/// By-value: never aliases the cache's internal storage, so it can be handed
/// to a serialization pipeline on another thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantEntitiesInfo {
    pub gid: Gid,
    /// Nodes in the order the participant created them.
    pub node_entities_info_seq: Vec<NodeEntitiesInfo>,
}

impl ParticipantEntitiesInfo {
    /// An announcement carrying no nodes for `gid`.
    #[must_use]
    pub fn empty(gid: Gid) -> Self {
        Self {
            gid,
            node_entities_info_seq: Vec::new(),
        }
    }
}
