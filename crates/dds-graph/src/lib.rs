// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dds-graph - Distributed participant/entity graph cache
//!
//! Each process ("participant") in a DDS-based peer-to-peer mesh maintains its
//! own cached view of the global graph: which participants exist, which
//! logical nodes each participant hosts, and which data readers/writers sit on
//! which topic. The cache is fed by two independent streams:
//!
//! - local, immediate mutations from the host process announcing its own
//!   entities, and
//! - remote announcements received as [`ParticipantEntitiesInfo`] snapshots
//!   from peers over the DDS fabric.
//!
//! Every local participant-scoped mutation returns a fresh snapshot for the
//! host to broadcast; remote snapshots replace the corresponding participant
//! record atomically. Introspection queries (node lists, topic/type lists,
//! per-node reader/writer lists, per-topic counts) read the joined state on
//! demand, with demangling hooks applied to topic and type names.
//!
//! ## Quick Start
//!
//! ```rust
//! use dds_graph::{EndpointKind, Gid, GraphCache};
//!
//! let cache = GraphCache::new();
//! let participant = Gid::from_bytes([1; 24]);
//! let reader = Gid::from_bytes([2; 24]);
//!
//! cache.add_entity(
//!     reader,
//!     "sensors/temperature",
//!     "sensor_msgs/Temperature",
//!     EndpointKind::Reader,
//! );
//! cache.add_node(participant, "thermometer", "/sensors");
//! let announcement = cache.associate_reader(reader, participant, "thermometer", "/sensors");
//! // Broadcast `announcement` to peers; they ingest it with
//! // `update_participant_entities`.
//!
//! assert_eq!(cache.reader_count("sensors/temperature"), 1);
//! # let _ = announcement;
//! ```
//!
//! ## Concurrency
//!
//! [`GraphCache`] owns a single reader-writer lock over its whole state.
//! Discovery threads can feed remote announcements while application threads
//! mutate local entities and run queries. Snapshots are by-value deep copies,
//! so they can be serialized on another thread without holding any lock.

/// Graph cache aggregate and query adapters.
pub mod cache;
/// Error types for graph queries.
pub mod error;
/// Opaque entity identifier.
pub mod gid;
/// Endpoint index (gid -> topic/type/role).
pub mod index;
/// Announcement message types.
pub mod msg;
mod participant;

pub use cache::{
    identity_demangle, GraphCache, NamesAndNamespaces, NamesAndTypes, TopicEndpointInfo,
    NODE_NAMESPACE_UNKNOWN, NODE_NAME_UNKNOWN,
};
pub use error::{GraphError, GraphResult};
pub use gid::{Gid, GID_STORAGE_SIZE};
pub use index::{EndpointInfo, EndpointKind};
pub use msg::{NodeEntitiesInfo, ParticipantEntitiesInfo};
