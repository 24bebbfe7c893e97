// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-participant record: ordered node list with endpoint associations.

use crate::gid::Gid;
use crate::index::EndpointKind;
use crate::msg::{NodeEntitiesInfo, ParticipantEntitiesInfo};

/// One node within a participant.
///
/// Reader/writer lists keep the insertion order of association calls; remote
/// peers observe that order through the announcement snapshots. A gid may
/// appear more than once if the caller double-associates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodeEntry {
    pub namespace: String,
    pub name: String,
    pub readers: Vec<Gid>,
    pub writers: Vec<Gid>,
}

impl NodeEntry {
    fn new(name: &str, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    pub fn matches(&self, name: &str, namespace: &str) -> bool {
        self.name == name && self.namespace == namespace
    }

    pub fn gids(&self, kind: EndpointKind) -> &[Gid] {
        match kind {
            EndpointKind::Reader => &self.readers,
            EndpointKind::Writer => &self.writers,
        }
    }

    fn gids_mut(&mut self, kind: EndpointKind) -> &mut Vec<Gid> {
        match kind {
            EndpointKind::Reader => &mut self.readers,
            EndpointKind::Writer => &mut self.writers,
        }
    }
}

/// Record of a single participant's topology.
///
/// Local and remote participants share this shape; only the API path that
/// mutates them differs. Nodes keep `add_node` order, so a node removed and
/// re-added appears at the end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ParticipantRecord {
    pub gid: Gid,
    nodes: Vec<NodeEntry>,
}

impl ParticipantRecord {
    pub fn new(gid: Gid) -> Self {
        Self {
            gid,
            nodes: Vec::new(),
        }
    }

    pub fn nodes(&self) -> &[NodeEntry] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Append a new node with empty reader/writer lists.
    pub fn add_node(&mut self, name: &str, namespace: &str) {
        self.nodes.push(NodeEntry::new(name, namespace));
    }

    /// Remove the first node matching (namespace, name). Returns whether a
    /// node was removed.
    pub fn remove_node(&mut self, name: &str, namespace: &str) -> bool {
        match self.nodes.iter().position(|n| n.matches(name, namespace)) {
            Some(index) => {
                self.nodes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Append `endpoint` to the targeted node's reader or writer list,
    /// creating the node when absent. Duplicates append unconditionally.
    pub fn associate(&mut self, kind: EndpointKind, endpoint: Gid, name: &str, namespace: &str) {
        let node = match self.nodes.iter().position(|n| n.matches(name, namespace)) {
            Some(index) => &mut self.nodes[index],
            None => {
                self.nodes.push(NodeEntry::new(name, namespace));
                self.nodes.last_mut().expect("node just pushed")
            }
        };
        node.gids_mut(kind).push(endpoint);
    }

    /// Remove the first occurrence of `endpoint` from the targeted node's
    /// list. No-op (returning `false`) if the node or the gid is absent.
    pub fn dissociate(
        &mut self,
        kind: EndpointKind,
        endpoint: &Gid,
        name: &str,
        namespace: &str,
    ) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.matches(name, namespace)) else {
            return false;
        };
        let gids = node.gids_mut(kind);
        match gids.iter().position(|gid| gid == endpoint) {
            Some(index) => {
                gids.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace the whole node list from an announcement. Returns whether the
    /// record changed.
    pub fn replace_nodes(&mut self, nodes: Vec<NodeEntitiesInfo>) -> bool {
        let nodes: Vec<NodeEntry> = nodes.into_iter().map(NodeEntry::from).collect();
        if self.nodes == nodes {
            return false;
        }
        self.nodes = nodes;
        true
    }

    /// Produce the broadcastable snapshot of this record (deep copy).
    pub fn to_info(&self) -> ParticipantEntitiesInfo {
        ParticipantEntitiesInfo::from(self)
    }
}

impl From<&NodeEntry> for NodeEntitiesInfo {
    fn from(node: &NodeEntry) -> Self {
        Self {
            node_namespace: node.namespace.clone(),
            node_name: node.name.clone(),
            reader_gid_seq: node.readers.clone(),
            writer_gid_seq: node.writers.clone(),
        }
    }
}

impl From<NodeEntitiesInfo> for NodeEntry {
    fn from(info: NodeEntitiesInfo) -> Self {
        Self {
            namespace: info.node_namespace,
            name: info.node_name,
            readers: info.reader_gid_seq,
            writers: info.writer_gid_seq,
        }
    }
}

impl From<&ParticipantRecord> for ParticipantEntitiesInfo {
    fn from(record: &ParticipantRecord) -> Self {
        Self {
            gid: record.gid,
            node_entities_info_seq: record.nodes.iter().map(NodeEntitiesInfo::from).collect(),
        }
    }
}
