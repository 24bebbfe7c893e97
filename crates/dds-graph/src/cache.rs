// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Top-level graph cache: the queryable join of participants, nodes and
//! endpoints.
//!
//! The cache is fed by two independent streams: local mutations from the host
//! process announcing its own entities, and remote announcements received as
//! [`ParticipantEntitiesInfo`] snapshots from peers. Every local
//! participant-scoped mutation returns a fresh snapshot of that participant's
//! record for the host to broadcast; queries read the joined state on demand.
//!
//! The endpoint index and the participant table are independent dimensions.
//! Associations may precede or outlive the endpoint entry they reference;
//! queries skip unknown gids silently. This tolerates out-of-order arrival of
//! discovery events without the two tables ever holding direct links.

use crate::error::{GraphError, GraphResult};
use crate::gid::Gid;
use crate::index::{EndpointInfo, EndpointKind, EntityIndex};
use crate::msg::ParticipantEntitiesInfo;
use crate::participant::ParticipantRecord;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Mapping `topic -> type names`, topics in sorted order, each type list
/// sorted and deduplicated.
pub type NamesAndTypes = BTreeMap<String, Vec<String>>;

/// Parallel (name, namespace) sequences for every node in the graph.
///
/// Order within a single participant is node insertion order; order between
/// participants is first-observation order. The same (namespace, name) pair
/// appears once per hosting participant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamesAndNamespaces {
    pub names: Vec<String>,
    pub namespaces: Vec<String>,
}

impl NamesAndNamespaces {
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Endpoint details reported by the per-topic introspection queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicEndpointInfo {
    pub node_name: String,
    pub node_namespace: String,
    pub endpoint_gid: Gid,
    /// Type name after demangling.
    pub topic_type: String,
    pub kind: EndpointKind,
}

/// Node name reported for endpoints not associated with any node.
pub const NODE_NAME_UNKNOWN: &str = "_NODE_NAME_UNKNOWN_";
/// Node namespace reported for endpoints not associated with any node.
pub const NODE_NAMESPACE_UNKNOWN: &str = "_NODE_NAMESPACE_UNKNOWN_";

/// Identity demangle function; a valid default for both topic and type names.
#[must_use]
pub fn identity_demangle(name: &str) -> String {
    name.to_string()
}

type OnChangeCallback = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct GraphState {
    entities: EntityIndex,
    /// First-observation order. Linear scans are fine at mesh scale.
    participants: Vec<ParticipantRecord>,
}

impl GraphState {
    fn participant(&self, gid: &Gid) -> Option<&ParticipantRecord> {
        self.participants.iter().find(|record| record.gid == *gid)
    }

    fn participant_mut(&mut self, gid: &Gid) -> Option<&mut ParticipantRecord> {
        self.participants
            .iter_mut()
            .find(|record| record.gid == *gid)
    }

    fn participant_mut_or_insert(&mut self, gid: Gid) -> &mut ParticipantRecord {
        match self
            .participants
            .iter()
            .position(|record| record.gid == gid)
        {
            Some(index) => &mut self.participants[index],
            None => {
                self.participants.push(ParticipantRecord::new(gid));
                self.participants.last_mut().expect("record just pushed")
            }
        }
    }

    /// First node (in table order) whose association list of the given kind
    /// contains `gid`.
    fn owner_of(&self, gid: &Gid, kind: EndpointKind) -> Option<(&str, &str)> {
        self.participants
            .iter()
            .flat_map(|record| record.nodes())
            .find(|node| node.gids(kind).contains(gid))
            .map(|node| (node.name.as_str(), node.namespace.as_str()))
    }
}

/// Cached view of the distributed participant/entity graph.
///
/// A single reader-writer lock guards the whole state: mutations take
/// exclusive access, queries take shared access. No operation suspends; all
/// critical sections are bounded by the size of the affected record or the
/// endpoint index. Demangle callbacks run under the shared lock and must not
/// re-enter the cache.
pub struct GraphCache {
    state: RwLock<GraphState>,
    on_change: Mutex<Option<OnChangeCallback>>,
}

impl GraphCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
            on_change: Mutex::new(None),
        }
    }

    /// Install a callback fired after every mutation that changed observable
    /// state. Replaces any previous callback.
    ///
    /// The callback runs outside the state lock, so it may query the cache,
    /// but it must not install or remove callbacks itself.
    pub fn set_on_change_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_change.lock() = Some(Box::new(callback));
    }

    /// Remove the on-change callback, if any.
    pub fn clear_on_change_callback(&self) {
        *self.on_change.lock() = None;
    }

    fn notify_change(&self) {
        if let Some(callback) = self.on_change.lock().as_ref() {
            callback();
        }
    }

    // ------------------------------------------------------------------
    // Mutation surface
    // ------------------------------------------------------------------

    /// Insert an endpoint into the endpoint index.
    ///
    /// Returns `true` if the gid was newly inserted. An existing mapping is
    /// left untouched (the first write wins).
    pub fn add_entity(
        &self,
        gid: Gid,
        topic_name: &str,
        type_name: &str,
        kind: EndpointKind,
    ) -> bool {
        let inserted = self.state.write().entities.insert(
            gid,
            EndpointInfo {
                topic_name: topic_name.to_string(),
                type_name: type_name.to_string(),
                kind,
            },
        );
        if inserted {
            log::debug!(
                "[graph] add_entity: {} on '{}' type '{}' ({:?})",
                gid,
                topic_name,
                type_name,
                kind
            );
            self.notify_change();
        }
        inserted
    }

    /// Remove an endpoint from the endpoint index.
    ///
    /// The stored role must agree with `kind`; on mismatch the call returns
    /// `false` and the index is unchanged. Associations referencing the gid
    /// stay in place: the owning participant removes them with an explicit
    /// `dissociate_*` and re-announces, since the ordering between the
    /// endpoint removal and the node dissociation is not synchronized.
    pub fn remove_entity(&self, gid: &Gid, kind: EndpointKind) -> bool {
        let removed = self.state.write().entities.remove(gid, kind);
        if removed {
            log::debug!("[graph] remove_entity: {} ({:?})", gid, kind);
            self.notify_change();
        }
        removed
    }

    /// Add a participant with an empty node list. Idempotent; returns `true`
    /// when the participant was newly observed.
    pub fn add_participant(&self, gid: Gid) -> bool {
        let inserted = {
            let mut state = self.state.write();
            if state.participant(&gid).is_some() {
                false
            } else {
                state.participants.push(ParticipantRecord::new(gid));
                true
            }
        };
        if inserted {
            log::debug!("[graph] add_participant: {}", gid);
            self.notify_change();
        }
        inserted
    }

    /// Remove a participant, discarding its entire node list and every
    /// association it contained. Endpoint index entries are untouched.
    pub fn remove_participant(&self, gid: &Gid) -> bool {
        let removed = {
            let mut state = self.state.write();
            match state.participants.iter().position(|r| r.gid == *gid) {
                Some(index) => {
                    state.participants.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            log::debug!("[graph] remove_participant: {}", gid);
            self.notify_change();
        }
        removed
    }

    /// Append a node to a participant, creating the participant record when
    /// absent. Returns the participant's updated snapshot.
    pub fn add_node(
        &self,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        let info = {
            let mut state = self.state.write();
            let record = state.participant_mut_or_insert(participant_gid);
            record.add_node(node_name, node_namespace);
            record.to_info()
        };
        log::debug!(
            "[graph] add_node: '{}' in '{}' on {}",
            node_name,
            node_namespace,
            participant_gid
        );
        self.notify_change();
        info
    }

    /// Remove the first node matching (namespace, name) from a participant.
    /// Returns the updated snapshot, which may be empty; if the participant
    /// is absent, an empty snapshot with its gid.
    pub fn remove_node(
        &self,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        let (info, removed) = {
            let mut state = self.state.write();
            match state.participant_mut(&participant_gid) {
                Some(record) => {
                    let removed = record.remove_node(node_name, node_namespace);
                    (record.to_info(), removed)
                }
                None => (ParticipantEntitiesInfo::empty(participant_gid), false),
            }
        };
        if removed {
            self.notify_change();
        }
        info
    }

    /// Append `reader_gid` to the targeted node's reader list, creating the
    /// participant and the node on the fly when absent.
    pub fn associate_reader(
        &self,
        reader_gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        self.associate(
            EndpointKind::Reader,
            reader_gid,
            participant_gid,
            node_name,
            node_namespace,
        )
    }

    /// Append `writer_gid` to the targeted node's writer list, creating the
    /// participant and the node on the fly when absent.
    pub fn associate_writer(
        &self,
        writer_gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        self.associate(
            EndpointKind::Writer,
            writer_gid,
            participant_gid,
            node_name,
            node_namespace,
        )
    }

    /// Remove the first occurrence of `reader_gid` from the targeted node's
    /// reader list. No-op if absent at any level.
    pub fn dissociate_reader(
        &self,
        reader_gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        self.dissociate(
            EndpointKind::Reader,
            reader_gid,
            participant_gid,
            node_name,
            node_namespace,
        )
    }

    /// Remove the first occurrence of `writer_gid` from the targeted node's
    /// writer list. No-op if absent at any level.
    pub fn dissociate_writer(
        &self,
        writer_gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        self.dissociate(
            EndpointKind::Writer,
            writer_gid,
            participant_gid,
            node_name,
            node_namespace,
        )
    }

    fn associate(
        &self,
        kind: EndpointKind,
        endpoint_gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        let info = {
            let mut state = self.state.write();
            let record = state.participant_mut_or_insert(participant_gid);
            record.associate(kind, endpoint_gid, node_name, node_namespace);
            record.to_info()
        };
        log::debug!(
            "[graph] associate {:?} {} with '{}' in '{}' on {}",
            kind,
            endpoint_gid,
            node_name,
            node_namespace,
            participant_gid
        );
        self.notify_change();
        info
    }

    fn dissociate(
        &self,
        kind: EndpointKind,
        endpoint_gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        let (info, removed) = {
            let mut state = self.state.write();
            match state.participant_mut(&participant_gid) {
                Some(record) => {
                    let removed =
                        record.dissociate(kind, &endpoint_gid, node_name, node_namespace);
                    (record.to_info(), removed)
                }
                None => (ParticipantEntitiesInfo::empty(participant_gid), false),
            }
        };
        if removed {
            self.notify_change();
        }
        info
    }

    /// Atomically replace the participant record identified by `info.gid`
    /// with the node list carried in the announcement, creating the record
    /// when absent.
    ///
    /// An empty node list empties the record but retains it; explicit
    /// departure is signalled by a subsequent [`remove_participant`].
    ///
    /// [`remove_participant`]: GraphCache::remove_participant
    pub fn update_participant_entities(&self, info: ParticipantEntitiesInfo) {
        let changed = {
            let mut state = self.state.write();
            let record = state.participant_mut_or_insert(info.gid);
            record.replace_nodes(info.node_entities_info_seq)
        };
        if changed {
            log::debug!("[graph] update_participant_entities: {}", info.gid);
            self.notify_change();
        }
    }

    // ------------------------------------------------------------------
    // Query surface
    // ------------------------------------------------------------------

    /// Every (name, namespace) across every participant, as parallel
    /// sequences.
    #[must_use]
    pub fn node_names(&self) -> NamesAndNamespaces {
        let state = self.state.read();
        let mut out = NamesAndNamespaces::default();
        for record in &state.participants {
            for node in record.nodes() {
                out.names.push(node.name.clone());
                out.namespaces.push(node.namespace.clone());
            }
        }
        out
    }

    /// Total node count across all participants, duplicates counted once per
    /// occurrence.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.state
            .read()
            .participants
            .iter()
            .map(ParticipantRecord::node_count)
            .sum()
    }

    /// Mapping `demangled topic -> sorted demangled types` over the entire
    /// endpoint index. Entries whose demangling returns an empty string are
    /// omitted.
    pub fn names_and_types(
        &self,
        demangle_topic: impl Fn(&str) -> String,
        demangle_type: impl Fn(&str) -> String,
    ) -> NamesAndTypes {
        let state = self.state.read();
        Self::collect_names_and_types(
            state.entities.iter().map(|(_, info)| info),
            &demangle_topic,
            &demangle_type,
        )
    }

    /// Reader topics and types of the nodes matching (namespace, name),
    /// unioned across participants.
    ///
    /// Fails with [`GraphError::NodeNameNonExistent`] when no participant has
    /// such a node. Gids absent from the endpoint index are skipped silently.
    pub fn reader_names_and_types_by_node(
        &self,
        node_name: &str,
        node_namespace: &str,
        demangle_topic: impl Fn(&str) -> String,
        demangle_type: impl Fn(&str) -> String,
    ) -> GraphResult<NamesAndTypes> {
        self.names_and_types_by_node(
            EndpointKind::Reader,
            node_name,
            node_namespace,
            demangle_topic,
            demangle_type,
        )
    }

    /// Writer topics and types of the nodes matching (namespace, name),
    /// unioned across participants.
    pub fn writer_names_and_types_by_node(
        &self,
        node_name: &str,
        node_namespace: &str,
        demangle_topic: impl Fn(&str) -> String,
        demangle_type: impl Fn(&str) -> String,
    ) -> GraphResult<NamesAndTypes> {
        self.names_and_types_by_node(
            EndpointKind::Writer,
            node_name,
            node_namespace,
            demangle_topic,
            demangle_type,
        )
    }

    /// Number of readers whose topic name equals `topic_name` literally (no
    /// demangling).
    #[must_use]
    pub fn reader_count(&self, topic_name: &str) -> usize {
        self.state
            .read()
            .entities
            .count_matching(topic_name, EndpointKind::Reader)
    }

    /// Number of writers whose topic name equals `topic_name` literally (no
    /// demangling).
    #[must_use]
    pub fn writer_count(&self, topic_name: &str) -> usize {
        self.state
            .read()
            .entities
            .count_matching(topic_name, EndpointKind::Writer)
    }

    /// Per-endpoint details for every reader on `topic_name` (literal match),
    /// with the owning node resolved through the associations. Endpoints not
    /// associated with any node report [`NODE_NAME_UNKNOWN`] /
    /// [`NODE_NAMESPACE_UNKNOWN`]. Results are ordered by endpoint gid.
    pub fn readers_info_by_topic(
        &self,
        topic_name: &str,
        demangle_type: impl Fn(&str) -> String,
    ) -> Vec<TopicEndpointInfo> {
        self.info_by_topic(EndpointKind::Reader, topic_name, demangle_type)
    }

    /// Per-endpoint details for every writer on `topic_name`; see
    /// [`readers_info_by_topic`](GraphCache::readers_info_by_topic).
    pub fn writers_info_by_topic(
        &self,
        topic_name: &str,
        demangle_type: impl Fn(&str) -> String,
    ) -> Vec<TopicEndpointInfo> {
        self.info_by_topic(EndpointKind::Writer, topic_name, demangle_type)
    }

    fn names_and_types_by_node(
        &self,
        kind: EndpointKind,
        node_name: &str,
        node_namespace: &str,
        demangle_topic: impl Fn(&str) -> String,
        demangle_type: impl Fn(&str) -> String,
    ) -> GraphResult<NamesAndTypes> {
        let state = self.state.read();
        let mut found = false;
        let entries = state
            .participants
            .iter()
            .flat_map(|record| record.nodes())
            .filter(|node| node.matches(node_name, node_namespace))
            .inspect(|_| found = true)
            .flat_map(|node| node.gids(kind))
            .filter_map(|gid| state.entities.get(gid))
            .filter(|info| info.kind == kind);
        let out = Self::collect_names_and_types(entries, &demangle_topic, &demangle_type);
        if !found {
            return Err(GraphError::node_name_non_existent(node_namespace, node_name));
        }
        Ok(out)
    }

    fn collect_names_and_types<'a>(
        entries: impl Iterator<Item = &'a EndpointInfo>,
        demangle_topic: &impl Fn(&str) -> String,
        demangle_type: &impl Fn(&str) -> String,
    ) -> NamesAndTypes {
        let mut topics: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for info in entries {
            let topic = demangle_topic(&info.topic_name);
            if topic.is_empty() {
                continue;
            }
            let type_name = demangle_type(&info.type_name);
            if type_name.is_empty() {
                continue;
            }
            topics.entry(topic).or_default().insert(type_name);
        }
        topics
            .into_iter()
            .map(|(topic, types)| (topic, types.into_iter().collect()))
            .collect()
    }

    fn info_by_topic(
        &self,
        kind: EndpointKind,
        topic_name: &str,
        demangle_type: impl Fn(&str) -> String,
    ) -> Vec<TopicEndpointInfo> {
        let state = self.state.read();
        let mut out: Vec<TopicEndpointInfo> = state
            .entities
            .iter()
            .filter(|(_, info)| info.kind == kind && info.topic_name == topic_name)
            .map(|(gid, info)| {
                let (node_name, node_namespace) = match state.owner_of(gid, kind) {
                    Some((name, namespace)) => (name.to_string(), namespace.to_string()),
                    None => (
                        NODE_NAME_UNKNOWN.to_string(),
                        NODE_NAMESPACE_UNKNOWN.to_string(),
                    ),
                };
                TopicEndpointInfo {
                    node_name,
                    node_namespace,
                    endpoint_gid: *gid,
                    topic_type: demangle_type(&info.type_name),
                    kind,
                }
            })
            .collect();
        out.sort_by_key(|entry| entry.endpoint_gid);
        out
    }
}

impl Default for GraphCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GraphCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        writeln!(f, "graph cache:")?;
        writeln!(f, "  participants:")?;
        for record in &state.participants {
            writeln!(f, "    gid: '{}'", record.gid)?;
            for node in record.nodes() {
                writeln!(
                    f,
                    "      node: '{}' in '{}'",
                    node.name, node.namespace
                )?;
                for gid in node.gids(EndpointKind::Reader) {
                    writeln!(f, "        reader gid: '{}'", gid)?;
                }
                for gid in node.gids(EndpointKind::Writer) {
                    writeln!(f, "        writer gid: '{}'", gid)?;
                }
            }
        }
        writeln!(f, "  entities ({}):", state.entities.len())?;
        let mut entries: Vec<_> = state.entities.iter().collect();
        entries.sort_by_key(|(gid, _)| **gid);
        for (gid, info) in entries {
            writeln!(
                f,
                "    gid: '{}', topic: '{}', type: '{}' ({:?})",
                gid, info.topic_name, info.type_name, info.kind
            )?;
        }
        Ok(())
    }
}
