// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Property tests for the cache's trace invariants: the endpoint index
//! tracks a reference model under arbitrary add/remove interleavings, and
//! an association round-trip leaves the participant record untouched.

use dds_graph::{EndpointKind, Gid, GraphCache, GID_STORAGE_SIZE};
use proptest::prelude::*;
use std::collections::HashMap;

const TOPICS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];
const TYPES: [&str; 3] = ["Str", "Int", "Float"];
const NODES: [(&str, &str); 3] = [("ns1", "node1"), ("ns1", "node2"), ("ns2", "node1")];

fn gid_from(seed: u8) -> Gid {
    let mut bytes = [0u8; GID_STORAGE_SIZE];
    bytes[0] = seed;
    Gid::from_bytes(bytes)
}

fn kind_of(reader: bool) -> EndpointKind {
    if reader {
        EndpointKind::Reader
    } else {
        EndpointKind::Writer
    }
}

#[derive(Debug, Clone)]
enum IndexOp {
    Add {
        seed: u8,
        topic: usize,
        type_idx: usize,
        reader: bool,
    },
    Remove {
        seed: u8,
        reader: bool,
    },
}

fn index_op() -> impl Strategy<Value = IndexOp> {
    prop_oneof![
        (0u8..8, 0usize..TOPICS.len(), 0usize..TYPES.len(), any::<bool>()).prop_map(
            |(seed, topic, type_idx, reader)| IndexOp::Add {
                seed,
                topic,
                type_idx,
                reader,
            }
        ),
        (0u8..8, any::<bool>()).prop_map(|(seed, reader)| IndexOp::Remove { seed, reader }),
    ]
}

proptest! {
    /// The endpoint index behaves like a first-write-wins map with
    /// role-checked removal, and the per-topic counts always agree with it.
    #[test]
    fn counts_track_a_model_index(ops in prop::collection::vec(index_op(), 0..64)) {
        let cache = GraphCache::new();
        // seed -> (topic, type, is_reader)
        let mut model: HashMap<u8, (usize, usize, bool)> = HashMap::new();

        for op in ops {
            match op {
                IndexOp::Add { seed, topic, type_idx, reader } => {
                    let expected = !model.contains_key(&seed);
                    let changed = cache.add_entity(
                        gid_from(seed),
                        TOPICS[topic],
                        TYPES[type_idx],
                        kind_of(reader),
                    );
                    prop_assert_eq!(changed, expected);
                    model.entry(seed).or_insert((topic, type_idx, reader));
                }
                IndexOp::Remove { seed, reader } => {
                    let expected = model
                        .get(&seed)
                        .is_some_and(|&(_, _, stored)| stored == reader);
                    let changed = cache.remove_entity(&gid_from(seed), kind_of(reader));
                    prop_assert_eq!(changed, expected);
                    if expected {
                        model.remove(&seed);
                    }
                }
            }
        }

        for (topic_idx, topic) in TOPICS.iter().enumerate() {
            let readers = model
                .values()
                .filter(|&&(t, _, r)| t == topic_idx && r)
                .count();
            let writers = model
                .values()
                .filter(|&&(t, _, r)| t == topic_idx && !r)
                .count();
            prop_assert_eq!(cache.reader_count(topic), readers);
            prop_assert_eq!(cache.writer_count(topic), writers);
        }
    }

    /// Associating a fresh endpoint and then dissociating it restores the
    /// participant record exactly, regardless of prior associations.
    #[test]
    fn dissociate_restores_pre_associate_snapshot(
        prefix in prop::collection::vec((0u8..6, any::<bool>(), 0usize..NODES.len()), 0..24),
        probe_seed in 100u8..110,
        probe_reader in any::<bool>(),
        node_idx in 0usize..NODES.len(),
    ) {
        let cache = GraphCache::new();
        let participant = gid_from(42);
        for (namespace, name) in NODES {
            cache.add_node(participant, name, namespace);
        }
        for (seed, reader, node) in prefix {
            let (namespace, name) = NODES[node];
            if reader {
                cache.associate_reader(gid_from(seed), participant, name, namespace);
            } else {
                cache.associate_writer(gid_from(seed), participant, name, namespace);
            }
        }

        // A no-op mutation materializes the current record.
        let before = cache.remove_node(participant, "absent", "absent");

        let (namespace, name) = NODES[node_idx];
        let probe = gid_from(probe_seed);
        if probe_reader {
            cache.associate_reader(probe, participant, name, namespace);
            cache.dissociate_reader(probe, participant, name, namespace);
        } else {
            cache.associate_writer(probe, participant, name, namespace);
            cache.dissociate_writer(probe, participant, name, namespace);
        }

        let after = cache.remove_node(participant, "absent", "absent");
        prop_assert_eq!(before, after);
    }
}
