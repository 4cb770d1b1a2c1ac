//! Proptest strategies for generating replica states and line-shaped traces.

use proptest::prelude::*;

use crate::replica::{LogEntry, ReplicaMap, ReplicaState};
use crate::step::Step;
use crate::trace::Trace;

/// Strategy for a replica with arbitrary (possibly lattice-violating)
/// boundary counters in `0..=max` and a log covering `1..=E`.
pub fn arb_replica_state(max: u64) -> impl Strategy<Value = ReplicaState> {
    (
        1..=3u64,
        proptest::array::uniform5(0..=max),
        any::<bool>(),
        proptest::bool::weighted(0.15),
        proptest::bool::weighted(0.15),
    )
        .prop_map(|(epoch, [t, d, a, c, e], leader, crashed, partitioned)| {
            let mut replica = ReplicaState::new(epoch);
            replica.trim = t;
            replica.durable = d;
            replica.applied = a;
            replica.commit = c;
            replica.end = e;
            replica.leader = leader;
            replica.crashed = crashed;
            replica.partitioned = partitioned;
            replica.log = (1..=e)
                .map(|idx| LogEntry::new(idx, format!("v{idx}"), epoch))
                .collect();
            replica
        })
}

/// Strategy for a line-shaped trace of `1..=max_steps` steps over a fixed
/// set of 1 to 4 replicas named `R1..Rn`.
pub fn arb_line_trace(max_steps: usize) -> impl Strategy<Value = Trace> {
    (1..=4usize, 1..=max_steps)
        .prop_flat_map(|(replicas, steps)| {
            proptest::collection::vec(
                proptest::collection::vec(arb_replica_state(4), replicas..=replicas),
                steps..=steps,
            )
        })
        .prop_map(|frames| {
            let steps = frames
                .into_iter()
                .enumerate()
                .map(|(id, states)| {
                    let replicas: ReplicaMap = states
                        .into_iter()
                        .enumerate()
                        .map(|(i, state)| (format!("R{}", i + 1), state))
                        .collect();
                    Step::new(id as u64, replicas)
                })
                .collect();
            Trace::new("generated", steps)
        })
}
