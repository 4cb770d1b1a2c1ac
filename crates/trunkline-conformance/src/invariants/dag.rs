use indexmap::{IndexMap, IndexSet};
use trunkline_ir::{CrdtState, InvariantCheck, Step, VectorClock};

/// Invariants for DAG-shaped (CRDT) histories.
///
/// The boundary lattice is vacuous here and is not checked. Monotonicity
/// is judged per replica against `prev`; convergence is judged on the step
/// alone and only when no replica is partitioned.
pub fn check_crdt_invariants(step: &Step, prev: Option<&Step>) -> Vec<InvariantCheck> {
    let mut checks = Vec::new();

    if let Some(prev) = prev {
        for (replica_id, curr) in &step.replicas {
            let Some(before) = prev.replicas.get(replica_id) else {
                continue;
            };
            if curr.crashed {
                continue;
            }
            let (Some(curr_crdt), Some(prev_crdt)) = (&curr.crdt_state, &before.crdt_state) else {
                continue;
            };
            monotone_checks(replica_id, prev_crdt, curr_crdt, &mut checks);
        }
    }

    if let Some(check) = convergence_check(step) {
        checks.push(check);
    }

    checks
}

fn monotone_checks(
    replica_id: &str,
    before: &CrdtState,
    curr: &CrdtState,
    checks: &mut Vec<InvariantCheck>,
) {
    if let (Some(prev_set), Some(curr_set)) = (before.add_set(), curr.add_set()) {
        let prev_set: IndexSet<&str> = prev_set.iter().map(String::as_str).collect();
        let curr_set: IndexSet<&str> = curr_set.iter().map(String::as_str).collect();
        let removed = removed_elements(&prev_set, &curr_set);
        let check = if removed.is_empty() {
            let held: Vec<&str> = curr_set.iter().copied().collect();
            InvariantCheck::new(
                format!("Set monotone ({replica_id})"),
                true,
                format!("{{{}}} ⊇ prev", held.join(", ")),
            )
        } else {
            InvariantCheck::new(
                format!("Set monotone ({replica_id})"),
                false,
                format!("VIOLATION: removed elements: {{{}}}", removed.join(", ")),
            )
        };
        checks.push(check);
    }

    if let (Some(prev_events), Some(curr_events)) = (before.events(), curr.events()) {
        let prev_events: IndexSet<&str> = prev_events.iter().map(String::as_str).collect();
        let curr_events: IndexSet<&str> = curr_events.iter().map(String::as_str).collect();
        let removed = removed_elements(&prev_events, &curr_events);
        let check = if removed.is_empty() {
            InvariantCheck::new(
                format!("Events monotone ({replica_id})"),
                true,
                format!("{} events ⊇ prev {}", curr_events.len(), prev_events.len()),
            )
        } else {
            InvariantCheck::new(
                format!("Events monotone ({replica_id})"),
                false,
                format!("VIOLATION: removed events: {{{}}}", removed.join(", ")),
            )
        };
        checks.push(check);
    }

    if let (Some(prev_vc), Some(curr_vc)) = (&before.vector_clock, &curr.vector_clock) {
        let check = match first_clock_decrease(prev_vc, curr_vc) {
            Some(decrease) => InvariantCheck::new(
                format!("VC monotone ({replica_id})"),
                false,
                format!("VIOLATION: {decrease}"),
            ),
            None => {
                let ticks: Vec<String> = curr_vc
                    .iter()
                    .map(|(node, tick)| format!("{node}:{tick}"))
                    .collect();
                InvariantCheck::new(
                    format!("VC monotone ({replica_id})"),
                    true,
                    format!("[{}]", ticks.join(", ")),
                )
            }
        };
        checks.push(check);
    }
}

fn removed_elements<'a>(prev: &IndexSet<&'a str>, curr: &IndexSet<&str>) -> Vec<&'a str> {
    prev.iter().filter(|x| !curr.contains(**x)).copied().collect()
}

/// A node missing from the current clock counts as zero.
fn first_clock_decrease(prev: &VectorClock, curr: &VectorClock) -> Option<String> {
    prev.iter().find_map(|(node, &before)| {
        let now = curr.get(node).copied().unwrap_or(0);
        (now < before).then(|| format!("{node}: {before} → {now} (decreased)"))
    })
}

fn convergence_check(step: &Step) -> Option<InvariantCheck> {
    if step.replicas.values().any(|s| s.partitioned) {
        return None;
    }
    let active: Vec<(&str, String)> = step
        .replicas
        .iter()
        .filter(|(_, s)| !s.crashed)
        .map(|(rid, s)| {
            let key = s
                .crdt_state
                .as_ref()
                .map_or_else(|| "no-crdt".to_owned(), CrdtState::fingerprint);
            (rid.as_str(), key)
        })
        .collect();
    if active.len() <= 1 {
        return None;
    }

    let mut groups: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for (rid, key) in &active {
        groups.entry(key.as_str()).or_default().push(*rid);
    }

    if groups.len() == 1 {
        return Some(InvariantCheck::new(
            "Convergence",
            true,
            format!("All {} active replicas agree", active.len()),
        ));
    }
    let camps: Vec<String> = groups
        .values()
        .map(|ids| format!("{{{}}}", ids.join(", ")))
        .collect();
    Some(InvariantCheck::new(
        "Convergence",
        false,
        format!("Diverged: {}; may converge later", camps.join(" vs ")),
    ))
}
