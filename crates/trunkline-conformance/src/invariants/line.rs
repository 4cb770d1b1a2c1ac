use indexmap::{IndexMap, IndexSet};
use trunkline_ir::{InvariantCheck, ReplicaState, Step};

/// Invariants for line-shaped (totally ordered log) histories.
///
/// Emission order: per-replica lattice checks in replica order, then
/// authority uniqueness per `(configEpoch, leaderEpoch)` group, then
/// authority fencing, then the cross-step trunk and commit laws.
pub fn check_line_invariants(step: &Step, prev: Option<&Step>) -> Vec<InvariantCheck> {
    let mut checks = Vec::new();

    for (replica_id, state) in &step.replicas {
        if state.crashed {
            continue;
        }
        lattice_checks(replica_id, state, &mut checks);
    }

    authority_checks(step, &mut checks);

    if let Some(prev) = prev {
        trunk_checks(step, prev, &mut checks);
    }

    checks
}

fn lattice_checks(replica_id: &str, state: &ReplicaState, checks: &mut Vec<InvariantCheck>) {
    let (t, d, a, c, e) = (
        state.trim,
        state.durable,
        state.applied,
        state.commit,
        state.end,
    );

    checks.push(bound_check(
        "T ≤ C",
        replica_id,
        ("T", t),
        ("C", c),
        "trimmed beyond commit frontier",
    ));
    checks.push(bound_check(
        "D ≤ E",
        replica_id,
        ("D", d),
        ("E", e),
        "durable frontier beyond append frontier",
    ));
    checks.push(bound_check(
        "A ≤ E",
        replica_id,
        ("A", a),
        ("E", e),
        "applied beyond append frontier",
    ));
    checks.push(bound_check(
        "A ≤ C",
        replica_id,
        ("A", a),
        ("C", c),
        "applied uncommitted entries",
    ));

    // Only reported when broken.
    if c > 0 && d < c {
        checks.push(InvariantCheck::new(
            format!("D ≥ C ({replica_id})"),
            false,
            format!("WARNING: D={d} < C={c}; committed entries not durable on this replica"),
        ));
    }
}

fn bound_check(
    name: &str,
    replica_id: &str,
    (lo_name, lo): (&str, u64),
    (hi_name, hi): (&str, u64),
    consequence: &str,
) -> InvariantCheck {
    let holds = lo <= hi;
    let detail = if holds {
        format!("{lo} ≤ {hi}")
    } else {
        format!("VIOLATION: {lo_name}={lo} > {hi_name}={hi}; {consequence}")
    };
    InvariantCheck::new(format!("{name} ({replica_id})"), holds, detail)
}

struct Leader<'a> {
    replica: &'a str,
    epoch: u64,
    partitioned: bool,
}

fn authority_checks(step: &Step, checks: &mut Vec<InvariantCheck>) {
    let leaders: Vec<Leader<'_>> = step
        .replicas
        .iter()
        .filter(|(_, s)| s.leader && !s.crashed)
        .map(|(rid, s)| Leader {
            replica: rid,
            epoch: s.epoch,
            partitioned: s.partitioned,
        })
        .collect();

    let mut groups: IndexMap<(u64, u64), Vec<&str>> = IndexMap::new();
    for (rid, state) in &step.replicas {
        if state.leader && !state.crashed {
            groups
                .entry((state.config_epoch_or_default(), state.epoch))
                .or_default()
                .push(rid);
        }
    }

    for ((config_epoch, epoch), replicas) in &groups {
        let key = format!("{config_epoch}:{epoch}");
        let unique = replicas.len() <= 1;
        let detail = if unique {
            format!("Single leader: {}", replicas[0])
        } else {
            format!(
                "VIOLATION: Multiple leaders in epoch {key}: [{}]; split brain",
                replicas.join(", ")
            )
        };
        checks.push(InvariantCheck::new(
            format!("Authority uniqueness (epoch {key})"),
            unique,
            detail,
        ));
    }

    if leaders.len() <= 1 {
        return;
    }
    let active: Vec<&Leader<'_>> = leaders.iter().filter(|l| !l.partitioned).collect();
    if active.len() <= 1 {
        return;
    }
    let epochs: IndexSet<u64> = active.iter().map(|l| l.epoch).collect();
    if epochs.len() > 1 {
        let epoch_list: Vec<String> = epochs.iter().map(u64::to_string).collect();
        let claimants: Vec<String> = active
            .iter()
            .map(|l| format!("{}(e={})", l.replica, l.epoch))
            .collect();
        checks.push(InvariantCheck::new(
            "Authority fencing",
            false,
            format!(
                "WARNING: {} active leaders across epochs [{}]: {}; old leader not yet fenced",
                active.len(),
                epoch_list.join(", "),
                claimants.join(", ")
            ),
        ));
    }
}

fn trunk_checks(step: &Step, prev: &Step, checks: &mut Vec<InvariantCheck>) {
    for (replica_id, curr) in &step.replicas {
        let Some(before) = prev.replicas.get(replica_id) else {
            continue;
        };
        if curr.crashed {
            continue;
        }

        if curr.commit > before.commit {
            let (holds, detail) = match first_trunk_violation(before, curr) {
                Some(violation) => (false, violation),
                None => (true, format!("C advanced: {} → {}", before.commit, curr.commit)),
            };
            checks.push(InvariantCheck::new(
                format!("Trunk monotone ({replica_id})"),
                holds,
                detail,
            ));
        }

        if curr.commit < before.commit {
            checks.push(InvariantCheck::new(
                format!("C monotone ({replica_id})"),
                false,
                format!(
                    "VIOLATION: C decreased from {} to {}; commit frontier must be monotonically non-decreasing",
                    before.commit, curr.commit
                ),
            ));
        }
    }
}

/// First entry of the previous committed slice that the current committed
/// slice contradicts, rendered as a violation detail.
fn first_trunk_violation(before: &ReplicaState, curr: &ReplicaState) -> Option<String> {
    for prev_entry in before.committed_slice() {
        let Some(curr_entry) = curr
            .committed_slice()
            .find(|e| e.index == prev_entry.index)
        else {
            continue;
        };
        if curr_entry.epoch < prev_entry.epoch {
            return Some(format!(
                "Coupling law violated: entry at idx={} changed from epoch {} to {}; \
                 committed trunk is not monotone in (epoch, index)",
                prev_entry.index, prev_entry.epoch, curr_entry.epoch
            ));
        }
        if curr_entry.epoch == prev_entry.epoch && curr_entry.value != prev_entry.value {
            return Some(format!(
                "Trunk integrity violated: entry at idx={}, epoch={} changed value from \"{}\" to \"{}\"",
                prev_entry.index, prev_entry.epoch, prev_entry.value, curr_entry.value
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use trunkline_ir::{LogEntry, ReplicaMap};

    fn replica(t: u64, d: u64, a: u64, c: u64, e: u64) -> ReplicaState {
        let mut state = ReplicaState::new(1);
        state.trim = t;
        state.durable = d;
        state.applied = a;
        state.commit = c;
        state.end = e;
        state
    }

    fn step_of(id: u64, replicas: Vec<(&str, ReplicaState)>) -> Step {
        let map: ReplicaMap = replicas
            .into_iter()
            .map(|(rid, s)| (rid.to_string(), s))
            .collect();
        Step::new(id, map)
    }

    fn find<'a>(checks: &'a [InvariantCheck], name: &str) -> Option<&'a InvariantCheck> {
        checks.iter().find(|c| c.invariant == name)
    }

    #[test]
    fn healthy_lattice_passes_all_four_bounds() {
        let step = step_of(0, vec![("R1", replica(0, 2, 1, 2, 3))]);
        let checks = check_line_invariants(&step, None);
        let names: Vec<&str> = checks.iter().map(|c| c.invariant.as_str()).collect();
        assert_eq!(names, ["T ≤ C (R1)", "D ≤ E (R1)", "A ≤ E (R1)", "A ≤ C (R1)"]);
        assert!(checks.iter().all(|c| c.holds));
        assert_eq!(checks[0].detail(), "0 ≤ 2");
    }

    #[test]
    fn broken_bounds_name_both_values() {
        let step = step_of(0, vec![("R1", replica(3, 5, 4, 2, 4))]);
        let checks = check_line_invariants(&step, None);
        let trim = find(&checks, "T ≤ C (R1)").unwrap();
        assert!(!trim.holds);
        assert!(trim.detail().contains("T=3") && trim.detail().contains("C=2"));
        let durable = find(&checks, "D ≤ E (R1)").unwrap();
        assert!(!durable.holds);
        assert!(durable.detail().contains("D=5") && durable.detail().contains("E=4"));
        assert!(find(&checks, "A ≤ E (R1)").unwrap().holds);
        assert!(!find(&checks, "A ≤ C (R1)").unwrap().holds);
    }

    #[test]
    fn commit_without_durability_is_flagged() {
        let step = step_of(0, vec![("R1", replica(0, 0, 0, 1, 1)), ("R2", replica(0, 1, 0, 1, 1))]);
        let checks = check_line_invariants(&step, None);
        let flagged = find(&checks, "D ≥ C (R1)").unwrap();
        assert!(!flagged.holds);
        assert!(flagged.detail().contains("D=0 < C=1"));
        assert!(find(&checks, "D ≥ C (R2)").is_none());
    }

    #[test]
    fn crashed_replicas_are_skipped() {
        let mut crashed = replica(5, 0, 0, 0, 0);
        crashed.crashed = true;
        crashed.leader = true;
        let step = step_of(0, vec![("R1", crashed)]);
        assert!(check_line_invariants(&step, None).is_empty());
    }

    #[test]
    fn two_leaders_in_same_epoch_is_split_brain() {
        let mut r1 = replica(0, 0, 0, 0, 0);
        r1.leader = true;
        let mut r2 = replica(0, 0, 0, 0, 0);
        r2.leader = true;
        let step = step_of(0, vec![("R1", r1), ("R2", r2), ("R3", replica(0, 0, 0, 0, 0))]);
        let checks = check_line_invariants(&step, None);
        let authority: Vec<&InvariantCheck> = checks
            .iter()
            .filter(|c| c.family() == "Authority uniqueness")
            .collect();
        assert_eq!(authority.len(), 1);
        assert_eq!(authority[0].invariant, "Authority uniqueness (epoch 0:1)");
        assert!(!authority[0].holds);
        assert!(authority[0].detail().contains("R1") && authority[0].detail().contains("R2"));
        assert!(find(&checks, "Authority fencing").is_none(), "same epoch is not a fencing issue");
    }

    #[test]
    fn unfenced_old_leader_is_warned() {
        let mut old = replica(0, 0, 0, 0, 0);
        old.leader = true;
        let mut new = replica(0, 0, 0, 0, 0);
        new.leader = true;
        new.epoch = 2;
        let step = step_of(0, vec![("R1", old.clone()), ("R3", new.clone())]);
        let checks = check_line_invariants(&step, None);
        assert!(find(&checks, "Authority uniqueness (epoch 0:1)").unwrap().holds);
        assert!(find(&checks, "Authority uniqueness (epoch 0:2)").unwrap().holds);
        let fencing = find(&checks, "Authority fencing").unwrap();
        assert!(!fencing.holds);
        assert!(fencing.detail().contains("R1(e=1), R3(e=2)"));

        old.partitioned = true;
        let step = step_of(0, vec![("R1", old), ("R3", new)]);
        assert!(find(&check_line_invariants(&step, None), "Authority fencing").is_none());
    }

    #[test]
    fn config_epoch_separates_authority_groups() {
        let mut r1 = replica(0, 0, 0, 0, 0);
        r1.leader = true;
        r1.config_epoch = Some(1);
        let mut r2 = replica(0, 0, 0, 0, 0);
        r2.leader = true;
        r2.config_epoch = Some(2);
        let step = step_of(0, vec![("R1", r1), ("R2", r2)]);
        let checks = check_line_invariants(&step, None);
        assert!(find(&checks, "Authority uniqueness (epoch 1:1)").unwrap().holds);
        assert!(find(&checks, "Authority uniqueness (epoch 2:1)").unwrap().holds);
    }

    #[test]
    fn higher_epoch_overwrite_is_monotone() {
        let mut before = replica(0, 1, 0, 1, 1);
        before.log = vec![LogEntry::new(1, "X", 1)];
        let mut after = replica(0, 2, 0, 2, 2);
        after.epoch = 2;
        after.log = vec![LogEntry::new(1, "Y", 2), LogEntry::new(2, "Z", 2)];
        let prev = step_of(0, vec![("R2", before)]);
        let curr = step_of(1, vec![("R2", after)]);
        let checks = check_line_invariants(&curr, Some(&prev));
        let trunk = find(&checks, "Trunk monotone (R2)").unwrap();
        assert!(trunk.holds, "{}", trunk.detail());
        assert_eq!(trunk.detail(), "C advanced: 1 → 2");
    }

    #[test]
    fn epoch_regression_fails_with_first_violation() {
        let mut before = replica(0, 2, 0, 2, 2);
        before.log = vec![LogEntry::new(1, "Y", 2), LogEntry::new(2, "Z", 2)];
        let mut after = replica(0, 3, 0, 3, 3);
        after.log = vec![
            LogEntry::new(1, "X", 1),
            LogEntry::new(2, "W", 1),
            LogEntry::new(3, "V", 2),
        ];
        let prev = step_of(0, vec![("R1", before)]);
        let curr = step_of(1, vec![("R1", after)]);
        let checks = check_line_invariants(&curr, Some(&prev));
        let trunk: Vec<&InvariantCheck> = checks
            .iter()
            .filter(|c| c.family() == "Trunk monotone")
            .collect();
        assert_eq!(trunk.len(), 1);
        assert!(!trunk[0].holds);
        assert!(trunk[0].detail().contains("idx=1 changed from epoch 2 to 1"));
    }

    #[test]
    fn same_epoch_different_value_is_integrity_violation() {
        let mut before = replica(0, 1, 0, 1, 1);
        before.log = vec![LogEntry::new(1, "X", 1)];
        let mut after = replica(0, 2, 0, 2, 2);
        after.log = vec![LogEntry::new(1, "Q", 1), LogEntry::new(2, "Y", 1)];
        let prev = step_of(0, vec![("R1", before)]);
        let curr = step_of(1, vec![("R1", after)]);
        let checks = check_line_invariants(&curr, Some(&prev));
        let trunk = find(&checks, "Trunk monotone (R1)").unwrap();
        assert!(!trunk.holds);
        assert!(trunk.detail().starts_with("Trunk integrity violated"));
    }

    #[test]
    fn commit_retreat_is_flagged_and_stall_is_silent() {
        let prev = step_of(0, vec![("R1", replica(0, 1, 0, 1, 1))]);
        let stalled = step_of(1, vec![("R1", replica(0, 1, 0, 1, 1))]);
        let stalled_checks = check_line_invariants(&stalled, Some(&prev));
        assert!(stalled_checks.iter().all(|c| c.family() != "C monotone"));
        assert!(stalled_checks.iter().all(|c| c.family() != "Trunk monotone"));

        let retreated = step_of(2, vec![("R1", replica(0, 1, 0, 0, 1))]);
        let checks = check_line_invariants(&retreated, Some(&stalled));
        let monotone = find(&checks, "C monotone (R1)").unwrap();
        assert!(!monotone.holds);
        assert!(monotone.detail().contains("from 1 to 0"));
    }
}
