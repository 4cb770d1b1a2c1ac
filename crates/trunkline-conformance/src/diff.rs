//! Structured delta between adjacent steps, for change highlighting.

use std::collections::HashSet;

use trunkline_ir::diff::{BoundaryChange, EntryChange, EpochChange, FlagChange, RoleChange};
use trunkline_ir::{BoundaryKey, LogEntry, ReplicaFlag, Step, StepDiff};

/// Log entries are compared as a set keyed by `(index, value, epoch)`.
type EntryKey<'a> = (u64, &'a str, u64);

fn entry_key(entry: &LogEntry) -> EntryKey<'_> {
    (entry.index, entry.value.as_str(), entry.epoch)
}

/// The delta from `prev` to `curr`.
///
/// With no predecessor only the certificate list and `violation_appeared`
/// are populated. Replicas present in one step only are skipped.
pub fn compute_step_diff(prev: Option<&Step>, curr: &Step) -> StepDiff {
    let mut diff = StepDiff {
        certs_issued: curr.certificates.clone(),
        violation_appeared: curr.violation.is_some()
            && prev.map_or(true, |p| p.violation.is_none()),
        violation_resolved: curr.violation.is_none()
            && prev.is_some_and(|p| p.violation.is_some()),
        ..StepDiff::default()
    };

    let Some(prev) = prev else {
        return diff;
    };

    for (replica_id, before) in &prev.replicas {
        let Some(after) = curr.replicas.get(replica_id) else {
            continue;
        };

        for boundary in BoundaryKey::ALL {
            let (old, new) = (before.boundary(boundary), after.boundary(boundary));
            if old != new {
                diff.boundaries_changed.push(BoundaryChange {
                    replica: replica_id.clone(),
                    boundary,
                    old,
                    new,
                });
            }
        }

        let before_keys: HashSet<EntryKey<'_>> = before.log.iter().map(entry_key).collect();
        let after_keys: HashSet<EntryKey<'_>> = after.log.iter().map(entry_key).collect();
        diff.entries_added.extend(
            after
                .log
                .iter()
                .filter(|e| !before_keys.contains(&entry_key(e)))
                .map(|e| EntryChange {
                    replica: replica_id.clone(),
                    entry: e.clone(),
                }),
        );
        diff.entries_removed.extend(
            before
                .log
                .iter()
                .filter(|e| !after_keys.contains(&entry_key(e)))
                .map(|e| EntryChange {
                    replica: replica_id.clone(),
                    entry: e.clone(),
                }),
        );

        if before.epoch != after.epoch {
            diff.epoch_changed.push(EpochChange {
                replica: replica_id.clone(),
                old: before.epoch,
                new: after.epoch,
            });
        }

        if before.role() != after.role() {
            diff.role_changed.push(RoleChange {
                replica: replica_id.clone(),
                old: before.role(),
                new: after.role(),
            });
        }

        for flag in ReplicaFlag::ALL {
            let (old, new) = (before.flag(flag), after.flag(flag));
            if old != new {
                diff.flags_changed.push(FlagChange {
                    replica: replica_id.clone(),
                    flag,
                    old,
                    new,
                });
            }
        }
    }

    diff
}

/// Diff of the step at `index` against its predecessor, or `None` when
/// `index` is out of range.
pub fn step_diff(index: usize, steps: &[Step]) -> Option<StepDiff> {
    let curr = steps.get(index)?;
    let prev = index.checked_sub(1).and_then(|p| steps.get(p));
    Some(compute_step_diff(prev, curr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trunkline_ir::step::Violation;
    use trunkline_ir::{Certificate, CertificateType, ReplicaMap, ReplicaState, Role};

    fn replica(epoch: u64, log: &[(u64, &str, u64)]) -> ReplicaState {
        let mut state = ReplicaState::new(epoch);
        state.log = log.iter().map(|&(i, v, e)| LogEntry::new(i, v, e)).collect();
        state.end = log.len() as u64;
        state
    }

    fn step_of(id: u64, replicas: Vec<(&str, ReplicaState)>) -> Step {
        let map: ReplicaMap = replicas
            .into_iter()
            .map(|(rid, s)| (rid.to_string(), s))
            .collect();
        Step::new(id, map)
    }

    fn violation() -> Violation {
        Violation {
            kind: "safety".into(),
            law: "coupling".into(),
            detail: String::new(),
            framework_ref: String::new(),
            bug_class: None,
        }
    }

    #[test]
    fn first_step_reports_certificates_only() {
        let mut first = step_of(0, vec![("R1", replica(1, &[(1, "X", 1)]))]);
        first
            .certificates
            .push(Certificate::new(CertificateType::Authority, "R1", "elected"));
        let diff = compute_step_diff(None, &first);
        assert_eq!(diff.certs_issued.len(), 1);
        assert!(diff.is_quiet());
        assert!(!diff.violation_appeared);
    }

    #[test]
    fn overwritten_entry_is_removed_and_added() {
        let prev = step_of(0, vec![("R1", replica(1, &[(1, "X", 1)]))]);
        let mut next = replica(2, &[(1, "Y", 2)]);
        next.leader = true;
        let curr = step_of(1, vec![("R1", next)]);

        let diff = compute_step_diff(Some(&prev), &curr);
        assert_eq!(diff.entries_added.len(), 1);
        assert_eq!(diff.entries_added[0].entry.value, "Y");
        assert_eq!(diff.entries_removed.len(), 1);
        assert_eq!(diff.entries_removed[0].entry.value, "X");
        assert_eq!(diff.epoch_changed[0].old, 1);
        assert_eq!(diff.epoch_changed[0].new, 2);
        assert_eq!(diff.role_changed[0].new, Role::Leader);
        assert!(diff.boundaries_changed.is_empty(), "E stays at 1");
    }

    #[test]
    fn boundary_and_flag_transitions() {
        let prev = step_of(0, vec![("R1", replica(1, &[])), ("R2", replica(1, &[]))]);
        let mut crashed = replica(1, &[(1, "X", 1)]);
        crashed.crashed = true;
        let curr = step_of(1, vec![("R1", crashed), ("R3", replica(1, &[]))]);

        let diff = compute_step_diff(Some(&prev), &curr);
        assert_eq!(diff.boundaries_changed.len(), 1);
        assert_eq!(diff.boundaries_changed[0].boundary, BoundaryKey::E);
        assert_eq!(diff.flags_changed.len(), 1);
        assert_eq!(diff.flags_changed[0].flag, ReplicaFlag::Crashed);
        assert!(diff.flags_changed[0].new);
        assert!(diff.boundaries_changed.iter().all(|c| c.replica == "R1"));
    }

    #[test]
    fn violation_appears_and_resolves() {
        let quiet = step_of(0, vec![("R1", replica(1, &[]))]);
        let mut broken = quiet.clone();
        broken.id = 1;
        broken.violation = Some(violation());

        assert!(compute_step_diff(Some(&quiet), &broken).violation_appeared);
        let still = compute_step_diff(Some(&broken), &broken);
        assert!(!still.violation_appeared && !still.violation_resolved);
        assert!(compute_step_diff(Some(&broken), &quiet).violation_resolved);
        assert!(compute_step_diff(None, &broken).violation_appeared);
    }

    #[test]
    fn step_diff_checks_range() {
        let steps = vec![
            step_of(0, vec![("R1", replica(1, &[]))]),
            step_of(1, vec![("R1", replica(1, &[(1, "X", 1)]))]),
        ];
        assert!(step_diff(2, &steps).is_none());
        assert_eq!(step_diff(1, &steps).unwrap().entries_added.len(), 1);
        assert!(step_diff(0, &steps).unwrap().is_quiet());
    }
}
