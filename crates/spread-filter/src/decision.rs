//! Admit / reject decision.

use std::fmt;

use crate::census::PlacementSnapshot;

/// Outcome of one evaluation. Produced fresh per call, never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Reject {
        required_hosts: u32,
        observed_spread: u32,
    },
    /// The filter could not reach a trustworthy decision.
    Error(String),
}

impl Verdict {
    pub fn is_admit(&self) -> bool {
        matches!(self, Verdict::Admit)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Admit => f.write_str("admit"),
            Verdict::Reject { required_hosts, .. } => write!(
                f,
                "must schedule across at least {required_hosts} distinct nodes"
            ),
            Verdict::Error(cause) => f.write_str(cause),
        }
    }
}

/// Distinct nodes the controller would span after placing the pod on
/// `candidate`. The candidate is not double-counted when it already hosts
/// a sibling.
pub fn effective_spread(snapshot: &PlacementSnapshot, candidate: &str) -> u32 {
    let spread = u32::try_from(snapshot.spread()).unwrap_or(u32::MAX);
    if snapshot.hosts(candidate) {
        spread
    } else {
        spread.saturating_add(1)
    }
}

pub fn decide(required_hosts: u32, snapshot: &PlacementSnapshot, candidate: &str) -> Verdict {
    let observed_spread = effective_spread(snapshot, candidate);
    if observed_spread < required_hosts {
        Verdict::Reject {
            required_hosts,
            observed_spread,
        }
    } else {
        Verdict::Admit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_adds_one() {
        let snapshot = PlacementSnapshot::from_nodes(["n1"]);
        assert_eq!(effective_spread(&snapshot, "n2"), 2);
    }

    #[test]
    fn occupied_node_is_not_double_counted() {
        let snapshot = PlacementSnapshot::from_nodes(["n1", "n2"]);
        assert_eq!(effective_spread(&snapshot, "n1"), 2);
    }

    #[test]
    fn empty_snapshot_counts_candidate() {
        assert_eq!(effective_spread(&PlacementSnapshot::default(), "n1"), 1);
    }

    #[test]
    fn admits_when_spread_meets_requirement() {
        let snapshot = PlacementSnapshot::from_nodes(["n1"]);
        assert_eq!(decide(2, &snapshot, "n2"), Verdict::Admit);
    }

    #[test]
    fn rejects_when_spread_falls_short() {
        let snapshot = PlacementSnapshot::from_nodes(["n1"]);
        let verdict = decide(2, &snapshot, "n1");
        assert_eq!(
            verdict,
            Verdict::Reject {
                required_hosts: 2,
                observed_spread: 1
            }
        );
        assert_eq!(
            verdict.to_string(),
            "must schedule across at least 2 distinct nodes"
        );
    }

    #[test]
    fn verdict_follows_the_comparison_for_all_snapshots() {
        let all_nodes = ["n1", "n2", "n3", "n4"];
        for occupied in 0..=all_nodes.len() {
            let snapshot = PlacementSnapshot::from_nodes(all_nodes[..occupied].iter().copied());
            for candidate in ["n1", "n4", "n9"] {
                for required in 1..=5 {
                    let spread = effective_spread(&snapshot, candidate);
                    let verdict = decide(required, &snapshot, candidate);
                    if spread >= required {
                        assert_eq!(verdict, Verdict::Admit);
                    } else {
                        assert!(matches!(
                            verdict,
                            Verdict::Reject { required_hosts, .. } if required_hosts == required
                        ));
                    }
                }
            }
        }
    }

    #[test]
    fn decision_is_idempotent() {
        let snapshot = PlacementSnapshot::from_nodes(["n1", "n2"]);
        let first = decide(3, &snapshot, "n2");
        for _ in 0..5 {
            assert_eq!(decide(3, &snapshot, "n2"), first);
        }
    }
}
