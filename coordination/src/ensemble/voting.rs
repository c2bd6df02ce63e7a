//! Ballot arithmetic for the jury.
//!
//! A group passes when its yes-votes reach `ceil(K / 2)`. For odd K this is
//! a strict majority; for even K a tie passes.

use serde::{Deserialize, Serialize};

/// Minimum yes-votes for a group to pass with `judges` ballots.
pub fn majority_threshold(judges: usize) -> usize {
    judges.div_ceil(2)
}

/// Votes for one group across all ballots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTally {
    pub index: usize,
    pub yes: usize,
    pub total: usize,
}

impl GroupTally {
    pub fn passes(&self) -> bool {
        self.total > 0 && self.yes >= majority_threshold(self.total)
    }
}

/// Tally `ballots` (one `Vec<bool>` per judge, each `group_count` long)
/// per group index.
pub fn tally(ballots: &[Vec<bool>], group_count: usize) -> Vec<GroupTally> {
    (0..group_count)
        .map(|index| {
            let yes = ballots
                .iter()
                .filter(|ballot| ballot.get(index).copied().unwrap_or(false))
                .count();
            GroupTally {
                index,
                yes,
                total: ballots.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_values() {
        assert_eq!(majority_threshold(1), 1);
        assert_eq!(majority_threshold(2), 1);
        assert_eq!(majority_threshold(3), 2);
        assert_eq!(majority_threshold(4), 2);
        assert_eq!(majority_threshold(5), 3);
    }

    #[test]
    fn test_three_judges_boundary_cases() {
        // yes counts per group: 3, 2, 1, 0
        let ballots = vec![
            vec![true, true, true, false],
            vec![true, true, false, false],
            vec![true, false, false, false],
        ];
        let passed: Vec<bool> = tally(&ballots, 4).iter().map(GroupTally::passes).collect();
        assert_eq!(passed, vec![true, true, false, false]);
    }

    #[test]
    fn test_even_jury_tie_passes() {
        let ballots = vec![vec![true], vec![false]];
        assert!(tally(&ballots, 1)[0].passes());
    }

    #[test]
    fn test_no_ballots_never_passes() {
        let tallies = tally(&[], 2);
        assert_eq!(tallies.len(), 2);
        assert!(tallies.iter().all(|t| !t.passes()));
    }
}
