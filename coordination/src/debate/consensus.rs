//! Cross-agent merge of ranked groups.
//!
//! Groups are identified by [`GroupKey`], so two agents proposing the same
//! four words under different labels vote for the same candidate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::puzzle::{Group, GroupKey, RankedSolution};

/// A distinct group with its support across agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub key: GroupKey,
    /// Group as first proposed (lowest agent index).
    pub group: Group,
    /// Number of agents proposing it.
    pub votes: usize,
    /// Mean of the ranks the proposers gave it.
    pub average_rank: f64,
}

#[derive(Default)]
struct Accumulator {
    group: Option<Group>,
    votes: usize,
    rank_sum: u64,
}

/// Merge rankings into one global order: votes descending, then average
/// rank ascending, then key.
pub fn merge(rankings: &[RankedSolution]) -> Vec<CandidateScore> {
    let mut by_key: HashMap<GroupKey, Accumulator> = HashMap::new();
    for ranking in rankings {
        let mut seen = Vec::new();
        for ranked in &ranking.groups {
            let key = ranked.group.key();
            if seen.contains(&key) {
                continue;
            }
            let entry = by_key.entry(key.clone()).or_default();
            entry.group.get_or_insert_with(|| ranked.group.clone());
            entry.votes += 1;
            entry.rank_sum += u64::from(ranked.rank);
            seen.push(key);
        }
    }

    let mut scores: Vec<CandidateScore> = by_key
        .into_iter()
        .filter_map(|(key, acc)| {
            let group = acc.group?;
            Some(CandidateScore {
                key,
                group,
                votes: acc.votes,
                average_rank: acc.rank_sum as f64 / acc.votes as f64,
            })
        })
        .collect();

    scores.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| a.average_rank.total_cmp(&b.average_rank))
            .then_with(|| a.key.cmp(&b.key))
    });
    scores
}
