//! Ballots and vote arithmetic
//!
//! Votes are blind: ballots are collected in parallel and only exposed to
//! the event log after every ballot is in. The pass decision always uses the
//! full council size as denominator, independent of how many ballots were
//! actually returned.

use serde::{Deserialize, Serialize};

use crate::phase::entities::Governance;

/// One of the three legal ballot positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BallotChoice {
    Yes,
    No,
    Abstain,
}

impl BallotChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            BallotChoice::Yes => "YES",
            BallotChoice::No => "NO",
            BallotChoice::Abstain => "ABSTAIN",
        }
    }
}

impl std::fmt::Display for BallotChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One vote from one member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ballot {
    /// Member id of the voter
    pub voter: String,
    pub choice: BallotChoice,
    pub rationale: String,
}

impl Ballot {
    pub fn new(voter: impl Into<String>, choice: BallotChoice, rationale: impl Into<String>) -> Self {
        Self {
            voter: voter.into(),
            choice,
            rationale: rationale.into(),
        }
    }
}

/// Result of tallying one voting round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyOutcome {
    pub passed: bool,
    pub yes_votes: usize,
    /// NO count, or `council_size - yes_votes` when abstentions count as NO
    pub no_votes_effective: usize,
    pub total_council_size: usize,
    pub required_yes: usize,
    pub majority_threshold: f64,
}

/// Compute pass/fail for a set of ballots under the phase's governance.
///
/// The denominator is `council_size`, never the number of ballots returned;
/// a member whose ballot is missing simply contributes no YES. At the exact
/// 0.5 threshold the requirement is a strict majority of the full council,
/// `floor(n/2) + 1`; any other threshold requires `ceil(n * threshold)`.
pub fn tally(ballots: &[Ballot], governance: &Governance, council_size: usize) -> TallyOutcome {
    let yes_votes = ballots
        .iter()
        .filter(|b| b.choice == BallotChoice::Yes)
        .count();

    let no_votes_effective = if governance.abstain_counts_as_no {
        council_size - yes_votes
    } else {
        ballots
            .iter()
            .filter(|b| b.choice == BallotChoice::No)
            .count()
    };

    let threshold = governance.majority_threshold;
    let required_yes = if (threshold - 0.5).abs() < f64::EPSILON {
        council_size / 2 + 1
    } else {
        (council_size as f64 * threshold).ceil() as usize
    };

    TallyOutcome {
        passed: yes_votes >= required_yes,
        yes_votes,
        no_votes_effective,
        total_council_size: council_size,
        required_yes,
        majority_threshold: threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governance(threshold: f64, abstain_counts_as_no: bool) -> Governance {
        Governance {
            require_seconding: true,
            majority_threshold: threshold,
            abstain_counts_as_no,
        }
    }

    fn ballots(choices: &[BallotChoice]) -> Vec<Ballot> {
        choices
            .iter()
            .enumerate()
            .map(|(i, c)| Ballot::new(format!("m{i}"), *c, "because"))
            .collect()
    }

    #[test]
    fn test_simple_majority_of_three() {
        let outcome = tally(
            &ballots(&[BallotChoice::Yes, BallotChoice::Yes, BallotChoice::No]),
            &governance(0.5, true),
            3,
        );
        assert!(outcome.passed);
        assert_eq!(outcome.yes_votes, 2);
        assert_eq!(outcome.required_yes, 2);
        assert_eq!(outcome.no_votes_effective, 1);
    }

    #[test]
    fn test_majority_threshold_uses_strict_majority() {
        // floor(5/2) + 1 = 3
        let outcome = tally(
            &ballots(&[BallotChoice::Yes, BallotChoice::Yes]),
            &governance(0.5, true),
            5,
        );
        assert_eq!(outcome.required_yes, 3);
        assert!(!outcome.passed);
    }

    #[test]
    fn test_non_half_threshold_uses_ceiling() {
        // ceil(5 * 0.6) = 3
        let outcome = tally(
            &ballots(&[BallotChoice::Yes, BallotChoice::Yes, BallotChoice::Yes]),
            &governance(0.6, true),
            5,
        );
        assert_eq!(outcome.required_yes, 3);
        assert!(outcome.passed);

        // ceil(3 * 1.0) = 3: unanimity
        let outcome = tally(
            &ballots(&[BallotChoice::Yes, BallotChoice::Yes, BallotChoice::No]),
            &governance(1.0, true),
            3,
        );
        assert_eq!(outcome.required_yes, 3);
        assert!(!outcome.passed);
    }

    #[test]
    fn test_denominator_is_council_size_not_returned_ballots() {
        // Only one ballot returned out of five seats; passing still needs 3.
        let outcome = tally(&ballots(&[BallotChoice::Yes]), &governance(0.5, true), 5);
        assert_eq!(outcome.total_council_size, 5);
        assert_eq!(outcome.required_yes, 3);
        assert!(!outcome.passed);
        assert_eq!(outcome.no_votes_effective, 4);
    }

    #[test]
    fn test_abstain_counts_as_no_when_configured() {
        let outcome = tally(
            &ballots(&[BallotChoice::Yes, BallotChoice::Abstain, BallotChoice::Abstain]),
            &governance(0.5, true),
            3,
        );
        assert_eq!(outcome.no_votes_effective, 2);
        assert!(!outcome.passed);
    }

    #[test]
    fn test_abstain_not_counted_when_disabled() {
        let outcome = tally(
            &ballots(&[BallotChoice::Yes, BallotChoice::Abstain, BallotChoice::No]),
            &governance(0.5, false),
            3,
        );
        assert_eq!(outcome.no_votes_effective, 1);
        // Still fails: 1 < 2 required
        assert!(!outcome.passed);
    }
}
