//! Leaderboard derivation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crewdesk_core::Username;

use crate::assignment::{Assignment, AssignmentStatus};

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: Username,
    /// Sum of points over confirmed assignments.
    pub points: u64,
    /// Count of all assignments ever issued, whatever their outcome.
    pub total: u64,
}

/// Aggregate all historical assignments into a leaderboard.
///
/// Single pass over the history; sorted by points descending, ties broken by
/// username ascending.
pub fn compute_leaderboard(assignments: &[Assignment]) -> Vec<LeaderboardEntry> {
    let mut totals: BTreeMap<&Username, (u64, u64)> = BTreeMap::new();
    for assignment in assignments {
        let entry = totals.entry(&assignment.assigned_to).or_insert((0, 0));
        if assignment.status == AssignmentStatus::Confirmed {
            entry.0 += u64::from(assignment.points_awarded);
        }
        entry.1 += 1;
    }

    // BTreeMap iteration is username-ascending; the stable sort by points
    // descending then leaves equal-point users in that order.
    let mut leaderboard: Vec<LeaderboardEntry> = totals
        .into_iter()
        .map(|(username, (points, total))| LeaderboardEntry {
            username: username.clone(),
            points,
            total,
        })
        .collect();
    leaderboard.sort_by(|a, b| b.points.cmp(&a.points));
    leaderboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crewdesk_auth::Capability;
    use crewdesk_core::{JobId, SessionId};
    use proptest::prelude::*;

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    fn issued_to(name: &str) -> Assignment {
        Assignment::issued(SessionId::new(), JobId::new(), user(name))
    }

    fn confirmed_for(name: &str) -> Assignment {
        issued_to(name)
            .mark_complete(&user(name))
            .unwrap()
            .confirm(&Capability::lead(user("lena")), Utc::now())
            .unwrap()
    }

    fn denied_for(name: &str) -> Assignment {
        issued_to(name)
            .mark_complete(&user(name))
            .unwrap()
            .deny(&Capability::lead(user("lena")), Utc::now())
            .unwrap()
    }

    #[test]
    fn points_count_only_confirmed_totals_count_everything() {
        let assignments = vec![
            confirmed_for("alice"),
            confirmed_for("alice"),
            denied_for("alice"),
            issued_to("bob"),
            confirmed_for("bob"),
        ];

        let board = compute_leaderboard(&assignments);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].username, user("alice"));
        assert_eq!(board[0].points, 2);
        assert_eq!(board[0].total, 3);
        assert_eq!(board[1].username, user("bob"));
        assert_eq!(board[1].points, 1);
        assert_eq!(board[1].total, 2);
    }

    #[test]
    fn equal_points_are_ordered_by_username() {
        let assignments = vec![
            confirmed_for("carol"),
            confirmed_for("alice"),
            confirmed_for("bob"),
        ];

        let names: Vec<_> = compute_leaderboard(&assignments)
            .into_iter()
            .map(|e| e.username)
            .collect();
        assert_eq!(names, vec![user("alice"), user("bob"), user("carol")]);
    }

    #[test]
    fn empty_history_yields_empty_board() {
        assert!(compute_leaderboard(&[]).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: total points on the board equal the number of confirmed
        /// assignments (each confirmation awards exactly one point), and the
        /// totals column accounts for every assignment ever issued.
        #[test]
        fn board_sums_match_the_history(
            outcomes in prop::collection::vec((0usize..4, 0usize..3), 0..40)
        ) {
            let mut assignments = Vec::new();
            for (user_idx, outcome) in outcomes {
                let name = format!("user-{user_idx}");
                assignments.push(match outcome {
                    0 => issued_to(&name),
                    1 => issued_to(&name).mark_complete(&user(&name)).unwrap(),
                    _ => confirmed_for(&name),
                });
            }

            let board = compute_leaderboard(&assignments);
            let confirmed = assignments
                .iter()
                .filter(|a| a.status == AssignmentStatus::Confirmed)
                .count() as u64;
            let points: u64 = board.iter().map(|e| e.points).sum();
            let totals: u64 = board.iter().map(|e| e.total).sum();

            prop_assert_eq!(points, confirmed);
            prop_assert_eq!(totals, assignments.len() as u64);
        }
    }
}
