//! Session generation and exemption.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crewdesk_auth::Capability;
use crewdesk_core::{AssignmentId, DomainError, DomainResult, ExemptionId, SessionId, Username};

use crate::assignment::Assignment;
use crate::exemption::Exemption;
use crate::job::Job;
use crate::session::{CleanupSession, latest_session};

/// A freshly generated session with its bulk-created assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSession {
    pub session: CleanupSession,
    pub assignments: Vec<Assignment>,
}

/// How many assignments each user has ever been issued, across all sessions.
///
/// The fairness key: users absent from history count as zero and therefore
/// sort to the front of the rotation.
pub fn rotation_counts(historical: &[Assignment]) -> HashMap<Username, u64> {
    let mut counts: HashMap<Username, u64> = HashMap::new();
    for assignment in historical {
        *counts.entry(assignment.assigned_to.clone()).or_insert(0) += 1;
    }
    counts
}

/// Generate a cleanup session: fairness-sorted round-robin over active jobs.
///
/// The selection is deduplicated (first occurrence wins) and stable-sorted
/// ascending by historical rotation count, so users who have done the fewest
/// cleanups cycle first and ties keep their input order. Job `i` then goes to
/// `sorted[i % sorted.len()]`. An empty job list yields a session with zero
/// assignments.
pub fn generate_session(
    caps: &Capability,
    selected: &[Username],
    active_jobs: &[Job],
    historical: &[Assignment],
    now: DateTime<Utc>,
) -> DomainResult<GeneratedSession> {
    if !caps.has_lead_authority {
        return Err(DomainError::Unauthorized);
    }

    let mut rotation: Vec<Username> = Vec::with_capacity(selected.len());
    for username in selected {
        if !rotation.contains(username) {
            rotation.push(username.clone());
        }
    }
    if rotation.is_empty() {
        return Err(DomainError::validation(
            "cannot generate a cleanup session with no users selected",
        ));
    }

    let counts = rotation_counts(historical);
    // Vec::sort_by_key is stable: equal counts keep their input order.
    rotation.sort_by_key(|u| counts.get(u).copied().unwrap_or(0));

    let session = CleanupSession {
        id: SessionId::new(),
        generated_by: caps.username.clone(),
        created_at: now,
    };

    let assignments = active_jobs
        .iter()
        .filter(|job| job.active)
        .enumerate()
        .map(|(i, job)| {
            Assignment::issued(session.id, job.id, rotation[i % rotation.len()].clone())
        })
        .collect();

    Ok(GeneratedSession { session, assignments })
}

/// An exemption plus the assignments it displaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExemptionOutcome {
    pub exemption: Exemption,
    /// Every assignment of the exempted user in the session, regardless of
    /// status: exemption discards that session's history for the user.
    pub removed: Vec<AssignmentId>,
}

/// Exempt a user from the current session.
///
/// Only the *current* session (greatest `created_at`) accepts exemptions; the
/// caller deletes the returned assignment ids in one batch alongside inserting
/// the exemption record.
pub fn exempt_user(
    caps: &Capability,
    sessions: &[CleanupSession],
    assignments: &[Assignment],
    session_id: SessionId,
    username: &Username,
    now: DateTime<Utc>,
) -> DomainResult<ExemptionOutcome> {
    if !caps.has_lead_authority {
        return Err(DomainError::Unauthorized);
    }

    let current = latest_session(sessions)
        .ok_or_else(|| DomainError::validation("no cleanup session exists to exempt from"))?;
    if current.id != session_id {
        return Err(DomainError::invariant(
            "exemptions only apply to the current session",
        ));
    }

    let removed = assignments
        .iter()
        .filter(|a| a.session_id == session_id && &a.assigned_to == username)
        .map(|a| a.id)
        .collect();

    Ok(ExemptionOutcome {
        exemption: Exemption {
            id: ExemptionId::new(),
            session_id,
            username: username.clone(),
            exempted_by: caps.username.clone(),
            created_at: now,
        },
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::AssignmentStatus;
    use proptest::prelude::*;

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    fn lead() -> Capability {
        Capability::lead(user("lena"))
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn history_for(name: &str, count: usize) -> Vec<Assignment> {
        (0..count)
            .map(|_| Assignment::issued(SessionId::new(), crewdesk_core::JobId::new(), user(name)))
            .collect()
    }

    #[test]
    fn fewest_rotations_cycle_first() {
        // jobs = [Sweep, Trash, Windows]; selected = [Alice, Bob];
        // counts = {Alice: 2, Bob: 0} → order [Bob, Alice]
        // → Sweep→Bob, Trash→Alice, Windows→Bob.
        let jobs = vec![Job::new("Sweep"), Job::new("Trash"), Job::new("Windows")];
        let historical = history_for("alice", 2);

        let generated = generate_session(
            &lead(),
            &[user("alice"), user("bob")],
            &jobs,
            &historical,
            now(),
        )
        .unwrap();

        let assignees: Vec<_> = generated
            .assignments
            .iter()
            .map(|a| a.assigned_to.as_str())
            .collect();
        assert_eq!(assignees, vec!["bob", "alice", "bob"]);

        let job_ids: Vec<_> = generated.assignments.iter().map(|a| a.job_id).collect();
        assert_eq!(job_ids, jobs.iter().map(|j| j.id).collect::<Vec<_>>());
    }

    #[test]
    fn every_assignment_starts_assigned_in_the_new_session() {
        let jobs = vec![Job::new("Sweep"), Job::new("Trash")];
        let generated =
            generate_session(&lead(), &[user("alice")], &jobs, &[], now()).unwrap();

        assert_eq!(generated.assignments.len(), 2);
        for a in &generated.assignments {
            assert_eq!(a.session_id, generated.session.id);
            assert_eq!(a.status, AssignmentStatus::Assigned);
            assert_eq!(a.points_awarded, 0);
        }
        assert_eq!(generated.session.generated_by, user("lena"));
    }

    #[test]
    fn empty_job_list_yields_session_with_no_assignments() {
        let generated = generate_session(&lead(), &[user("alice")], &[], &[], now()).unwrap();
        assert!(generated.assignments.is_empty());
    }

    #[test]
    fn inactive_jobs_are_skipped() {
        let mut retired = Job::new("Windows");
        retired.active = false;
        let jobs = vec![Job::new("Sweep"), retired, Job::new("Trash")];

        let generated =
            generate_session(&lead(), &[user("alice")], &jobs, &[], now()).unwrap();
        assert_eq!(generated.assignments.len(), 2);
    }

    #[test]
    fn empty_selection_is_a_validation_error() {
        let err = generate_session(&lead(), &[], &[Job::new("Sweep")], &[], now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_lead_cannot_generate() {
        let err = generate_session(
            &Capability::member(user("bob")),
            &[user("bob")],
            &[Job::new("Sweep")],
            &[],
            now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);
    }

    #[test]
    fn duplicate_selection_entries_collapse() {
        let jobs = vec![Job::new("Sweep"), Job::new("Trash")];
        let generated = generate_session(
            &lead(),
            &[user("alice"), user("alice")],
            &jobs,
            &[],
            now(),
        )
        .unwrap();
        // One distinct user → both jobs land on them.
        assert!(generated
            .assignments
            .iter()
            .all(|a| a.assigned_to == user("alice")));
    }

    #[test]
    fn ties_preserve_selection_order() {
        let jobs = vec![Job::new("Sweep"), Job::new("Trash"), Job::new("Windows")];
        let generated = generate_session(
            &lead(),
            &[user("carol"), user("alice"), user("bob")],
            &jobs,
            &[],
            now(),
        )
        .unwrap();

        let assignees: Vec<_> = generated
            .assignments
            .iter()
            .map(|a| a.assigned_to.as_str())
            .collect();
        assert_eq!(assignees, vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn generation_mapping_is_deterministic() {
        let jobs = vec![Job::new("Sweep"), Job::new("Trash"), Job::new("Windows")];
        let historical = history_for("bob", 1);
        let selected = [user("alice"), user("bob"), user("carol")];

        let first = generate_session(&lead(), &selected, &jobs, &historical, now()).unwrap();
        let second = generate_session(&lead(), &selected, &jobs, &historical, now()).unwrap();

        let mapping = |g: &GeneratedSession| {
            g.assignments
                .iter()
                .map(|a| (a.job_id, a.assigned_to.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(mapping(&first), mapping(&second));
    }

    #[test]
    fn exemption_removes_every_assignment_of_the_user() {
        let jobs = vec![Job::new("Sweep"), Job::new("Trash"), Job::new("Windows")];
        let generated = generate_session(
            &lead(),
            &[user("alice"), user("bob")],
            &jobs,
            &history_for("alice", 2),
            now(),
        )
        .unwrap();
        let sessions = vec![generated.session.clone()];

        let outcome = exempt_user(
            &lead(),
            &sessions,
            &generated.assignments,
            generated.session.id,
            &user("bob"),
            now(),
        )
        .unwrap();

        // Bob held Sweep and Windows in this rotation.
        assert_eq!(outcome.removed.len(), 2);
        assert_eq!(outcome.exemption.username, user("bob"));
        assert_eq!(outcome.exemption.exempted_by, user("lena"));

        let survivors: Vec<_> = generated
            .assignments
            .iter()
            .filter(|a| !outcome.removed.contains(&a.id))
            .collect();
        assert!(survivors.iter().all(|a| a.assigned_to != user("bob")));
    }

    #[test]
    fn exemption_removes_confirmed_assignments_too() {
        let generated = generate_session(
            &lead(),
            &[user("alice")],
            &[Job::new("Sweep")],
            &[],
            now(),
        )
        .unwrap();
        let confirmed = generated.assignments[0]
            .mark_complete(&user("alice"))
            .unwrap()
            .confirm(&lead(), now())
            .unwrap();
        let sessions = vec![generated.session.clone()];

        let outcome = exempt_user(
            &lead(),
            &sessions,
            &[confirmed.clone()],
            generated.session.id,
            &user("alice"),
            now(),
        )
        .unwrap();
        assert_eq!(outcome.removed, vec![confirmed.id]);
    }

    #[test]
    fn exemption_targets_only_the_current_session() {
        let older = generate_session(&lead(), &[user("alice")], &[Job::new("Sweep")], &[], now())
            .unwrap();
        let newer = generate_session(
            &lead(),
            &[user("alice")],
            &[Job::new("Sweep")],
            &[],
            now() + chrono::Duration::seconds(60),
        )
        .unwrap();
        let sessions = vec![older.session.clone(), newer.session.clone()];

        let err = exempt_user(
            &lead(),
            &sessions,
            &older.assignments,
            older.session.id,
            &user("alice"),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn exemption_without_any_session_is_a_validation_error() {
        let err = exempt_user(&lead(), &[], &[], SessionId::new(), &user("alice"), now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_lead_cannot_exempt() {
        let generated =
            generate_session(&lead(), &[user("alice")], &[Job::new("Sweep")], &[], now()).unwrap();
        let sessions = vec![generated.session.clone()];
        let err = exempt_user(
            &Capability::member(user("bob")),
            &sessions,
            &generated.assignments,
            generated.session.id,
            &user("alice"),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: N active jobs always produce exactly N assignments, each
        /// job used exactly once and every assignee drawn from the selection.
        #[test]
        fn every_active_job_is_assigned_exactly_once(
            job_count in 0usize..20,
            user_count in 1usize..8,
        ) {
            let jobs: Vec<Job> = (0..job_count).map(|i| Job::new(format!("job-{i}"))).collect();
            let selected: Vec<Username> =
                (0..user_count).map(|i| user(&format!("user-{i}"))).collect();

            let generated =
                generate_session(&lead(), &selected, &jobs, &[], now()).unwrap();

            prop_assert_eq!(generated.assignments.len(), job_count);
            let mut seen_jobs: Vec<_> = generated.assignments.iter().map(|a| a.job_id).collect();
            seen_jobs.sort_by_key(|id| *id.as_uuid());
            seen_jobs.dedup();
            prop_assert_eq!(seen_jobs.len(), job_count);
            for a in &generated.assignments {
                prop_assert!(selected.contains(&a.assigned_to));
            }
        }

        /// Property: round-robin splits N jobs over k users into floor(N/k) or
        /// ceil(N/k) assignments per user, and the lowest historical count
        /// leads the cycle.
        #[test]
        fn round_robin_split_is_balanced(
            job_count in 1usize..30,
            user_count in 1usize..6,
            head_start in 1usize..5,
        ) {
            let jobs: Vec<Job> = (0..job_count).map(|i| Job::new(format!("job-{i}"))).collect();
            let selected: Vec<Username> =
                (0..user_count).map(|i| user(&format!("user-{i}"))).collect();
            // Give everyone but the last user some history, so the last user
            // has the lowest rotation count.
            let mut historical = Vec::new();
            for u in &selected[..user_count - 1] {
                for _ in 0..head_start {
                    historical.push(Assignment::issued(
                        SessionId::new(),
                        crewdesk_core::JobId::new(),
                        u.clone(),
                    ));
                }
            }

            let generated =
                generate_session(&lead(), &selected, &jobs, &historical, now()).unwrap();

            let mut per_user: HashMap<&Username, usize> = HashMap::new();
            for a in &generated.assignments {
                *per_user.entry(&a.assigned_to).or_insert(0) += 1;
            }
            let floor = job_count / user_count;
            let ceil = job_count.div_ceil(user_count);
            for count in per_user.values() {
                prop_assert!(*count == floor || *count == ceil);
            }
            // The fresh user heads the cycle and gets the first job.
            prop_assert_eq!(
                &generated.assignments[0].assigned_to,
                &selected[user_count - 1]
            );
        }
    }
}
