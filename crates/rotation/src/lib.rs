//! `crewdesk-rotation` — cleanup-job fair-rotation engine.
//!
//! Maintains cleanup jobs, session generation with round-robin assignment
//! weighted by historical participation, the assignment confirmation state
//! machine, per-session exemptions, and the points leaderboard. Pure domain:
//! no IO, no clocks, no id lookups; callers pass records and timestamps in.

pub mod assignment;
pub mod engine;
pub mod exemption;
pub mod job;
pub mod leaderboard;
pub mod session;

pub use assignment::{Assignment, AssignmentStatus};
pub use engine::{ExemptionOutcome, GeneratedSession, generate_session, exempt_user, rotation_counts};
pub use exemption::Exemption;
pub use job::Job;
pub use leaderboard::{LeaderboardEntry, compute_leaderboard};
pub use session::{CleanupSession, latest_session};
