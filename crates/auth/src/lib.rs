//! `crewdesk-auth` — identity boundary: role tags, profiles, capabilities.
//!
//! This crate is intentionally decoupled from transport and storage. The store's
//! access-control layer remains the enforcement backstop; everything here is the
//! client-side view of "who is acting and what may they do".

pub mod capability;
pub mod profile;
pub mod tags;

pub use capability::Capability;
pub use profile::Profile;
pub use tags::RoleTag;
