use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

/// Derive a donation's external identity from its receipt time and donor
/// email. Processors that never supplied an id (and locally entered
/// donations) get a stable, human-traceable key this way, which is what
/// dedups replayed callbacks.
pub fn derive_domain_id(time_received: DateTime<Utc>, donor_email: &str) -> String {
    format!("{}{}", time_received.timestamp(), donor_email)
}

/// Random external identity for donations created ahead of a processor
/// callback, embedded in the return payload so the callback can find its
/// row.
pub fn random_domain_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// An external id must be non-empty, at most 160 characters, and free of
/// whitespace. Anything else cannot be trusted as a dedup key.
pub fn is_well_formed_domain_id(domain_id: &str) -> bool {
    let id_regex = Regex::new(r"^\S{1,160}$").unwrap();
    id_regex.is_match(domain_id)
}
