pub mod config;
pub mod grouping;
pub mod identity;
pub mod photos;
pub mod reconcile;
pub mod stats;
pub mod visibility;

pub use config::RosterConfig;
pub use grouping::group_by_flight;
pub use identity::{canonicalize_id, candidate_keys, key_from_name, slugify};
pub use reconcile::{reconcile, reconcile_with, Roster};
pub use stats::{roster_stats, RosterStats};
pub use visibility::filter_departures_for_display;
