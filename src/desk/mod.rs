//! Mutation layer: intake of new people, segment patches and the controller
//! that keeps local roster state in step with storage.

pub mod controller;
pub mod intake;
pub mod patch;

pub use controller::{DeskController, MatchOutcome, MatchedBy, PhotoSync, RefreshOutcome};
pub use intake::NewIndividual;
pub use patch::apply_patch;
