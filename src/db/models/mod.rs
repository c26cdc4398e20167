pub mod patch;
pub mod person;
pub mod segment;

pub use patch::{FlagChange, FlagGroup, SegmentPatch};
pub use person::Person;
pub use segment::{SegmentKind, SegmentRecord, TravelSegment};
