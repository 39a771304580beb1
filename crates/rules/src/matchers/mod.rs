//! The three matching strategies: temporal burst detection, weighted
//! dominant-family matching, and categorical tag routing.
//!
//! Burst detection is the only stateful matcher; the other two are pure
//! functions from (event, rules) to candidate matches. None of them
//! ever raises: malformed input degrades to "no match".

pub mod burst;
pub mod dominant;
pub mod tag_route;

pub use burst::{BurstDetector, BurstFire};
pub use dominant::DominantMatch;
pub use tag_route::TagDecision;
