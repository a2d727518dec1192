//! Strategy adapters: one per external collaborator.
//!
//! Each adapter translates a collaborator response into candidates and
//! nothing more; cross-strategy logic lives in the pipeline crate.

pub mod ai_preference;
pub mod collaborative;
pub mod location;
pub mod popularity;

pub use ai_preference::AiPreferenceStrategy;
pub use collaborative::CollaborativeStrategy;
pub use location::{proximity_score, LocationStrategy};
pub use popularity::{popularity_score, PopularityStrategy};
