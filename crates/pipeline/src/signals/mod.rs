//! The four pure ranking signals.

pub mod content;
pub mod context;
pub mod popularity;
pub mod recency;

pub use content::{duration_match, jaccard, ContentSignal};
pub use context::ContextSignal;
pub use popularity::PopularitySignal;
pub use recency::RecencySignal;
