//! # Sources Crate
//!
//! The two read paths that feed scoring:
//!
//! - **profile**: Summarize a user's recent views and likes into a `UserProfile`
//!   (category affinity, creator affinity, duration preference, strength)
//! - **retriever**: Fetch the eligible candidate pool (published, public,
//!   not yet viewed or disliked), newest first, capped at 1000
//!
//! Both talk to the store only through `Arc<dyn ContentStore>` and are safe to
//! run concurrently for the same request.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CandidateRetriever, ProfileBuilder};
//! use data_loader::DataIndex;
//! use std::sync::Arc;
//!
//! let store = Arc::new(DataIndex::load_from_files("data/recs".as_ref())?);
//! let builder = ProfileBuilder::new(store.clone());
//! let retriever = CandidateRetriever::new(store);
//!
//! let (profile, candidates) = tokio::join!(
//!     builder.build_profile(user_id),
//!     retriever.retrieve_candidates(user_id),
//! );
//! ```

pub mod types;
pub mod profile;
pub mod retriever;

pub use types::{DurationPreference, UserProfile, LONG_DURATION_SECS, SHORT_DURATION_SECS};
pub use profile::{compute_profile_strength, ProfileBuilder, ProfileError};
pub use retriever::{CandidateRetriever, DEFAULT_CANDIDATE_CAP};
