//! Collection index, recommendation and reports over loaded documents.

pub mod collection;
pub mod lineage;
pub mod recommender;
pub mod report;

pub use collection::SpecCollection;
pub use lineage::{ChainLevel, ProvidedOutput, DEFAULT_WALK_DEPTH};
pub use recommender::{recommend, recommend_scored, Recommendation, MAX_RECOMMENDATIONS};
pub use report::{compare, quick_reference};
