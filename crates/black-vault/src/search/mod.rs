pub mod hybrid;
pub mod text_search;

pub use hybrid::{reciprocal_rank_fusion, weighted_fusion, HybridSource};
pub use text_search::TextIndex;
