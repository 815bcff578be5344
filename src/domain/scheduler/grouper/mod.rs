pub mod beamforming;
pub mod grouper_trait;
pub mod grouper_type;
pub mod grouping;
pub mod heuristics;
pub mod single_grouper;
pub mod tree_based_grouper;
