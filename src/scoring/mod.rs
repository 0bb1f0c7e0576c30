pub mod stats;
pub mod types;
pub mod verdict;
