pub mod batch;
pub mod builtwith;
pub mod matcher;
pub mod model;
pub mod report;

pub use batch::{BatchOptions, MatchCallback, run_batch};
pub use model::{BatchStats, TechnologyDetails};
