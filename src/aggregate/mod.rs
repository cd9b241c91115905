mod join;
mod summary;

pub use join::{sjoin, JoinOptions, JoinPredicate, SpatialJoin};
pub use summary::{extremes, summarize, Extremes, GroupSummary};
