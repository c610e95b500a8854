pub mod evaluator;
pub mod planner;

pub use evaluator::*;
pub use planner::*;
