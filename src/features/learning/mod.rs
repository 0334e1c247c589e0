pub mod activity;
pub mod error_conversions;
pub mod error_responses;
pub mod planner;
pub mod service;
pub mod statistics;

pub use activity::ActivityTracker;
pub use planner::SessionPlanner;
pub use service::LearningService;
pub use statistics::StatisticsReporter;
