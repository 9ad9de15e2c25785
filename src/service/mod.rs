pub mod aggregation;
pub mod bonus;
pub mod eligibility;
pub mod export;
pub mod report;
pub mod window;
