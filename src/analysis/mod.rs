pub mod aggregation;
pub mod correlation;
pub mod nighttime;
pub mod outliers;
pub mod quality;
pub mod remediation;
pub mod stats;
pub mod summary;
