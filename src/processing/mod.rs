pub mod insights;
pub mod statistics;
