pub mod datetime;
pub mod normalizer;
pub mod parser;
pub mod value;
