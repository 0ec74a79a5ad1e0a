pub mod lending;
pub mod underwriting;
