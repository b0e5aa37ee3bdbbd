pub mod aggregates;
pub mod lenient;
