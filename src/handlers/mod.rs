pub mod payments;
pub mod payments_summary;
pub mod purge;
