pub mod audit;
pub mod notify;
