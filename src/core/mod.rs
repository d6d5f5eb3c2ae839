pub mod account;
pub mod asset;
pub mod error;
pub mod units;
