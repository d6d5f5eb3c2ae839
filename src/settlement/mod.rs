pub mod crowdsale;
pub mod distributor;
pub mod receipt;
pub mod transfer;
