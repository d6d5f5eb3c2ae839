pub mod generator;
pub mod scenario;
