pub mod env;
pub mod guard;
pub mod hooks;
pub mod roles;
