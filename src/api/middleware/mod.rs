pub mod auth;
pub mod hosts;
