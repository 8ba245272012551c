pub mod auth;
pub mod errors;
pub mod models;
pub mod prompt;
pub mod providers;
pub mod routing;
pub mod store;
