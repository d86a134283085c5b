pub mod auth;
pub mod catchers;
pub mod cors;
pub mod error;
pub mod processor;
pub mod queries;
pub mod routes;
pub mod utils;
pub use shared::{models::*, validation::*, error::*};
