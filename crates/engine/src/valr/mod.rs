pub mod rest;

pub use rest::{sign_request, ValrClient};
