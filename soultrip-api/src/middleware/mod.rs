pub mod auth;

pub use auth::{identity_middleware, issue_token, Claims, Viewer};
