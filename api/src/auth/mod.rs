//! Authentication
//!
//! Bearer-token sessions issued by `POST /auth/login`.

pub mod session;

pub use session::{auth_middleware, bearer_token};
