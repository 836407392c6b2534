//! Authentication system
//!
//! Holds the single admin identity and validates HTTP Basic credentials
//! against it. No session state is kept between requests.

pub mod credentials;
pub mod validator;

pub use credentials::AdminCredentials;
pub use validator::{require_basic_auth, validate_credentials};
