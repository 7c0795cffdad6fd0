//! Credential material (client secrets, bearer tokens) and the providers that supply it.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
