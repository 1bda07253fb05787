pub mod verify_credentials;

pub use verify_credentials::{authenticate, VerifyCredentialsError, VerifyCredentialsQuery};
