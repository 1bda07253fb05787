pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    RegisterCommand, RegisterError, UploadRosterCommand,
};
pub use queries::{VerifyCredentialsError, VerifyCredentialsQuery};

pub use routes::{account_routes, admin_routes};
