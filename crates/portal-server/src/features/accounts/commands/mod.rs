pub mod register;
pub mod upload_roster;

pub use register::{RegisterCommand, RegisterError};
pub use upload_roster::UploadRosterCommand;
