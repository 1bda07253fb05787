pub mod upload;

pub use upload::UploadScoresCommand;
