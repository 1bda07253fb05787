pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::UploadScoresCommand;
pub use queries::{ListScoresQuery, ListScoresResponse};

pub use routes::{student_routes, teacher_routes};
