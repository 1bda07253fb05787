pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{ResolveComplaintCommand, SubmitComplaintCommand};
pub use queries::ListComplaintsResponse;

pub use routes::complaint_routes;
