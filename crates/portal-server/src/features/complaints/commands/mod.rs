pub mod resolve;
pub mod submit;

pub use resolve::{ResolveComplaintCommand, ResolveComplaintError};
pub use submit::{SubmitComplaintCommand, SubmitComplaintError};
