pub mod list;

pub use list::{ListScoresQuery, ListScoresResponse};
