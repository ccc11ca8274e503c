/// Database models
///
/// Each entity lives in its own module together with its filter struct
/// and CRUD operations. All list queries go through the shared
/// pagination and sort-whitelist machinery in [`crate::query`].

pub mod attachment;
pub mod comment;
pub mod project;
pub mod task;
pub mod time_log;
pub mod user;
