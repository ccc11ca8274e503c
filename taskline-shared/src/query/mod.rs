/// Query building blocks shared by every list endpoint
///
/// - [`page::PageParams`] / [`page::Page`]: offset pagination with
///   whitelisted sort fields
/// - [`filter::DateRange`]: optional date-range bounds for filters

pub mod filter;
pub mod page;

pub use filter::DateRange;
pub use page::{Page, PageParams, SortDirection};

/// Error type for list-query construction and execution
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The requested sort field is not in the entity's whitelist
    #[error("unknown sort field: {0}")]
    UnknownSortField(String),

    /// The sort direction was neither `asc` nor `desc`
    #[error("invalid sort direction: {0}")]
    InvalidDirection(String),

    /// Underlying database failure
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
