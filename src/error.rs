use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("{field} cannot be negative (got {value})")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("snapshot is missing its {0} component")]
    MissingComponent(&'static str),

    #[error("error breakdown requires a category map (use an empty map for none)")]
    MissingCategoryMap,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Completion service has been shut down")]
    ShutDown,

    #[error("No further completions can arrive")]
    Disconnected,

    #[error("Failed to spawn worker thread")]
    Spawn(#[from] std::io::Error),
}

pub(crate) fn non_negative(field: &'static str, value: i64) -> Result<u64, StatsError> {
    u64::try_from(value).map_err(|_| StatsError::NegativeCount { field, value })
}
