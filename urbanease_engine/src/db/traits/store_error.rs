use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("Could not allocate a unique order number after {0} attempts")]
    OrderNumberExhausted(usize),
    #[error("Stored data could not be interpreted. {0}")]
    DataIntegrity(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
