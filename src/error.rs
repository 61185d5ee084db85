#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid or missing configuration. Always fatal, raised before any network call.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    /// The ledger could not be read or durably written.
    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Export error: {0}")]
    Export(String),
}
