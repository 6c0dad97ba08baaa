/// Errors surfaced to the weather screen.
///
/// None of these are fatal: each one ends up as a transient notice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClimaError {
    #[error("Location permission denied")]
    PermissionDenied,

    /// Network and server failures are not told apart.
    #[error("Weather fetch failed: {0}")]
    FetchFailed(String),

    #[error("No location has been received yet")]
    NoLocation,
}

impl ClimaError {
    pub fn fetch_failed(err: &anyhow::Error) -> Self {
        ClimaError::FetchFailed(format!("{err:#}"))
    }
}
