/// The main error type for entitlement lookups
#[derive(Debug, thiserror::Error)]
pub enum EntitlementError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[cfg(feature = "seaorm")]
    #[error("Database error: {0}")]
    Database(String),
}

impl EntitlementError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the bare message without the category prefix.
    ///
    /// This is what ends up in `{ "error": "..." }` bodies, so a missing
    /// tenant reads "Company not found" rather than "Not found: Company not found".
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Forbidden(msg)
            | Self::Internal(msg) => msg.clone(),
            Self::Anyhow(err) => err.to_string(),
            #[cfg(feature = "seaorm")]
            Self::Database(msg) => msg.clone(),
        }
    }

    /// Whether the caller caused this error (as opposed to the backend).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::BadRequest(_) | Self::Forbidden(_)
        )
    }

    /// Returns a message safe to show to end users.
    ///
    /// Server-side failures are collapsed to a generic message; the detail
    /// is only written to the logs.
    pub fn safe_message(&self) -> String {
        if self.is_client_error() {
            self.message()
        } else {
            "Internal server error".to_string()
        }
    }
}

/// Result type alias for entitlement operations
pub type Result<T> = std::result::Result<T, EntitlementError>;

impl From<serde_json::Error> for EntitlementError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            EntitlementError::BadRequest(format!("JSON error: {}", err))
        } else {
            EntitlementError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

#[cfg(feature = "seaorm")]
impl From<sea_orm::DbErr> for EntitlementError {
    fn from(err: sea_orm::DbErr) -> Self {
        EntitlementError::Database(err.to_string())
    }
}
