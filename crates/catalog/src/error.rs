/// Error type for catalog operations.
#[derive(Debug)]
pub enum CatalogError {
    /// File I/O error
    Io(String),
    /// Stored file or response body could not be decoded
    Parse(String),
    /// Network error (connect, timeout, TLS)
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// The catalog location cannot be created or written
    PersistenceUnavailable(String),
    /// No preset with this id
    NotFound(String),
}

impl CatalogError {
    /// True for failures of the remote leg that a local copy can absorb.
    pub fn is_remote(&self) -> bool {
        matches!(self, CatalogError::Network(_) | CatalogError::Http(..))
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(msg) => write!(f, "I/O error: {}", msg),
            CatalogError::Parse(msg) => write!(f, "Parse error: {}", msg),
            CatalogError::Network(msg) => write!(f, "Network error: {}", msg),
            CatalogError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            CatalogError::PersistenceUnavailable(msg) => write!(f, "Catalog unavailable: {}", msg),
            CatalogError::NotFound(id) => write!(f, "Preset not found: {}", id),
        }
    }
}

impl std::error::Error for CatalogError {}
