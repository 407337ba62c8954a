//! Access engine configuration.

/// Configuration for request-scope resolution.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Most distinct branch codes honoured from a single request filter
    /// (default: 500). Extra codes are dropped before merging.
    pub max_requested_branches: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            max_requested_branches: 500,
        }
    }
}
