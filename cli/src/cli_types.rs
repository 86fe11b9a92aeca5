#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON, as returned by the service
    Json,
    /// Aligned human-readable lines
    Text,
}
