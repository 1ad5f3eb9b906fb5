//! Error types for route registration.

/// Errors raised while building a [`RouteTable`](crate::RouteTable).
///
/// Resolution itself never fails: a path that matches nothing resolves
/// to an empty descriptor.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// A pattern route is not a valid regular expression.
    #[error("invalid route pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern, as registered.
        pattern: String,
        /// Why it failed to compile.
        #[source]
        source: regex::Error,
    },
}
