//! URL classification for intercepted requests.
//!
//! The contract recognizes exactly four patterns: the root path and anything
//! under the app prefix boot the application shell; one fixed path serves the
//! initial data payload; one fixed path accepts entity modifications;
//! everything else is generic traffic.

/// Path of the cached application-shell document.
pub const APP_SHELL_PATH: &str = "/app/";

/// Fixed path of the initial-data endpoint.
pub const INITIAL_DATA_PATH: &str = "/api/getInitialData";

/// Fixed path of the entity-modification endpoint.
pub const MUTATION_PATH: &str = "/api/persistEntityModifications";

/// Per-request routing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Network first, cached shell after 800 ms.
    AppShell,
    /// Network first (refreshing the cache), cached payload after 1500 ms.
    InitialData,
    /// Network first, durable queue and replay on failure.
    Mutation,
    /// Cache first, network on miss.
    Other,
}

/// Classify a request path. Pure and stateless.
///
/// Matching is exact for the fixed endpoints; a query string on them makes
/// the request generic traffic, same as any unrecognized path.
pub fn classify(path: &str) -> RouteClass {
    if path == "/" || path.starts_with(APP_SHELL_PATH) {
        RouteClass::AppShell
    } else if path == INITIAL_DATA_PATH {
        RouteClass::InitialData
    } else if path == MUTATION_PATH {
        RouteClass::Mutation
    } else {
        RouteClass::Other
    }
}
