//! Error types for the demo engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps one subsystem's error so `main` can propagate with
/// `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: drillwatch_core::config::ConfigError,
    },

    /// Building or mutating the demo site failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: drillwatch_world::WorldError,
    },

    /// The controller rejected an event.
    #[error("controller error: {source}")]
    Controller {
        /// The underlying controller error.
        #[from]
        source: drillwatch_core::ControllerError,
    },

    /// Saving controller state failed.
    #[error("persist error: {source}")]
    Persist {
        /// The underlying persist error.
        #[from]
        source: drillwatch_core::error::PersistError,
    },
}
