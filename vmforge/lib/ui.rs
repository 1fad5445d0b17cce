//! User-facing progress reporting.

use tracing::{error, info};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// The surface the build pipeline uses to talk to the operator.
///
/// One provider per front end. Steps emit a `say` announcement when they
/// start forward work and an `error` for each failed operation; they never
/// format control flow decisions into the UI.
pub trait BuildUi: Send + Sync {
    /// Announces forward progress.
    fn say(&self, message: &str);

    /// Surfaces an error without affecting the pipeline's control flow.
    fn error(&self, message: &str);
}

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`BuildUi`] provider that routes messages through `tracing`.
#[derive(Debug, Default, Clone)]
pub struct TracingUi;

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl BuildUi for TracingUi {
    fn say(&self, message: &str) {
        info!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}
