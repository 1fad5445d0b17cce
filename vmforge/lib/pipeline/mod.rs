//! The build pipeline: ordered steps over a shared context with a guaranteed
//! teardown.

mod runner;
mod state;
mod step;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use runner::*;
pub use state::*;
pub use step::*;
