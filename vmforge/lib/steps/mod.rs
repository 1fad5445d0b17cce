//! The units of build work the pipeline sequences.

mod create_vm;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use create_vm::*;
