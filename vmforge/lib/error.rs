use std::{
    error::Error,
    fmt::{self, Display},
};
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a vmforge-related operation.
pub type VmforgeResult<T> = Result<T, VmforgeError>;

/// An error that occurred during a vmforge operation.
#[derive(pretty_error_debug::Debug, Error)]
pub enum VmforgeError {
    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that can represent any error.
    #[error(transparent)]
    Custom(#[from] AnyError),

    /// An error that occurred when an invalid VM specification was used.
    #[error("invalid vm specification: {0}")]
    InvalidVmSpec(#[from] InvalidVmSpecError),

    /// An error that occurred when an unsupported firmware generation was used.
    #[error("unsupported vm generation: {0}, expected 1 or 2")]
    UnsupportedGeneration(u8),

    /// An error that occurred when a host management command exited non-zero.
    #[error("`{command}` failed with exit code {code}: {stderr}")]
    CommandFailed {
        /// The cmdlet or program that failed.
        command: String,

        /// The exit code of the command, `-1` when terminated by a signal.
        code: i32,

        /// The trimmed standard error output of the command.
        stderr: String,
    },

    /// An error that occurred when a required state entry was missing.
    #[error("missing state entry: {0}")]
    StateEntryMissing(String),

    /// An error that occurred when a state entry held an unexpected type.
    #[error("state entry has unexpected type: {0}")]
    StateEntryType(String),

    /// A configuration phase of a pipeline step failed.
    #[error("{context}: {source}")]
    StepFailed {
        /// Which configuration phase failed, in operator-readable form.
        context: String,

        /// The underlying failure.
        source: Box<VmforgeError>,
    },

    /// A pipeline step panicked while running.
    #[error("step panicked: {0}")]
    StepPanicked(String),
}

/// An error that occurred when an invalid VM specification was used.
#[derive(Debug, Error)]
pub enum InvalidVmSpecError {
    /// The VM name is empty.
    #[error("vm name is empty")]
    VmNameEmpty,

    /// The number of vCPUs is zero.
    #[error("number of vCPUs is zero")]
    CpuCountIsZero,

    /// The amount of RAM is zero.
    #[error("amount of RAM is zero")]
    RamIsZero,
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl VmforgeError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> VmforgeError {
        VmforgeError::Custom(AnyError {
            error: error.into(),
        })
    }

    /// Wraps `source` with the operator-readable name of the configuration
    /// phase that failed.
    pub fn step_failed(context: impl Into<String>, source: VmforgeError) -> VmforgeError {
        VmforgeError::StepFailed {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}
