//! `vmforge` is a pipeline for building machine images on Hyper-V class hypervisors.
//!
//! # Overview
//!
//! vmforge materializes freshly configured virtual machines from a declarative
//! specification so later pipeline stages can boot, provision, and capture
//! them. It handles:
//! - VM creation and hardware feature configuration
//! - Firmware-generation-aware feature gating (secure boot is Generation 2 only)
//! - Guaranteed teardown of every created VM, on success and on failure
//!
//! # Architecture
//!
//! vmforge consists of several key components:
//!
//! - **Pipeline**: Ordered steps over a typed build context, with teardown in
//!   reverse order that survives halts and panics
//! - **Driver**: The hypervisor capability set, with a PowerShell-backed
//!   provider for Hyper-V hosts
//! - **Steps**: The units of build work; the create step turns a [`VmSpec`]
//!   into a configured VM
//! - **Config**: The user-declared VM specification and its validation
//!
//! [`VmSpec`]: config::VmSpec
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vmforge::{
//!     config::{VmGeneration, VmSpec},
//!     driver::PowerShellDriver,
//!     pipeline::{BuildContext, Pipeline},
//!     steps::StepCreateVm,
//!     ui::TracingUi,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Declare the virtual machine
//!     let spec = VmSpec::builder()
//!         .vm_name("build-01")
//!         .generation(VmGeneration::Two)
//!         .ram_size_mib(2048)
//!         .disk_size_mib(40 * 1024)
//!         .cpu_count(2)
//!         .enable_secure_boot(true)
//!         .build();
//!
//!     // Wire the collaborators every step sees
//!     let mut ctx = BuildContext::new(
//!         Arc::new(PowerShellDriver::new()),
//!         Arc::new(TracingUi),
//!         r"C:\vmforge\work",
//!         r"C:\vmforge\vhd",
//!     );
//!
//!     // Run the build; teardown is guaranteed either way
//!     let mut pipeline = Pipeline::new(vec![Box::new(StepCreateVm::new(spec))]);
//!     pipeline.run(&mut ctx).await;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod config;
pub mod driver;
pub mod pipeline;
pub mod steps;
pub mod ui;
pub mod utils;

pub use error::*;
