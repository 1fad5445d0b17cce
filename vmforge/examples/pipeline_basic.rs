//! Runs the create step through the pipeline against a driver that only logs
//! what it would do, so the flow can be exercised on any machine without a
//! Hyper-V host.
//!
//! To run the example:
//! ```bash
//! cargo run --example pipeline_basic
//! ```
//!
//! The example will:
//! 1. Declare a Generation 2 VM with secure boot and dynamic memory
//! 2. Run the pipeline forward (create + configure)
//! 3. Tear the pipeline down (unregister + delete)

use std::sync::Arc;

use async_trait::async_trait;
use vmforge::{
    config::{VmGeneration, VmSpec},
    driver::{CreateVmArgs, HypervDriver},
    pipeline::{BuildContext, Pipeline, StepAction, VM_NAME_KEY},
    steps::StepCreateVm,
    ui::TracingUi,
    VmforgeResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A driver that logs each primitive instead of touching a hypervisor.
struct LoggingDriver;

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with debug level by default
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let spec = VmSpec::builder()
        .vm_name("demo-build-01")
        .switch_name("Default Switch")
        .generation(VmGeneration::Two)
        .ram_size_mib(2048)
        .disk_size_mib(40 * 1024)
        .cpu_count(2)
        .enable_secure_boot(true)
        .enable_dynamic_memory(true)
        .build();
    spec.validate()?;

    let work_dir = std::env::temp_dir().join("vmforge-demo/work");
    let vhd_dir = std::env::temp_dir().join("vmforge-demo/vhd");

    let mut ctx = BuildContext::new(
        Arc::new(LoggingDriver),
        Arc::new(TracingUi),
        work_dir,
        vhd_dir,
    );

    let mut pipeline = Pipeline::new(vec![Box::new(StepCreateVm::new(spec))]);
    let action = pipeline.run(&mut ctx).await;

    match action {
        StepAction::Continue => {
            let vm_name: &String = ctx.bag().try_get(VM_NAME_KEY)?;
            println!("\nBuild finished; VM was named {}", vm_name);
        }
        StepAction::Halt => println!("\nBuild halted; see errors above"),
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl HypervDriver for LoggingDriver {
    async fn create_virtual_machine(&self, args: &CreateVmArgs) -> VmforgeResult<()> {
        tracing::info!(
            vm_name = %args.get_vm_name(),
            ram_bytes = args.get_ram_bytes(),
            disk_bytes = args.get_disk_bytes(),
            generation = %args.get_generation(),
            "would create VM"
        );
        Ok(())
    }

    async fn set_virtual_machine_cpu_count(&self, vm_name: &str, count: u32) -> VmforgeResult<()> {
        tracing::info!(vm_name, count, "would set vCPU count");
        Ok(())
    }

    async fn set_virtual_machine_dynamic_memory(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()> {
        tracing::info!(vm_name, enabled, "would set dynamic memory");
        Ok(())
    }

    async fn set_virtual_machine_mac_spoofing(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()> {
        tracing::info!(vm_name, enabled, "would set MAC spoofing");
        Ok(())
    }

    async fn set_virtual_machine_secure_boot(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()> {
        tracing::info!(vm_name, enabled, "would set secure boot");
        Ok(())
    }

    async fn set_virtual_machine_virtualization_extensions(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()> {
        tracing::info!(vm_name, enabled, "would set virtualization extensions");
        Ok(())
    }

    async fn delete_virtual_machine(&self, vm_name: &str) -> VmforgeResult<()> {
        tracing::info!(vm_name, "would delete VM");
        Ok(())
    }
}
