//! The step that materializes the virtual machine.

use std::path::PathBuf;

use async_trait::async_trait;
use getset::{CopyGetters, Getters};
use tracing::debug;

use crate::{
    config::{VmGeneration, VmSpec},
    driver::CreateVmArgs,
    pipeline::{BuildContext, Step, StepAction, ERROR_KEY, ISO_PATH_KEY, VM_NAME_KEY},
    utils::{is_prebuilt_disk, mib_to_bytes},
    VmforgeError,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Where in its lifecycle the create step is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateVmPhase {
    /// No host-side work has happened yet.
    Pending,

    /// The VM entity exists on the host; teardown owes it a delete.
    VmCreated,

    /// Every applicable configuration primitive has been applied.
    Finalized,

    /// A primitive failed and the step recorded a terminal error.
    Halted,

    /// Teardown removed the VM from the host.
    Deleted,
}

/// Creates the virtual machine and applies the declared hardware features.
///
/// Produces the [`VM_NAME_KEY`] state entry so downstream steps can address
/// the VM. On any primitive failure the step records the wrapped error under
/// [`ERROR_KEY`], surfaces it through the UI, and halts the pipeline; the VM
/// created so far is left in place for teardown.
#[derive(Getters, CopyGetters)]
pub struct StepCreateVm {
    /// The user-declared VM specification.
    #[getset(get = "pub with_prefix")]
    spec: VmSpec,

    /// The step's current lifecycle phase.
    #[getset(get_copy = "pub with_prefix")]
    phase: CreateVmPhase,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl StepCreateVm {
    /// Creates the step from a VM specification.
    pub fn new(spec: VmSpec) -> Self {
        Self {
            spec,
            phase: CreateVmPhase::Pending,
        }
    }

    /// Resolves the boot disk for the new VM from the residual state.
    ///
    /// An entry with a `.vhd`/`.vhdx` extension is a pre-built boot disk and
    /// is attached as-is. Anything else is the installer case: the disk is
    /// created fresh and a later step mounts the installer medium.
    fn resolve_boot_disk(&self, ctx: &BuildContext) -> Option<PathBuf> {
        if let Some(path) = ctx.bag().get::<PathBuf>(ISO_PATH_KEY) {
            if is_prebuilt_disk(path) {
                return Some(path.clone());
            }
        }

        debug!("No existing virtual harddrive, not attaching.");
        None
    }

    /// Records the wrapped error, surfaces it, and halts the pipeline.
    fn halt(&mut self, ctx: &mut BuildContext, context: &str, source: VmforgeError) -> StepAction {
        let error = VmforgeError::step_failed(context, source);
        ctx.get_ui().error(&error.to_string());
        ctx.bag_mut().put(ERROR_KEY, error);
        self.phase = CreateVmPhase::Halted;

        StepAction::Halt
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Step for StepCreateVm {
    fn name(&self) -> &str {
        "create_vm"
    }

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        ctx.get_ui().say("Creating virtual machine...");

        let existing_disk_path = self.resolve_boot_disk(ctx);

        // The driver consumes bytes.
        let ram_bytes = mib_to_bytes(self.spec.get_ram_size_mib());
        let disk_bytes = mib_to_bytes(self.spec.get_disk_size_mib());

        let vm_name = self.spec.get_vm_name().clone();
        let driver = ctx.get_driver().clone();

        let args = CreateVmArgs::builder()
            .vm_name(vm_name.clone())
            .work_dir(ctx.get_work_dir().clone())
            .existing_disk_path(existing_disk_path)
            .vhd_dir(ctx.get_vhd_dir().clone())
            .ram_bytes(ram_bytes)
            .disk_bytes(disk_bytes)
            .switch_name(self.spec.get_switch_name().clone())
            .generation(self.spec.get_generation())
            .build();

        if let Err(error) = driver.create_virtual_machine(&args).await {
            return self.halt(ctx, "Error creating virtual machine", error);
        }
        self.phase = CreateVmPhase::VmCreated;

        if let Err(error) = driver
            .set_virtual_machine_cpu_count(&vm_name, self.spec.get_cpu_count())
            .await
        {
            return self.halt(ctx, "Error setting virtual machine cpu count", error);
        }

        if let Err(error) = driver
            .set_virtual_machine_dynamic_memory(&vm_name, self.spec.get_enable_dynamic_memory())
            .await
        {
            return self.halt(ctx, "Error setting virtual machine dynamic memory", error);
        }

        if self.spec.get_enable_mac_spoofing() {
            if let Err(error) = driver
                .set_virtual_machine_mac_spoofing(&vm_name, true)
                .await
            {
                return self.halt(ctx, "Error setting virtual machine mac spoofing", error);
            }
        }

        // Generation 1 firmware has no secure boot concept; the flag is
        // ignored there.
        if self.spec.get_generation() == VmGeneration::Two {
            if let Err(error) = driver
                .set_virtual_machine_secure_boot(&vm_name, self.spec.get_enable_secure_boot())
                .await
            {
                return self.halt(ctx, "Error setting secure boot", error);
            }
        }

        if self.spec.get_enable_virtualization_extensions() {
            // Requires a host recent enough to expose nested virtualization.
            if let Err(error) = driver
                .set_virtual_machine_virtualization_extensions(&vm_name, true)
                .await
            {
                return self.halt(
                    ctx,
                    "Error setting virtual machine virtualization extensions",
                    error,
                );
            }
        }

        // Publish the final name so downstream steps can address the VM.
        ctx.bag_mut().put(VM_NAME_KEY, vm_name);
        self.phase = CreateVmPhase::Finalized;

        StepAction::Continue
    }

    async fn cleanup(&mut self, ctx: &mut BuildContext) {
        if self.spec.get_vm_name().is_empty() {
            return;
        }

        ctx.get_ui().say("Unregistering and deleting virtual machine...");

        let driver = ctx.get_driver().clone();
        let result = driver.delete_virtual_machine(self.spec.get_vm_name()).await;
        if let Err(error) = result {
            ctx.get_ui()
                .error(&format!("Error deleting virtual machine: {}", error));
        } else {
            self.phase = CreateVmPhase::Deleted;
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
