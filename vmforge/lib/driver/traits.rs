use std::path::PathBuf;

use getset::{CopyGetters, Getters};
use typed_builder::TypedBuilder;

use crate::{config::VmGeneration, VmforgeResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Arguments for [`HypervDriver::create_virtual_machine`].
#[derive(Debug, Clone, PartialEq, TypedBuilder, Getters, CopyGetters)]
pub struct CreateVmArgs {
    /// Unique VM name within the host.
    #[builder(setter(into))]
    #[getset(get = "pub with_prefix")]
    vm_name: String,

    /// The directory the VM's configuration lives in.
    #[builder(setter(into))]
    #[getset(get = "pub with_prefix")]
    work_dir: PathBuf,

    /// A pre-existing boot disk to attach; `None` creates a fresh disk of
    /// [`disk_bytes`](CreateVmArgs::get_disk_bytes) in the VHD directory.
    #[builder(default)]
    #[getset(get = "pub with_prefix")]
    existing_disk_path: Option<PathBuf>,

    /// The directory a freshly created boot disk is placed in.
    #[builder(setter(into))]
    #[getset(get = "pub with_prefix")]
    vhd_dir: PathBuf,

    /// Primary memory allocation in bytes.
    #[getset(get_copy = "pub with_prefix")]
    ram_bytes: u64,

    /// Size in bytes of a freshly created boot disk.
    #[getset(get_copy = "pub with_prefix")]
    disk_bytes: u64,

    /// The virtual switch to bind the VM's NIC to; `None` skips NIC binding.
    #[builder(default)]
    #[getset(get = "pub with_prefix")]
    switch_name: Option<String>,

    /// Firmware generation of the new VM.
    #[getset(get_copy = "pub with_prefix")]
    generation: VmGeneration,
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// The primitive hypervisor operations the provisioning steps compose.
///
/// Each operation either succeeds or returns a descriptive error. The driver
/// is not transactional across operations; callers own ordering and rollback.
/// Providers for different host management tool versions are selected when
/// the pipeline is constructed.
#[async_trait::async_trait]
pub trait HypervDriver: Send + Sync {
    /// Allocates the VM entity on the host, bound to the switch when one is
    /// given, with either the supplied disk attached or a fresh disk created
    /// in the VHD directory. Once this succeeds the VM exists and teardown
    /// owes it a [`delete_virtual_machine`](HypervDriver::delete_virtual_machine).
    async fn create_virtual_machine(&self, args: &CreateVmArgs) -> VmforgeResult<()>;

    /// Configures the virtual CPU count.
    async fn set_virtual_machine_cpu_count(&self, vm_name: &str, count: u32) -> VmforgeResult<()>;

    /// Applies the dynamic memory toggle.
    async fn set_virtual_machine_dynamic_memory(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()>;

    /// Applies the MAC spoofing toggle to the VM's primary NIC.
    async fn set_virtual_machine_mac_spoofing(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()>;

    /// Applies the secure boot toggle. Only valid for Generation 2 VMs.
    async fn set_virtual_machine_secure_boot(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()>;

    /// Applies the nested virtualization toggle. Valid only on sufficiently
    /// recent hosts.
    async fn set_virtual_machine_virtualization_extensions(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()>;

    /// Removes the VM from the host registry. Whether backing disks in the
    /// VHD directory are removed is provider-defined.
    async fn delete_virtual_machine(&self, vm_name: &str) -> VmforgeResult<()>;
}
