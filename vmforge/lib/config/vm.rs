//! Virtual machine specification types.

use std::{
    fmt::{self, Display},
    path::PathBuf,
};

use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{InvalidVmSpecError, VmforgeError, VmforgeResult};

use super::{DEFAULT_CPU_COUNT, DEFAULT_DISK_SIZE_MIB, DEFAULT_RAM_SIZE_MIB};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The user-declared specification of the virtual machine to materialize.
///
/// All fields are supplied by the enclosing pipeline before the build runs;
/// the create step reads them and never mutates them.
///
/// ## Examples
///
/// ```rust
/// use vmforge::config::{VmGeneration, VmSpec};
///
/// let spec = VmSpec::builder()
///     .vm_name("build-01")
///     .switch_name("Default Switch")
///     .generation(VmGeneration::Two)
///     .ram_size_mib(2048)
///     .cpu_count(2)
///     .enable_secure_boot(true)
///     .build();
///
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder, Getters, CopyGetters)]
pub struct VmSpec {
    /// Unique VM name within the host.
    #[builder(setter(into))]
    #[getset(get = "pub with_prefix")]
    vm_name: String,

    /// Pre-existing virtual switch to attach the VM's NIC to; `None` skips
    /// NIC binding.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[builder(default, setter(strip_option, into))]
    #[getset(get = "pub with_prefix")]
    switch_name: Option<String>,

    /// Pre-built boot disk the enclosing pipeline hands to the build instead
    /// of installing from an ISO.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[builder(default, setter(strip_option, into))]
    #[getset(get = "pub with_prefix")]
    harddrive_path: Option<PathBuf>,

    /// Primary memory allocation in MiB.
    #[serde(default = "VmSpec::default_ram_size_mib")]
    #[builder(default = DEFAULT_RAM_SIZE_MIB)]
    #[getset(get_copy = "pub with_prefix")]
    ram_size_mib: u64,

    /// Size in MiB of the boot disk created when no existing disk is attached.
    #[serde(default = "VmSpec::default_disk_size_mib")]
    #[builder(default = DEFAULT_DISK_SIZE_MIB)]
    #[getset(get_copy = "pub with_prefix")]
    disk_size_mib: u64,

    /// Hypervisor firmware generation.
    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub with_prefix")]
    generation: VmGeneration,

    /// Virtual CPU count.
    #[serde(default = "VmSpec::default_cpu_count")]
    #[builder(default = DEFAULT_CPU_COUNT)]
    #[getset(get_copy = "pub with_prefix")]
    cpu_count: u32,

    /// Permit source MAC rewriting on the NIC.
    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub with_prefix")]
    enable_mac_spoofing: bool,

    /// Enable balloon-adjustable RAM.
    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub with_prefix")]
    enable_dynamic_memory: bool,

    /// Enable UEFI secure boot. Only meaningful on Generation 2; Generation 1
    /// firmware has no secure boot concept and the flag is ignored there.
    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub with_prefix")]
    enable_secure_boot: bool,

    /// Expose hardware virtualization CPU features inside the guest.
    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub with_prefix")]
    enable_virtualization_extensions: bool,
}

/// Hypervisor firmware generation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum VmGeneration {
    /// Generation 1 (emulated legacy devices and BIOS firmware).
    #[default]
    One,

    /// Generation 2 (synthetic devices and UEFI firmware with optional
    /// secure boot).
    Two,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl VmSpec {
    /// Validates the specification before any host-side work happens.
    pub fn validate(&self) -> VmforgeResult<()> {
        if self.vm_name.is_empty() {
            return Err(InvalidVmSpecError::VmNameEmpty.into());
        }

        if self.cpu_count == 0 {
            return Err(InvalidVmSpecError::CpuCountIsZero.into());
        }

        if self.ram_size_mib == 0 {
            return Err(InvalidVmSpecError::RamIsZero.into());
        }

        Ok(())
    }

    fn default_ram_size_mib() -> u64 {
        DEFAULT_RAM_SIZE_MIB
    }

    fn default_disk_size_mib() -> u64 {
        DEFAULT_DISK_SIZE_MIB
    }

    fn default_cpu_count() -> u32 {
        DEFAULT_CPU_COUNT
    }
}

impl VmGeneration {
    /// Returns the integer form the host management tooling expects.
    pub fn as_u8(&self) -> u8 {
        match self {
            VmGeneration::One => 1,
            VmGeneration::Two => 2,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl TryFrom<u8> for VmGeneration {
    type Error = VmforgeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VmGeneration::One),
            2 => Ok(VmGeneration::Two),
            other => Err(VmforgeError::UnsupportedGeneration(other)),
        }
    }
}

impl From<VmGeneration> for u8 {
    fn from(generation: VmGeneration) -> Self {
        generation.as_u8()
    }
}

impl Display for VmGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
