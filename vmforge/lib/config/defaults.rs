//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The default number of vCPUs to assign to a new VM.
pub const DEFAULT_CPU_COUNT: u32 = 1;

/// The default primary memory allocation in MiB.
pub const DEFAULT_RAM_SIZE_MIB: u64 = 1024;

/// The default size in MiB of the boot disk created when no existing disk is
/// attached.
pub const DEFAULT_DISK_SIZE_MIB: u64 = 40 * 1024;
