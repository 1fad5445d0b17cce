//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The number of bytes in a mebibyte.
pub const BYTES_PER_MIB: u64 = 1024 * 1024;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Converts a size in MiB to bytes.
///
/// The hypervisor management surface consumes bytes while user-facing
/// configuration is declared in MiB.
///
/// ## Examples
///
/// ```
/// use vmforge::utils::mib_to_bytes;
///
/// assert_eq!(mib_to_bytes(2048), 2_147_483_648);
/// assert_eq!(mib_to_bytes(40 * 1024), 42_949_672_960);
/// ```
pub fn mib_to_bytes(mib: u64) -> u64 {
    mib * BYTES_PER_MIB
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
