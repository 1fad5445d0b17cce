use std::path::Path;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns `true` when the path points at a virtual hard disk container
/// (`.vhd` or `.vhdx`, case-insensitive) rather than an installer image.
///
/// ## Examples
///
/// ```
/// use std::path::Path;
/// use vmforge::utils::is_prebuilt_disk;
///
/// assert!(is_prebuilt_disk(Path::new("/images/base.VHDX")));
/// assert!(!is_prebuilt_disk(Path::new("/tmp/os.iso")));
/// ```
pub fn is_prebuilt_disk(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| {
            let extension = extension.to_lowercase();
            extension == "vhd" || extension == "vhdx"
        })
        .unwrap_or(false)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_prebuilt_disk_accepts_vhd_and_vhdx() {
        assert!(is_prebuilt_disk(Path::new("/images/base.vhd")));
        assert!(is_prebuilt_disk(Path::new("/images/base.vhdx")));
        assert!(is_prebuilt_disk(Path::new("/images/base.VHDX")));
        assert!(is_prebuilt_disk(Path::new(r"C:\images\base.Vhd")));
    }

    #[test]
    fn test_is_prebuilt_disk_rejects_other_paths() {
        assert!(!is_prebuilt_disk(Path::new("/tmp/os.iso")));
        assert!(!is_prebuilt_disk(Path::new("/tmp/os")));
        assert!(!is_prebuilt_disk(Path::new("/tmp/base.vhdx.bak")));
        assert!(!is_prebuilt_disk(Path::new("")));
    }
}
