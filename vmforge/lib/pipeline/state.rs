use std::{
    any::Any,
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use getset::Getters;

use crate::{driver::HypervDriver, ui::BuildUi, VmforgeError, VmforgeResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The state entry under which the create step publishes the final VM name.
pub const VM_NAME_KEY: &str = "vm_name";

/// The state entry under which a failed step records its terminal error.
pub const ERROR_KEY: &str = "error";

/// The state entry an acquisition step fills in with the downloaded boot
/// medium before the create step runs. An entry with a `.vhd`/`.vhdx`
/// extension is attached as the boot disk; anything else is treated as an
/// installer image.
pub const ISO_PATH_KEY: &str = "iso_path";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The collaborators and per-build paths every step sees.
///
/// Collaborators with a statically known type live here; the residual
/// [`StateBag`] only carries values one step produces for a later one.
#[derive(Getters)]
#[getset(get = "pub with_prefix")]
pub struct BuildContext {
    /// The hypervisor driver the steps act through.
    driver: Arc<dyn HypervDriver>,

    /// The user interface progress and errors are reported to.
    ui: Arc<dyn BuildUi>,

    /// The VM working directory.
    work_dir: PathBuf,

    /// The directory boot disks are created in.
    vhd_dir: PathBuf,

    /// Residual cross-step state.
    #[getset(skip)]
    bag: StateBag,
}

/// A keyed mapping for values that genuinely cross step boundaries.
///
/// Writes are last-writer-wins; by contract only one step writes a given
/// entry during its window.
#[derive(Default)]
pub struct StateBag {
    entries: HashMap<String, Box<dyn Any + Send + Sync>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl BuildContext {
    /// Creates a context over the given collaborators and build directories.
    pub fn new(
        driver: Arc<dyn HypervDriver>,
        ui: Arc<dyn BuildUi>,
        work_dir: impl AsRef<Path>,
        vhd_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            driver,
            ui,
            work_dir: work_dir.as_ref().to_path_buf(),
            vhd_dir: vhd_dir.as_ref().to_path_buf(),
            bag: StateBag::new(),
        }
    }

    /// Returns the residual cross-step state.
    pub fn bag(&self) -> &StateBag {
        &self.bag
    }

    /// Returns the residual cross-step state for writing.
    pub fn bag_mut(&mut self) -> &mut StateBag {
        &mut self.bag
    }
}

impl StateBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn put<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    /// Returns the entry under `key` when it is present and a `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|entry| entry.downcast_ref())
    }

    /// Like [`StateBag::get`], but distinguishes a missing entry from one of
    /// an unexpected type.
    pub fn try_get<T: Any + Send + Sync>(&self, key: &str) -> VmforgeResult<&T> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| VmforgeError::StateEntryMissing(key.to_string()))?;

        entry
            .downcast_ref()
            .ok_or_else(|| VmforgeError::StateEntryType(key.to_string()))
    }

    /// Returns `true` when the bag holds an entry under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
