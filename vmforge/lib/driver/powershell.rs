//! A Hyper-V capability provider backed by the host's PowerShell module.

use std::fmt::Display;

use tokio::process::Command;
use tracing::debug;

use crate::{VmforgeError, VmforgeResult};

use super::{CreateVmArgs, HypervDriver};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The executable used to reach the Hyper-V PowerShell module.
const POWERSHELL_PROGRAM: &str = "powershell.exe";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`HypervDriver`] provider that drives the host's `Hyper-V` PowerShell
/// module, one cmdlet invocation per primitive.
///
/// Every invocation runs `-NoProfile -NonInteractive` and maps a non-zero
/// exit to [`VmforgeError::CommandFailed`] carrying the cmdlet name and the
/// trimmed standard error output. Deleting a VM force-stops it first and
/// leaves backing disks in the VHD directory for the caller.
#[derive(Debug, Clone)]
pub struct PowerShellDriver {
    /// The PowerShell executable to invoke.
    program: String,
}

/// An incrementally assembled cmdlet invocation.
struct Cmdlet {
    text: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PowerShellDriver {
    /// Creates a driver using the host's default PowerShell executable.
    pub fn new() -> Self {
        Self::with_program(POWERSHELL_PROGRAM)
    }

    /// Creates a driver using a specific PowerShell executable, e.g. `pwsh`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs a script fragment, mapping a non-zero exit to a descriptive error
    /// tagged with `label`.
    async fn run(&self, label: &str, script: String) -> VmforgeResult<()> {
        debug!(command = %script, "running powershell");

        let output = Command::new(&self.program)
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(&script)
            .output()
            .await?;

        if output.status.success() {
            return Ok(());
        }

        Err(VmforgeError::CommandFailed {
            command: label.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl Cmdlet {
    fn new(name: &str) -> Self {
        Self {
            text: name.to_string(),
        }
    }

    /// Appends `-Name 'value'`, doubling embedded single quotes.
    fn arg_quoted(mut self, name: &str, value: impl AsRef<str>) -> Self {
        let escaped = value.as_ref().replace('\'', "''");
        self.text.push_str(&format!(" -{} '{}'", name, escaped));
        self
    }

    /// Appends `-Name value` verbatim; for numbers and other bare tokens.
    fn arg(mut self, name: &str, value: impl Display) -> Self {
        self.text.push_str(&format!(" -{} {}", name, value));
        self
    }

    /// Appends `-Name $true` or `-Name $false`.
    fn arg_bool(self, name: &str, value: bool) -> Self {
        self.arg(name, if value { "$true" } else { "$false" })
    }

    /// Appends `-Name On` or `-Name Off`.
    fn arg_on_off(self, name: &str, value: bool) -> Self {
        self.arg(name, if value { "On" } else { "Off" })
    }

    /// Appends a bare `-Name` switch.
    fn flag(mut self, name: &str) -> Self {
        self.text.push_str(&format!(" -{}", name));
        self
    }

    fn build(self) -> String {
        self.text
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Assembles the `New-VM` invocation for `args`.
///
/// With an existing disk the disk is attached as-is; otherwise `New-VM`
/// creates a fresh VHDX named after the VM inside the VHD directory.
fn new_vm_script(args: &CreateVmArgs) -> String {
    let mut cmdlet = Cmdlet::new("New-VM")
        .arg_quoted("Name", args.get_vm_name())
        .arg_quoted("Path", args.get_work_dir().display().to_string())
        .arg("MemoryStartupBytes", args.get_ram_bytes())
        .arg("Generation", args.get_generation());

    cmdlet = match args.get_existing_disk_path() {
        Some(disk) => cmdlet.arg_quoted("VHDPath", disk.display().to_string()),
        None => {
            let vhd_path = args
                .get_vhd_dir()
                .join(format!("{}.vhdx", args.get_vm_name()));
            cmdlet
                .arg_quoted("NewVHDPath", vhd_path.display().to_string())
                .arg("NewVHDSizeBytes", args.get_disk_bytes())
        }
    };

    if let Some(switch_name) = args.get_switch_name() {
        cmdlet = cmdlet.arg_quoted("SwitchName", switch_name);
    }

    cmdlet.flag("Force").build()
}

/// Assembles the teardown script: a forced stop, then unregistration.
fn remove_vm_script(vm_name: &str) -> String {
    let stop = Cmdlet::new("Stop-VM")
        .arg_quoted("Name", vm_name)
        .flag("TurnOff")
        .flag("Force")
        .arg("ErrorAction", "SilentlyContinue")
        .build();
    let remove = Cmdlet::new("Remove-VM")
        .arg_quoted("Name", vm_name)
        .flag("Force")
        .build();

    format!("{}; {}", stop, remove)
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for PowerShellDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HypervDriver for PowerShellDriver {
    async fn create_virtual_machine(&self, args: &CreateVmArgs) -> VmforgeResult<()> {
        self.run("New-VM", new_vm_script(args)).await
    }

    async fn set_virtual_machine_cpu_count(&self, vm_name: &str, count: u32) -> VmforgeResult<()> {
        let script = Cmdlet::new("Set-VMProcessor")
            .arg_quoted("VMName", vm_name)
            .arg("Count", count)
            .build();
        self.run("Set-VMProcessor", script).await
    }

    async fn set_virtual_machine_dynamic_memory(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()> {
        let script = Cmdlet::new("Set-VMMemory")
            .arg_quoted("VMName", vm_name)
            .arg_bool("DynamicMemoryEnabled", enabled)
            .build();
        self.run("Set-VMMemory", script).await
    }

    async fn set_virtual_machine_mac_spoofing(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()> {
        let script = Cmdlet::new("Set-VMNetworkAdapter")
            .arg_quoted("VMName", vm_name)
            .arg_on_off("MacAddressSpoofing", enabled)
            .build();
        self.run("Set-VMNetworkAdapter", script).await
    }

    async fn set_virtual_machine_secure_boot(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()> {
        let script = Cmdlet::new("Set-VMFirmware")
            .arg_quoted("VMName", vm_name)
            .arg_on_off("EnableSecureBoot", enabled)
            .build();
        self.run("Set-VMFirmware", script).await
    }

    async fn set_virtual_machine_virtualization_extensions(
        &self,
        vm_name: &str,
        enabled: bool,
    ) -> VmforgeResult<()> {
        let script = Cmdlet::new("Set-VMProcessor")
            .arg_quoted("VMName", vm_name)
            .arg_bool("ExposeVirtualizationExtensions", enabled)
            .build();
        self.run("Set-VMProcessor", script).await
    }

    async fn delete_virtual_machine(&self, vm_name: &str) -> VmforgeResult<()> {
        self.run("Remove-VM", remove_vm_script(vm_name)).await
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
