//! Pipeline-level scenarios for the create step: teardown after halts and
//! panics, reverse cleanup ordering, and output publication.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vmforge::{
    config::{VmGeneration, VmSpec},
    driver::{CreateVmArgs, HypervDriver},
    pipeline::{BuildContext, Pipeline, Step, StepAction, ERROR_KEY, VM_NAME_KEY},
    steps::StepCreateVm,
    ui::BuildUi,
    VmforgeError, VmforgeResult,
};

//--------------------------------------------------------------------------------------------------
// Types: Fakes
//--------------------------------------------------------------------------------------------------

/// A driver that records operation names and fails the one it was told to.
#[derive(Default)]
struct FakeDriver {
    ops: Mutex<Vec<String>>,
    fail_op: Option<&'static str>,
}

impl FakeDriver {
    fn new() -> Self {
        Self::default()
    }

    fn failing(op: &'static str) -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            fail_op: Some(op),
        }
    }

    fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) -> VmforgeResult<()> {
        self.ops.lock().unwrap().push(op.to_string());

        if self.fail_op == Some(op) {
            return Err(VmforgeError::custom(anyhow::anyhow!("injected failure")));
        }

        Ok(())
    }
}

#[async_trait]
impl HypervDriver for FakeDriver {
    async fn create_virtual_machine(&self, _args: &CreateVmArgs) -> VmforgeResult<()> {
        self.record("create_virtual_machine")
    }

    async fn set_virtual_machine_cpu_count(&self, _vm_name: &str, _count: u32) -> VmforgeResult<()> {
        self.record("set_virtual_machine_cpu_count")
    }

    async fn set_virtual_machine_dynamic_memory(
        &self,
        _vm_name: &str,
        _enabled: bool,
    ) -> VmforgeResult<()> {
        self.record("set_virtual_machine_dynamic_memory")
    }

    async fn set_virtual_machine_mac_spoofing(
        &self,
        _vm_name: &str,
        _enabled: bool,
    ) -> VmforgeResult<()> {
        self.record("set_virtual_machine_mac_spoofing")
    }

    async fn set_virtual_machine_secure_boot(
        &self,
        _vm_name: &str,
        _enabled: bool,
    ) -> VmforgeResult<()> {
        self.record("set_virtual_machine_secure_boot")
    }

    async fn set_virtual_machine_virtualization_extensions(
        &self,
        _vm_name: &str,
        _enabled: bool,
    ) -> VmforgeResult<()> {
        self.record("set_virtual_machine_virtualization_extensions")
    }

    async fn delete_virtual_machine(&self, _vm_name: &str) -> VmforgeResult<()> {
        self.record("delete_virtual_machine")
    }
}

/// A UI that collects announcements and errors for assertions.
#[derive(Default)]
struct CollectingUi {
    says: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl CollectingUi {
    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl BuildUi for CollectingUi {
    fn say(&self, message: &str) {
        self.says.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// A step that records when its phases run, for ordering assertions.
struct ProbeStep {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    action: StepAction,
}

impl ProbeStep {
    fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name,
            log,
            action: StepAction::Continue,
        }
    }

    fn halting(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name,
            log,
            action: StepAction::Halt,
        }
    }
}

#[async_trait]
impl Step for ProbeStep {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&mut self, _ctx: &mut BuildContext) -> StepAction {
        self.log.lock().unwrap().push(format!("run:{}", self.name));
        self.action
    }

    async fn cleanup(&mut self, _ctx: &mut BuildContext) {
        self.log
            .lock()
            .unwrap()
            .push(format!("cleanup:{}", self.name));
    }
}

/// A step that panics while running, for teardown-guarantee assertions.
struct PanickingStep {
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Step for PanickingStep {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn run(&mut self, _ctx: &mut BuildContext) -> StepAction {
        panic!("exploded mid-provision")
    }

    async fn cleanup(&mut self, _ctx: &mut BuildContext) {
        self.log.lock().unwrap().push("cleanup:panicking".to_string());
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn build_spec() -> VmSpec {
    VmSpec::builder()
        .vm_name("build-01")
        .generation(VmGeneration::Two)
        .ram_size_mib(2048)
        .disk_size_mib(40 * 1024)
        .cpu_count(2)
        .enable_secure_boot(true)
        .build()
}

fn build_context(
    driver: Arc<FakeDriver>,
    ui: Arc<CollectingUi>,
    dirs: &(tempfile::TempDir, tempfile::TempDir),
) -> BuildContext {
    BuildContext::new(driver, ui, dirs.0.path(), dirs.1.path())
}

fn build_dirs() -> (tempfile::TempDir, tempfile::TempDir) {
    (
        tempfile::tempdir().unwrap(),
        tempfile::tempdir().unwrap(),
    )
}

//--------------------------------------------------------------------------------------------------
// Functions: Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_pipeline_builds_and_tears_down_the_vm() {
    let driver = Arc::new(FakeDriver::new());
    let ui = Arc::new(CollectingUi::default());
    let dirs = build_dirs();
    let mut ctx = build_context(driver.clone(), ui.clone(), &dirs);

    let mut pipeline = Pipeline::new(vec![Box::new(StepCreateVm::new(build_spec()))]);
    let action = pipeline.run(&mut ctx).await;

    assert_eq!(action, StepAction::Continue);
    assert_eq!(
        ctx.bag().try_get::<String>(VM_NAME_KEY).unwrap(),
        "build-01"
    );
    assert_eq!(
        driver.ops(),
        vec![
            "create_virtual_machine".to_string(),
            "set_virtual_machine_cpu_count".to_string(),
            "set_virtual_machine_dynamic_memory".to_string(),
            "set_virtual_machine_secure_boot".to_string(),
            "delete_virtual_machine".to_string(),
        ]
    );
    assert!(ui.errors().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_pipeline_halts_and_still_deletes_the_vm() {
    let driver = Arc::new(FakeDriver::failing("set_virtual_machine_dynamic_memory"));
    let ui = Arc::new(CollectingUi::default());
    let dirs = build_dirs();
    let mut ctx = build_context(driver.clone(), ui.clone(), &dirs);

    let mut pipeline = Pipeline::new(vec![Box::new(StepCreateVm::new(build_spec()))]);
    let action = pipeline.run(&mut ctx).await;

    assert_eq!(action, StepAction::Halt);
    assert!(!ctx.bag().contains(VM_NAME_KEY));

    let error = ctx.bag().try_get::<VmforgeError>(ERROR_KEY).unwrap();
    assert_eq!(
        error.to_string(),
        "Error setting virtual machine dynamic memory: injected failure"
    );
    assert_eq!(ui.errors(), vec![error.to_string()]);

    // The original driver failure is still recoverable through the escape
    // hatch under the human-readable wrapping.
    match error {
        VmforgeError::StepFailed { source, .. } => match source.as_ref() {
            VmforgeError::Custom(any) => {
                assert_eq!(any.downcast::<&str>(), Some(&"injected failure"));
            }
            other => panic!("expected a custom driver error, got {}", other),
        },
        other => panic!("expected a wrapped step failure, got {}", other),
    }

    // Teardown ran even though the forward pass halted.
    assert_eq!(
        driver.ops().last().unwrap(),
        "delete_virtual_machine"
    );
}

#[test_log::test(tokio::test)]
async fn test_pipeline_survives_a_panicking_step() {
    let driver = Arc::new(FakeDriver::new());
    let ui = Arc::new(CollectingUi::default());
    let dirs = build_dirs();
    let mut ctx = build_context(driver.clone(), ui.clone(), &dirs);
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut pipeline = Pipeline::new(vec![
        Box::new(StepCreateVm::new(build_spec())),
        Box::new(PanickingStep { log: log.clone() }),
    ]);
    let action = pipeline.run(&mut ctx).await;

    assert_eq!(action, StepAction::Halt);

    let error = ctx.bag().try_get::<VmforgeError>(ERROR_KEY).unwrap();
    assert_eq!(error.to_string(), "step panicked: exploded mid-provision");

    // Both cleanups ran: the panicking step's own, then the VM delete.
    assert_eq!(
        log.lock().unwrap().clone(),
        vec!["cleanup:panicking".to_string()]
    );
    assert_eq!(
        driver.ops().last().unwrap(),
        "delete_virtual_machine"
    );
}

#[test_log::test(tokio::test)]
async fn test_pipeline_cleans_up_in_reverse_order() {
    let driver = Arc::new(FakeDriver::new());
    let ui = Arc::new(CollectingUi::default());
    let dirs = build_dirs();
    let mut ctx = build_context(driver, ui, &dirs);
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut pipeline = Pipeline::new(vec![
        Box::new(ProbeStep::new("first", log.clone())),
        Box::new(ProbeStep::new("second", log.clone())),
    ]);
    let action = pipeline.run(&mut ctx).await;

    assert_eq!(action, StepAction::Continue);
    assert_eq!(
        log.lock().unwrap().clone(),
        vec![
            "run:first".to_string(),
            "run:second".to_string(),
            "cleanup:second".to_string(),
            "cleanup:first".to_string(),
        ]
    );
}

#[test_log::test(tokio::test)]
async fn test_pipeline_tears_down_steps_that_never_ran() {
    let driver = Arc::new(FakeDriver::new());
    let ui = Arc::new(CollectingUi::default());
    let dirs = build_dirs();
    let mut ctx = build_context(driver, ui, &dirs);
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut pipeline = Pipeline::new(vec![
        Box::new(ProbeStep::halting("first", log.clone())),
        Box::new(ProbeStep::new("second", log.clone())),
    ]);
    let action = pipeline.run(&mut ctx).await;

    assert_eq!(action, StepAction::Halt);
    assert_eq!(
        log.lock().unwrap().clone(),
        vec![
            "run:first".to_string(),
            "cleanup:second".to_string(),
            "cleanup:first".to_string(),
        ]
    );
}
