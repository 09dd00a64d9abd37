use anyhow::Result;
use serde::Deserialize;

use crate::frame::FrameInfo;

/// One animated object's per-frame state advance
pub type Task = Box<dyn FnMut(&FrameInfo) -> Result<()>>;

/// Invoked exactly once per tick, after every task has run
pub trait RenderHook {
    fn render(&mut self, frame: &FrameInfo) -> Result<()>;
}

/// What a failing task does to the rest of its tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the error, skip that task for this tick and keep going
    #[default]
    LogAndSkip,
    /// Abort the tick (no render), stop the scheduler and return the error
    Halt,
}

/// Summary of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub tasks_run: usize,
    pub failures: usize,
    pub rendered: bool,
}

impl TickReport {
    /// Report for a tick that did nothing because the loop is not running
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Drives registered tasks then a single render, once per display refresh
pub struct FrameScheduler<H: RenderHook> {
    tasks: Vec<Task>,
    hook: H,
    policy: FailurePolicy,
    running: bool,
}

impl<H: RenderHook> FrameScheduler<H> {
    pub fn new(hook: H) -> Self {
        Self {
            tasks: Vec::new(),
            hook,
            policy: FailurePolicy::default(),
            running: false,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Append a task. Registration while running takes effect on the next tick.
    pub fn register<F>(&mut self, task: F)
    where
        F: FnMut(&FrameInfo) -> Result<()> + 'static,
    {
        self.tasks.push(Box::new(task));
        log::debug!("registered task #{}", self.tasks.len());
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Begin ticking. Returns `false` if the loop was already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            log::warn!("frame scheduler already running, ignoring start");
            return false;
        }
        self.running = true;
        log::info!("frame scheduler started with {} task(s)", self.tasks.len());
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run every task in registration order, then render once
    pub fn tick(&mut self, frame: &FrameInfo) -> Result<TickReport> {
        if !self.running {
            return Ok(TickReport::idle());
        }

        let mut report = TickReport::default();

        for (index, task) in self.tasks.iter_mut().enumerate() {
            report.tasks_run += 1;

            if let Err(err) = task(frame) {
                match self.policy {
                    FailurePolicy::Halt => {
                        self.running = false;
                        return Err(err.context(format!(
                            "task #{} failed on frame {}, animation halted",
                            index, frame.number
                        )));
                    }
                    FailurePolicy::LogAndSkip => {
                        report.failures += 1;
                        log::warn!("task #{} failed on frame {}: {:#}", index, frame.number, err);
                    }
                }
            }
        }

        self.hook.render(frame)?;
        report.rendered = true;

        Ok(report)
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn hook_mut(&mut self) -> &mut H {
        &mut self.hook
    }
}
