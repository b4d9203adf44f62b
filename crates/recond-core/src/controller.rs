//! Dynamic concurrency control from system load.
//!
//! The controller samples CPU and memory on a fixed period and nudges the
//! scheduler's budget one step at a time: down as soon as either metric
//! crosses the high threshold, up only after several consecutive samples
//! with both metrics under the hysteresis bar. The dead band between the
//! two keeps the budget from oscillating around the threshold.

use crate::config::ControllerConfig;
use crate::scheduler::Scheduler;
use std::sync::Arc;
use sysinfo::System;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One system load observation, both metrics as percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSample {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

/// Source of load samples. Production uses [`SysinfoProvider`]; tests
/// script a sequence.
pub trait MetricsProvider: Send {
    /// A fresh sample, or `None` when metrics are unavailable this round.
    fn sample(&mut self) -> Option<SystemSample>;
}

/// Samples the host via `sysinfo`.
pub struct SysinfoProvider {
    system: System,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let mut system = System::new();
        // Prime CPU counters; the first reading after creation is zero.
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self { system }
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for SysinfoProvider {
    fn sample(&mut self) -> Option<SystemSample> {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return None;
        }
        Some(SystemSample {
            cpu_percent: self.system.global_cpu_usage(),
            memory_percent: self.system.used_memory() as f32 / total as f32 * 100.0,
        })
    }
}

/// What one observation did to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Lowered,
    Raised,
    Held,
}

/// Periodically adjusts the scheduler's concurrency budget.
pub struct BudgetController {
    config: ControllerConfig,
    scheduler: Arc<Scheduler>,
    provider: Box<dyn MetricsProvider>,
    /// Consecutive samples with both metrics under the hysteresis bar.
    low_streak: u32,
}

impl BudgetController {
    pub fn new(
        config: ControllerConfig,
        scheduler: Arc<Scheduler>,
        provider: Box<dyn MetricsProvider>,
    ) -> Self {
        Self {
            config,
            scheduler,
            provider,
            low_streak: 0,
        }
    }

    /// Feed one sample through the control rule.
    pub fn observe(&mut self, sample: SystemSample) -> Adjustment {
        let high = self.config.high_threshold;
        let low_bar = high - self.config.hysteresis_margin;

        if sample.cpu_percent >= high || sample.memory_percent >= high {
            self.low_streak = 0;
            if self.scheduler.lower_budget() {
                info!(
                    cpu = sample.cpu_percent,
                    memory = sample.memory_percent,
                    budget = self.scheduler.budget().current,
                    "load high, budget lowered"
                );
                return Adjustment::Lowered;
            }
            debug!(cpu = sample.cpu_percent, memory = sample.memory_percent, "load high, budget at floor");
            return Adjustment::Held;
        }

        if sample.cpu_percent < low_bar && sample.memory_percent < low_bar {
            self.low_streak += 1;
            if self.low_streak >= self.config.raise_after_samples {
                self.low_streak = 0;
                if self.scheduler.raise_budget() {
                    info!(
                        cpu = sample.cpu_percent,
                        memory = sample.memory_percent,
                        budget = self.scheduler.budget().current,
                        "load low, budget raised"
                    );
                    return Adjustment::Raised;
                }
            }
        } else {
            // Dead band: neither high nor convincingly low.
            self.low_streak = 0;
        }
        Adjustment::Held
    }

    /// Sampling loop; exits on shutdown. A no-op when disabled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        if !self.config.enabled {
            info!("budget controller disabled");
            return;
        }
        info!(
            period = ?self.config.period,
            high_threshold = self.config.high_threshold,
            "budget controller started"
        );
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.period) => {}
            }
            match self.provider.sample() {
                Some(sample) => {
                    self.observe(sample);
                }
                None => warn!("system metrics unavailable, budget held"),
            }
        }
        info!("budget controller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconConfig;
    use crate::gate::ToolGate;
    use crate::pipeline::PipelineContext;
    use crate::storage::MemoryStore;
    use crate::tools::ProcessInvoker;

    struct Scripted(Vec<SystemSample>);

    impl MetricsProvider for Scripted {
        fn sample(&mut self) -> Option<SystemSample> {
            if self.0.is_empty() {
                None
            } else {
                Some(self.0.remove(0))
            }
        }
    }

    fn sample(cpu: f32, memory: f32) -> SystemSample {
        SystemSample {
            cpu_percent: cpu,
            memory_percent: memory,
        }
    }

    fn test_scheduler(initial: usize, min: usize, max: usize) -> Arc<Scheduler> {
        let mut config = ReconConfig::default();
        config.scheduler.initial_jobs = initial;
        config.scheduler.min_jobs = min;
        config.scheduler.max_jobs = max;
        let config = Arc::new(config);
        Scheduler::new(PipelineContext {
            store: Arc::new(MemoryStore::default()),
            gate: ToolGate::new(config.tools.clone()),
            invoker: Arc::new(ProcessInvoker),
            config,
        })
    }

    fn test_controller(scheduler: Arc<Scheduler>) -> BudgetController {
        BudgetController::new(
            ControllerConfig::default(),
            scheduler,
            Box::new(Scripted(Vec::new())),
        )
    }

    #[tokio::test]
    async fn high_load_lowers_immediately() {
        let scheduler = test_scheduler(4, 1, 8);
        let mut controller = test_controller(scheduler.clone());

        assert_eq!(controller.observe(sample(90.0, 20.0)), Adjustment::Lowered);
        assert_eq!(scheduler.budget().current, 3);

        // Memory alone is enough to lower.
        assert_eq!(controller.observe(sample(10.0, 95.0)), Adjustment::Lowered);
        assert_eq!(scheduler.budget().current, 2);
    }

    #[tokio::test]
    async fn lowering_stops_at_floor() {
        let scheduler = test_scheduler(1, 1, 8);
        let mut controller = test_controller(scheduler.clone());

        assert_eq!(controller.observe(sample(99.0, 99.0)), Adjustment::Held);
        assert_eq!(scheduler.budget().current, 1);
    }

    #[tokio::test]
    async fn raise_requires_consecutive_low_samples() {
        let scheduler = test_scheduler(2, 1, 8);
        let mut controller = test_controller(scheduler.clone());

        assert_eq!(controller.observe(sample(10.0, 10.0)), Adjustment::Held);
        assert_eq!(controller.observe(sample(10.0, 10.0)), Adjustment::Held);
        assert_eq!(controller.observe(sample(10.0, 10.0)), Adjustment::Raised);
        assert_eq!(scheduler.budget().current, 3);

        // The streak starts over after a raise.
        assert_eq!(controller.observe(sample(10.0, 10.0)), Adjustment::Held);
    }

    #[tokio::test]
    async fn dead_band_resets_the_streak() {
        // Defaults: high 85, margin 15, so the low bar is 70.
        let scheduler = test_scheduler(2, 1, 8);
        let mut controller = test_controller(scheduler.clone());

        controller.observe(sample(10.0, 10.0));
        controller.observe(sample(10.0, 10.0));
        // In the dead band: not high, not low. Streak resets.
        assert_eq!(controller.observe(sample(75.0, 10.0)), Adjustment::Held);
        assert_eq!(controller.observe(sample(10.0, 10.0)), Adjustment::Held);
        assert_eq!(controller.observe(sample(10.0, 10.0)), Adjustment::Held);
        assert_eq!(controller.observe(sample(10.0, 10.0)), Adjustment::Raised);
    }

    #[tokio::test]
    async fn raise_stops_at_ceiling() {
        let scheduler = test_scheduler(3, 1, 3);
        let mut controller = test_controller(scheduler.clone());

        for _ in 0..6 {
            assert_eq!(controller.observe(sample(5.0, 5.0)), Adjustment::Held);
        }
        assert_eq!(scheduler.budget().current, 3);
    }
}
