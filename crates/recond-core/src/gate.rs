//! Per-tool admission control with bounded FIFO waiting.
//!
//! Each external tool has an independent capacity and wait-queue depth, so a
//! saturated tool never blocks steps that use other tools. Waiters are served
//! strictly FIFO; once the wait queue is full, further acquires fail
//! immediately with `QueueFull` instead of queuing unboundedly.

use crate::config::ToolsConfig;
use crate::error::{ReconError, ReconResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::trace;

/// Per-tool concurrency limiter with a bounded FIFO wait queue.
#[derive(Clone)]
pub struct ToolGate {
    inner: Arc<GateInner>,
}

struct GateInner {
    limits: ToolsConfig,
    tools: Mutex<HashMap<String, ToolState>>,
}

struct ToolState {
    capacity: usize,
    max_waiters: usize,
    in_use: usize,
    waiters: VecDeque<oneshot::Sender<ToolPermit>>,
}

/// One admitted concurrent execution of a tool. Dropping the permit releases
/// the slot, so release happens on every exit path.
pub struct ToolPermit {
    gate: Arc<GateInner>,
    tool: String,
    armed: bool,
}

impl ToolGate {
    pub fn new(limits: ToolsConfig) -> Self {
        Self {
            inner: Arc::new(GateInner {
                limits,
                tools: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Acquire a slot for `tool`.
    ///
    /// Admits immediately while the in-use count is below capacity, parks the
    /// caller FIFO while the wait queue has room, and fails with `QueueFull`
    /// once it does not.
    pub async fn acquire(&self, tool: &str) -> ReconResult<ToolPermit> {
        let rx = {
            let mut tools = self.inner.tools.lock();
            let state = tools
                .entry(tool.to_string())
                .or_insert_with(|| ToolState::new(&self.inner.limits, tool));

            if state.in_use < state.capacity {
                state.in_use += 1;
                trace!(tool, in_use = state.in_use, "tool slot acquired");
                return Ok(ToolPermit {
                    gate: Arc::clone(&self.inner),
                    tool: tool.to_string(),
                    armed: true,
                });
            }
            if state.waiters.len() >= state.max_waiters {
                return Err(ReconError::QueueFull {
                    tool: tool.to_string(),
                });
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            trace!(tool, waiting = state.waiters.len(), "tool slot wait");
            rx
        };

        rx.await
            .map_err(|_| ReconError::invariant(format!("tool gate dropped waiter for '{tool}'")))
    }

    /// Current in-use count for a tool.
    pub fn in_use(&self, tool: &str) -> usize {
        self.inner
            .tools
            .lock()
            .get(tool)
            .map(|s| s.in_use)
            .unwrap_or(0)
    }

    /// Current wait-queue length for a tool.
    pub fn waiting(&self, tool: &str) -> usize {
        self.inner
            .tools
            .lock()
            .get(tool)
            .map(|s| s.waiters.len())
            .unwrap_or(0)
    }
}

impl ToolState {
    fn new(limits: &ToolsConfig, tool: &str) -> Self {
        let l = limits.limits_for(tool);
        Self {
            capacity: l.capacity,
            max_waiters: l.queue_depth,
            in_use: 0,
            waiters: VecDeque::new(),
        }
    }
}

impl GateInner {
    /// Free a slot: hand it to the longest waiter still listening, otherwise
    /// decrement the in-use count.
    fn release(self: &Arc<Self>, tool: &str) {
        let mut tools = self.tools.lock();
        let Some(state) = tools.get_mut(tool) else {
            return;
        };
        while let Some(tx) = state.waiters.pop_front() {
            let permit = ToolPermit {
                gate: Arc::clone(self),
                tool: tool.to_string(),
                armed: true,
            };
            match tx.send(permit) {
                // Slot handed off; in_use is unchanged because the new
                // holder replaces the old one.
                Ok(()) => {
                    trace!(tool, "tool slot handed off");
                    return;
                }
                // Waiter gave up (future dropped). Disarm the returned permit
                // so dropping it here neither re-locks this mutex nor keeps a
                // gate handle alive.
                Err(mut unclaimed) => {
                    unclaimed.armed = false;
                }
            }
        }
        state.in_use -= 1;
        trace!(tool, in_use = state.in_use, "tool slot released");
    }
}

impl Drop for ToolPermit {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let gate = Arc::clone(&self.gate);
        gate.release(&self.tool);
    }
}
