//! Resource meter: call-stack depth, loop iteration counters, and an additive
//! memory approximation. Exceeding any limit aborts execution with a
//! canonical error message; the meter never decrements within an
//! evaluation — it is a monotonic ceiling check.

use crate::error::Error;
use crate::Result;

/// Heuristic memory cost constants, exposed so embedders can reason about
/// or override the cost model. Grounded in the cost shape the crate's
/// sandbox execution config already used for its own resource accounting,
/// scaled down since tests assert monotonic growth rather than exact bytes.
pub const BASE_OBJECT_COST: usize = 32;
pub const PER_SLOT_COST: usize = 8;
pub const PER_CHAR_COST: usize = 1;

#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    pub max_call_stack_depth: usize,
    pub max_loop_iterations: u64,
    pub max_memory: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self { max_call_stack_depth: 1000, max_loop_iterations: 1_000_000, max_memory: 64 * 1024 * 1024 }
    }
}

/// Per-call resource accounting. A fresh `ResourceMeter` is created for each
/// top-level `evaluate`/`evaluate_async` call; it does not persist across calls.
pub struct ResourceMeter {
    limits: ResourceLimits,
    call_stack_depth: usize,
    memory: usize,
}

impl ResourceMeter {
    pub fn new(limits: ResourceLimits) -> Self {
        Self { limits, call_stack_depth: 0, memory: 0 }
    }

    /// Called on entry into any sandbox-body frame, including generator
    /// resumption when it pushes a frame. Returns a guard that decrements on
    /// drop, so depth is restored on every exit path (normal return, thrown
    /// error, or a control-flow signal unwinding through `?`).
    pub fn enter_call(&mut self) -> Result<CallDepthGuard<'_>> {
        self.call_stack_depth += 1;
        if self.call_stack_depth > self.limits.max_call_stack_depth {
            self.call_stack_depth -= 1;
            tracing::warn!(target: "resource_meter", depth = self.call_stack_depth, limit = self.limits.max_call_stack_depth, "call stack depth exceeded");
            return Err(Error::max_call_stack_exceeded());
        }
        tracing::trace!(target: "resource_meter", depth = self.call_stack_depth, "enter call");
        Ok(CallDepthGuard { meter: self })
    }

    pub fn call_stack_depth(&self) -> usize {
        self.call_stack_depth
    }

    /// Checked once per loop iteration by the statement walker, which keeps
    /// its own local counter per loop execution — the counter resets on
    /// entry and is per-loop, not global.
    pub fn check_loop_iteration(&self, iterations: u64) -> Result<()> {
        if iterations > self.limits.max_loop_iterations {
            tracing::warn!(target: "resource_meter", iterations, limit = self.limits.max_loop_iterations, "loop iteration limit exceeded");
            Err(Error::max_loop_iterations_exceeded())
        } else {
            Ok(())
        }
    }

    pub fn charge(&mut self, amount: usize) -> Result<()> {
        self.memory += amount;
        if self.memory > self.limits.max_memory {
            tracing::warn!(target: "resource_meter", used = self.memory, limit = self.limits.max_memory, "memory limit exceeded");
            Err(Error::max_memory_exceeded())
        } else {
            Ok(())
        }
    }

    pub fn charge_object(&mut self, slot_count: usize) -> Result<()> {
        self.charge(BASE_OBJECT_COST + slot_count * PER_SLOT_COST)
    }

    pub fn charge_string(&mut self, len: usize) -> Result<()> {
        self.charge(len * PER_CHAR_COST)
    }

    pub fn memory_used(&self) -> usize {
        self.memory
    }
}

/// RAII guard decrementing `call_stack_depth` on drop, so depth is restored
/// on every exit path.
pub struct CallDepthGuard<'a> {
    meter: &'a mut ResourceMeter,
}

impl Drop for CallDepthGuard<'_> {
    fn drop(&mut self) {
        self.meter.call_stack_depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_depth_restored_after_guard_drop() {
        let mut meter = ResourceMeter::new(ResourceLimits::default());
        {
            let _g = meter.enter_call().unwrap();
            assert_eq!(meter.call_stack_depth(), 1);
        }
        assert_eq!(meter.call_stack_depth(), 0);
    }

    #[test]
    fn call_depth_limit_trips() {
        let mut meter = ResourceMeter::new(ResourceLimits { max_call_stack_depth: 2, ..Default::default() });
        let _g1 = meter.enter_call().unwrap();
        let _g2 = meter.enter_call().unwrap();
        assert!(meter.enter_call().is_err());
    }

    #[test]
    fn memory_never_decrements() {
        let mut meter = ResourceMeter::new(ResourceLimits { max_memory: 1000, ..Default::default() });
        meter.charge(500).unwrap();
        meter.charge(400).unwrap();
        assert_eq!(meter.memory_used(), 900);
        assert!(meter.charge(200).is_err());
    }
}
