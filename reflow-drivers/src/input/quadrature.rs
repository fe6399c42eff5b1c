//! Interrupt-safe quadrature accumulator
//!
//! The phase-change interrupt calls [`QuadratureCounter::on_transition`],
//! which only does a table lookup and an atomic add. The control loop
//! converts whole detents with [`QuadratureCounter::drain_detents`] inside
//! a critical section, so the read-compare-subtract sequence cannot be
//! interleaved with the handler.
//!
//! The counter is meant to live in a `static`:
//!
//! ```ignore
//! static ENCODER: QuadratureCounter = QuadratureCounter::new();
//!
//! #[interrupt]
//! fn IO_IRQ_BANK0() {
//!     ENCODER.on_transition(pin_a.is_high(), pin_b.is_high());
//! }
//! ```

use portable_atomic::{AtomicI32, AtomicU8, Ordering};

/// Quarter-step delta indexed by `(previous AB << 2) | current AB`
///
/// Valid Gray-code moves map to ±1; no-change and double-step
/// (ambiguous) transitions map to 0.
const TRANSITIONS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Phase state of a KY-040 style encoder resting on a detent (A and B high)
const REST_STATE: u8 = 0b11;

/// Signed quarter-step accumulator shared with the phase-change handler
pub struct QuadratureCounter {
    count: AtomicI32,
    phase: AtomicU8,
}

impl QuadratureCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicI32::new(0),
            phase: AtomicU8::new(REST_STATE),
        }
    }

    /// Record the current phase levels without counting
    pub fn seed(&self, a: bool, b: bool) {
        self.phase.store(encode(a, b), Ordering::Relaxed);
    }

    /// Handler side: account for a change on either phase line
    pub fn on_transition(&self, a: bool, b: bool) {
        let current = encode(a, b);
        let previous = self.phase.swap(current, Ordering::Relaxed);
        let delta = TRANSITIONS[(((previous << 2) | current) & 0x0f) as usize];
        if delta != 0 {
            self.count.fetch_add(delta as i32, Ordering::Relaxed);
        }
    }

    /// Loop side: remove whole detents from the accumulator
    ///
    /// Returns the signed detent count; a partial detent stays pending.
    pub fn drain_detents(&self, quarter_steps_per_detent: i32) -> i32 {
        let size = quarter_steps_per_detent.max(1);
        critical_section::with(|_| {
            let mut count = self.count.load(Ordering::Relaxed);
            let mut steps = 0;
            while count >= size {
                count -= size;
                steps += 1;
            }
            while count <= -size {
                count += size;
                steps -= 1;
            }
            self.count.store(count, Ordering::Relaxed);
            steps
        })
    }

    /// Quarter-steps not yet converted into detents
    pub fn pending(&self) -> i32 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for QuadratureCounter {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(a: bool, b: bool) -> u8 {
    ((a as u8) << 1) | b as u8
}
