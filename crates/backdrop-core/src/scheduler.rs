//! Frame clock and priority-ordered per-frame callbacks.
//!
//! Everything runs on the render thread inside one frame tick. Callbacks with
//! a lower priority value run first; equal priorities keep registration order.

use crate::constants::{FRAME_DT_MAX, FRAME_DT_MIN};
use instant::Instant;

/// Documented priorities for the frame-coupled subsystems.
pub mod priority {
    /// Pointer correction must rewrite the pointer before anyone reads it.
    pub const POINTER_CORRECTION: i32 = -100;
    pub const LIGHT_ANIMATION: i32 = 0;
    pub const STAGE_PARAMETERS: i32 = 10;
    pub const HIT_TEST: i32 = 50;
    pub const RENDER: i32 = 100;
}

/// Frame timing snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    /// Seconds since the clock started (sum of clamped deltas).
    pub elapsed: f32,
    pub frame_index: u64,
}

impl FrameTime {
    pub fn at(elapsed: f32, frame_index: u64) -> Self {
        Self {
            dt: 0.0,
            elapsed,
            frame_index,
        }
    }
}

/// Produces [`FrameTime`] snapshots. Delta time is clamped so a debugger
/// pause or a minimized window does not make light paths jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: f32,
    frame_index: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            elapsed: 0.0,
            frame_index: 0,
        }
    }

    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        self.advance(dt)
    }

    /// Advances by an explicit delta (clamped like a real tick).
    pub fn advance(&mut self, dt: f32) -> FrameTime {
        let dt = dt.clamp(FRAME_DT_MIN, FRAME_DT_MAX);
        self.elapsed += dt;
        let ft = FrameTime {
            dt,
            elapsed: self.elapsed,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

pub type FrameCallback = Box<dyn FnMut(&FrameTime)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

struct Entry {
    id: CallbackId,
    priority: i32,
    label: &'static str,
    callback: FrameCallback,
}

#[derive(Default)]
pub struct FrameScheduler {
    entries: Vec<Entry>,
    next_id: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        label: &'static str,
        priority: i32,
        callback: impl FnMut(&FrameTime) + 'static,
    ) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        // insert after every entry with priority <= ours: stable for ties
        let at = self.entries.partition_point(|e| e.priority <= priority);
        self.entries.insert(
            at,
            Entry {
                id,
                priority,
                label,
                callback: Box::new(callback),
            },
        );
        log::debug!("[scheduler] registered `{}` at priority {}", label, priority);
        id
    }

    pub fn unregister(&mut self, id: CallbackId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before != self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels in execution order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.label).collect()
    }

    pub fn run(&mut self, time: &FrameTime) {
        for e in self.entries.iter_mut() {
            (e.callback)(time);
        }
    }
}
