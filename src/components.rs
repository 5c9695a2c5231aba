//! Components used by the demo scene

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ecs::{Component, Coordinator, Disposable, EcsResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub yaw: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl Transform {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            scale: 1.0,
            yaw: 0.0,
        }
    }
}

impl Component for Transform {}

/// One drawable part of a model
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPart {
    pub mesh: String,
    pub index_count: u32,
}

impl Component for MeshPart {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub radians_per_second: f32,
}

impl Component for Spin {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    pub remaining_seconds: f32,
}

impl Component for Lifetime {}

/// Tracks buffer handles handed out and given back
#[derive(Debug, Default)]
pub struct BufferLedger {
    next_handle: AtomicU32,
    allocated: AtomicUsize,
    released: AtomicUsize,
}

impl BufferLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn allocate(self: &Arc<Self>) -> GpuBuffers {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        self.allocated.fetch_add(1, Ordering::Relaxed);
        GpuBuffers {
            handle,
            ledger: Arc::clone(self),
            released: false,
        }
    }

    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }

    pub fn live(&self) -> usize {
        self.allocated() - self.released()
    }
}

/// Buffer handles for one mesh part; must be released through the store
#[derive(Debug)]
pub struct GpuBuffers {
    handle: u32,
    ledger: Arc<BufferLedger>,
    released: bool,
}

impl GpuBuffers {
    pub fn handle(&self) -> u32 {
        self.handle
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Component for GpuBuffers {}

impl Disposable for GpuBuffers {
    fn dispose(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.ledger.released.fetch_add(1, Ordering::Relaxed);
        trace!(handle = self.handle, "buffers released");
    }
}

/// Registers every demo component type with the coordinator.
pub fn register_all(coordinator: &mut Coordinator) -> EcsResult<()> {
    coordinator.register_simple_component::<Transform>()?;
    coordinator.register_simple_component::<MeshPart>()?;
    coordinator.register_disposable_component::<GpuBuffers>()?;
    coordinator.register_simple_component::<Spin>()?;
    coordinator.register_simple_component::<Lifetime>()?;
    Ok(())
}
