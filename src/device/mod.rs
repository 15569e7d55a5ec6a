//! Software rendering device.
//!
//! Models the GPU contract the kernel is written against: textures are
//! allocated through a [`Device`] with a tracked budget, samplers are explicit
//! descriptors handed to the kernel, and every allocation is released when its
//! owner drops, on all exit paths.

mod texture;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use thiserror::Error;

pub use texture::{Filter, SamplerDesc, Tex1D, Tex3D, Texel};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device unavailable: {0}")]
    Unavailable(&'static str),

    #[error("out of device memory: requested {requested} B, free {free} B")]
    OutOfMemory { requested: usize, free: usize },
}

#[derive(Debug)]
struct DeviceInner {
    /// `None` means an unbounded budget.
    capacity: Option<usize>,
    used: AtomicUsize,
    parallelism: usize,
}

/// Handle to the software device. Cheap to clone; all clones share one budget.
#[derive(Debug, Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    pub fn new() -> Result<Device, DeviceError> {
        Self::bring_up(None)
    }

    /// Device with a fixed memory budget, in bytes. Allocation beyond the
    /// budget fails the way a real device allocation does.
    pub fn with_memory_limit(bytes: usize) -> Result<Device, DeviceError> {
        Self::bring_up(Some(bytes))
    }

    fn bring_up(capacity: Option<usize>) -> Result<Device, DeviceError> {
        let parallelism = std::thread::available_parallelism()
            .map_err(|_| DeviceError::Unavailable("cannot query available parallelism"))?
            .get();

        log::info!(
            "device up: {parallelism} lanes, budget {}",
            match capacity {
                Some(b) => format!("{b} B"),
                None => "unbounded".into(),
            }
        );

        Ok(Device {
            inner: Arc::new(DeviceInner {
                capacity,
                used: AtomicUsize::new(0),
                parallelism,
            }),
        })
    }

    pub fn used_bytes(&self) -> usize {
        self.inner.used.load(Ordering::Relaxed)
    }

    pub fn free_bytes(&self) -> Option<usize> {
        self.inner
            .capacity
            .map(|cap| cap.saturating_sub(self.used_bytes()))
    }

    pub fn parallelism(&self) -> usize {
        self.inner.parallelism
    }

    pub(crate) fn allocate(&self, bytes: usize) -> Result<Allocation, DeviceError> {
        let inner = &self.inner;
        let mut used = inner.used.load(Ordering::Relaxed);
        loop {
            if let Some(cap) = inner.capacity {
                if used + bytes > cap {
                    return Err(DeviceError::OutOfMemory {
                        requested: bytes,
                        free: cap.saturating_sub(used),
                    });
                }
            }
            match inner.used.compare_exchange_weak(
                used,
                used + bytes,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => used = actual,
            }
        }
        Ok(Allocation {
            inner: self.inner.clone(),
            bytes,
        })
    }
}

/// RAII guard for a slice of device memory. Dropping it returns the bytes
/// to the budget, which is what guarantees rollback on failed multi-frame
/// uploads and release on teardown.
#[derive(Debug)]
pub(crate) struct Allocation {
    inner: Arc<DeviceInner>,
    bytes: usize,
}

impl Drop for Allocation {
    fn drop(&mut self) {
        self.inner.used.fetch_sub(self.bytes, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn budget_is_enforced() {
        let device = Device::with_memory_limit(100).unwrap();

        let a = device.allocate(60).unwrap();
        assert_eq!(device.used_bytes(), 60);

        let denied = device.allocate(60);
        assert!(matches!(
            denied,
            Err(DeviceError::OutOfMemory {
                requested: 60,
                free: 40
            })
        ));

        drop(a);
        assert_eq!(device.used_bytes(), 0);
        assert!(device.allocate(100).is_ok());
    }

    #[test]
    fn unbounded_never_fails() {
        let device = Device::new().unwrap();
        let _a = device.allocate(usize::MAX / 4).unwrap();
        assert!(device.free_bytes().is_none());
    }
}
