//! Late-bound access to the host's graphics device.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use retex_common::DeviceContext;

/// Capability handle through which jobs resolve the current device.
///
/// The host may replace its device between job submission and execution, so
/// submitting code never captures a [`DeviceContext`]; it hands the job a
/// `DeviceSlot` and the worker resolves [`current`](Self::current) at
/// execution time. The slot holds one reference to the stored device until
/// it is replaced or cleared.
#[derive(Clone, Default)]
pub struct DeviceSlot {
    inner: Arc<ArcSwapOption<DeviceContext>>,
}

impl DeviceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The device as of this instant, if the host has provided one.
    pub fn current(&self) -> Option<Arc<DeviceContext>> {
        self.inner.load_full()
    }

    /// Install or replace the device.
    pub fn store(&self, device: Arc<DeviceContext>) {
        self.inner.store(Some(device));
    }

    /// Drop the held device reference.
    pub fn clear(&self) {
        self.inner.store(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_starts_empty() {
        let slot = DeviceSlot::new();
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_replacement_visible_through_clones() {
        let slot = DeviceSlot::new();
        let observer = slot.clone();

        slot.store(Arc::new(DeviceContext::new(1u32)));
        let first = observer.current().unwrap();
        assert_eq!(first.get::<u32>(), Some(&1));

        slot.store(Arc::new(DeviceContext::new(2u32)));
        let second = observer.current().unwrap();
        assert_eq!(second.get::<u32>(), Some(&2));

        slot.clear();
        assert!(observer.current().is_none());
    }
}
