//! # Task Registry
//!
//! Fixed-capacity arena of task slots. A slot is either empty or holds
//! one descriptor together with its [`TaskHandle`]; a handle occupies at
//! most one slot.
//!
//! Slot order is dispatch order: within a tick, tasks in lower slots are
//! checked (and run, if due) first. New tasks go into the first empty
//! slot, so a task registered after a removal may take the freed,
//! earlier position.
//!
//! The registry is only changed during initialization. Once the
//! scheduler starts it owns the registry, so no registration can race a
//! dispatch pass.

use crate::error::KernelError;
use crate::task::{TaskDescriptor, TaskHandle, TaskInfo};

struct Slot<'a> {
    handle: TaskHandle,
    descriptor: TaskDescriptor<'a>,
}

pub struct Registry<'a, const N: usize> {
    slots: [Option<Slot<'a>>; N],
}

impl<'a, const N: usize> Registry<'a, N> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Register `descriptor` under `handle`.
    ///
    /// If `handle` is already registered, its slot is updated in place
    /// (task, name, period and enabled flag replaced, last run kept) and
    /// the slot count does not change. Otherwise the task takes the first
    /// empty slot with `now` as its last run, so it first becomes due
    /// `period + 1` ticks later.
    ///
    /// # Returns
    /// - `Ok(slot)`: index of the slot holding the task
    /// - `Err(KernelError::RegistryFull)`: no empty slot left
    pub fn register(
        &mut self,
        handle: TaskHandle,
        descriptor: TaskDescriptor<'a>,
        now: u32,
    ) -> Result<usize, KernelError> {
        if let Some(index) = self.position(handle) {
            if let Some(slot) = self.slots[index].as_mut() {
                let last_run = slot.descriptor.last_run;
                let runs = slot.descriptor.runs;
                slot.descriptor = descriptor;
                slot.descriptor.last_run = last_run;
                slot.descriptor.runs = runs;
            }
            return Ok(index);
        }

        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(KernelError::RegistryFull)?;

        let mut descriptor = descriptor;
        descriptor.last_run = now;
        descriptor.runs = 0;
        self.slots[index] = Some(Slot { handle, descriptor });
        Ok(index)
    }

    /// Empty the slot holding `handle`. Other slots keep their positions.
    pub fn remove(&mut self, handle: TaskHandle) -> Result<(), KernelError> {
        let index = self.position(handle).ok_or(KernelError::NotFound)?;
        self.slots[index] = None;
        Ok(())
    }

    /// Enable or disable a registered task without giving up its slot.
    pub fn set_enabled(&mut self, handle: TaskHandle, enabled: bool) -> Result<(), KernelError> {
        let descriptor = self.descriptor_mut(handle).ok_or(KernelError::NotFound)?;
        descriptor.enabled = enabled;
        Ok(())
    }

    /// Visit occupied slots in slot order.
    pub fn for_each_occupied<F>(&mut self, mut visitor: F)
    where
        F: FnMut(TaskHandle, &mut TaskDescriptor<'a>),
    {
        for slot in self.slots.iter_mut().flatten() {
            visitor(slot.handle, &mut slot.descriptor);
        }
    }

    pub fn contains(&self, handle: TaskHandle) -> bool {
        self.position(handle).is_some()
    }

    pub fn info(&self, handle: TaskHandle) -> Option<TaskInfo> {
        self.position(handle)
            .and_then(|index| self.slots[index].as_ref())
            .map(|slot| slot.descriptor.info())
    }

    /// Diagnostic snapshots of the occupied slots, in slot order.
    pub fn iter_info(&self) -> impl Iterator<Item = (TaskHandle, TaskInfo)> + use<'_, 'a, N> {
        self.slots
            .iter()
            .flatten()
            .map(|slot| (slot.handle, slot.descriptor.info()))
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    fn position(&self, handle: TaskHandle) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some(s) if s.handle == handle))
    }

    fn descriptor_mut(&mut self, handle: TaskHandle) -> Option<&mut TaskDescriptor<'a>> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|slot| slot.handle == handle)
            .map(|slot| &mut slot.descriptor)
    }
}

impl<'a, const N: usize> Default for Registry<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A: TaskHandle = TaskHandle::new(1);
    const B: TaskHandle = TaskHandle::new(2);
    const C: TaskHandle = TaskHandle::new(3);
    const D: TaskHandle = TaskHandle::new(4);

    #[test]
    fn test_fills_to_capacity_then_full() {
        let (mut a, mut b, mut c, mut d) = (|| {}, || {}, || {}, || {});
        let mut registry: Registry<'_, 3> = Registry::new();

        assert_eq!(registry.register(A, TaskDescriptor::new(&mut a, 5), 0), Ok(0));
        assert_eq!(registry.register(B, TaskDescriptor::new(&mut b, 25), 0), Ok(1));
        assert_eq!(registry.register(C, TaskDescriptor::new(&mut c, 1000), 0), Ok(2));
        assert!(registry.is_full());

        assert_eq!(
            registry.register(D, TaskDescriptor::new(&mut d, 1), 0),
            Err(KernelError::RegistryFull)
        );
        assert_eq!(registry.len(), 3);
        assert!(!registry.contains(D));
    }

    #[test]
    fn test_reregister_is_idempotent() {
        let (mut a, mut again) = (|| {}, || {});
        let mut registry: Registry<'_, 3> = Registry::new();

        registry.register(A, TaskDescriptor::new(&mut a, 5), 7).unwrap();
        let slot = registry
            .register(A, TaskDescriptor::new(&mut again, 9).with_name("a"), 50)
            .unwrap();

        assert_eq!(slot, 0);
        assert_eq!(registry.len(), 1);

        let info = registry.info(A).unwrap();
        assert_eq!(info.period, 9);
        assert_eq!(info.name, Some("a"));
        // Last run is untouched by the update
        assert_eq!(info.last_run, 7);
    }

    #[test]
    fn test_reregister_succeeds_when_full() {
        let (mut a, mut b, mut again) = (|| {}, || {}, || {});
        let mut registry: Registry<'_, 2> = Registry::new();
        registry.register(A, TaskDescriptor::new(&mut a, 1), 0).unwrap();
        registry.register(B, TaskDescriptor::new(&mut b, 1), 0).unwrap();

        assert_eq!(registry.register(B, TaskDescriptor::new(&mut again, 4), 0), Ok(1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let (mut a, mut b) = (|| {}, || {});
        let mut registry: Registry<'_, 3> = Registry::new();
        registry.register(A, TaskDescriptor::new(&mut a, 5), 0).unwrap();
        registry.register(B, TaskDescriptor::new(&mut b, 6), 0).unwrap();

        assert_eq!(registry.remove(C), Err(KernelError::NotFound));

        let handles: std::vec::Vec<_> = registry.iter_info().map(|(h, _)| h).collect();
        assert_eq!(handles, [A, B]);
        assert_eq!(registry.info(B).unwrap().period, 6);
    }

    #[test]
    fn test_remove_frees_slot_for_reuse() {
        let (mut a, mut b, mut c) = (|| {}, || {}, || {});
        let mut registry: Registry<'_, 2> = Registry::new();
        registry.register(A, TaskDescriptor::new(&mut a, 1), 0).unwrap();
        registry.register(B, TaskDescriptor::new(&mut b, 1), 0).unwrap();

        registry.remove(A).unwrap();
        assert!(!registry.contains(A));
        assert_eq!(registry.remove(A), Err(KernelError::NotFound));

        // First empty slot is the one A left behind
        assert_eq!(registry.register(C, TaskDescriptor::new(&mut c, 1), 0), Ok(0));
        let handles: std::vec::Vec<_> = registry.iter_info().map(|(h, _)| h).collect();
        assert_eq!(handles, [C, B]);
    }

    #[test]
    fn test_set_enabled() {
        let mut a = || {};
        let mut registry: Registry<'_, 1> = Registry::new();
        registry.register(A, TaskDescriptor::new(&mut a, 1), 0).unwrap();

        registry.set_enabled(A, false).unwrap();
        assert!(!registry.info(A).unwrap().enabled);
        assert_eq!(registry.set_enabled(B, true), Err(KernelError::NotFound));
    }

    #[test]
    fn test_for_each_occupied_in_slot_order() {
        let (mut a, mut b, mut c) = (|| {}, || {}, || {});
        let mut registry: Registry<'_, 4> = Registry::new();
        registry.register(C, TaskDescriptor::new(&mut c, 1), 0).unwrap();
        registry.register(A, TaskDescriptor::new(&mut a, 1), 0).unwrap();
        registry.register(B, TaskDescriptor::new(&mut b, 1), 0).unwrap();

        let mut seen = std::vec::Vec::new();
        registry.for_each_occupied(|handle, _| seen.push(handle));
        assert_eq!(seen, [C, A, B]);
    }

    fn periods<const N: usize>(registry: &Registry<'_, N>) -> std::vec::Vec<(TaskHandle, u32)> {
        registry.iter_info().map(|(handle, info)| (handle, info.period)).collect()
    }

    #[test]
    fn test_iter_info_reports_occupied_slots() {
        let (mut a, mut c) = (|| {}, || {});
        let mut registry: Registry<'_, 3> = Registry::new();
        registry.register(A, TaskDescriptor::new(&mut a, 5), 0).unwrap();
        registry.register(C, TaskDescriptor::new(&mut c, 1000), 0).unwrap();
        registry.remove(A).unwrap();

        assert_eq!(periods(&registry), [(C, 1000)]);
        assert!(periods(&Registry::<'_, 2>::new()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_slot_count_never_exceeds_capacity(ids in proptest::collection::vec(0u16..8, 0..32)) {
            let mut tasks: std::vec::Vec<_> = ids.iter().map(|_| || {}).collect();
            let mut registry: Registry<'_, 4> = Registry::new();
            let mut distinct = std::collections::BTreeSet::new();

            for (id, task) in ids.iter().zip(tasks.iter_mut()) {
                let handle = TaskHandle::new(*id);
                let result = registry.register(handle, TaskDescriptor::new(task, 1), 0);
                if distinct.contains(id) || distinct.len() < 4 {
                    prop_assert!(result.is_ok());
                    distinct.insert(*id);
                } else {
                    prop_assert_eq!(result, Err(KernelError::RegistryFull));
                }
                prop_assert_eq!(registry.len(), distinct.len());
            }
        }
    }
}
