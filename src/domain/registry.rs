use std::collections::HashMap;

use derive_more::Display;

use crate::domain::gesture::GestureController;
use crate::domain::window::WindowState;

/// Identity of one attached visualization: the slot it was found in and how
/// many times that slot has been attached before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "slot{}#{}", slot, generation)]
pub struct InstanceId {
    pub slot: usize,
    pub generation: u32,
}

impl InstanceId {
    pub fn new(slot: usize, generation: u32) -> Self {
        Self { slot, generation }
    }
}

/// Everything owned on behalf of one attached instance.
#[derive(Debug)]
pub struct InstanceRecord<T> {
    pub target: T,
    pub gesture: GestureController,
    /// Created on first interaction.
    pub window: Option<WindowState>,
}

#[derive(Debug)]
pub struct WindowRegistry<T> {
    records: HashMap<InstanceId, InstanceRecord<T>>,
}

impl<T> Default for WindowRegistry<T> {
    fn default() -> Self {
        Self { records: HashMap::new() }
    }
}

impl<T> WindowRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` and leaves the existing record untouched when `id` is
    /// already registered.
    pub fn insert(&mut self, id: InstanceId, target: T, gesture: GestureController) -> bool {
        if self.records.contains_key(&id) {
            return false;
        }
        self.records.insert(id, InstanceRecord { target, gesture, window: None });
        true
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<InstanceRecord<T>> {
        self.records.remove(&id)
    }

    pub fn get(&self, id: InstanceId) -> Option<&InstanceRecord<T>> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut InstanceRecord<T>> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self.records.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
