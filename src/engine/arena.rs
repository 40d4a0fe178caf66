//! Component arena - handle allocation for mounted instances.
//!
//! Manages the lifecycle of component handles:
//! - Slot storage indexed by handle
//! - Free slot pool for O(1) reuse
//! - Generation counter per slot so a recycled slot never aliases a
//!   retired handle that is still held somewhere (an `Updater`, a queue entry)

use std::fmt;

/// Stable handle to a mounted component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    index: u32,
    generation: u32,
}

impl ComponentId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational arena with a free list.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a slot. `build` receives the new handle.
    pub fn allocate(&mut self, build: impl FnOnce(ComponentId) -> T) -> ComponentId {
        // Reuse free slot or grow
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        let id = ComponentId {
            index,
            generation: slot.generation,
        };
        slot.value = Some(build(id));
        self.live += 1;
        id
    }

    /// Release a slot back to the pool, returning its value.
    ///
    /// Stale handles are ignored.
    pub fn release(&mut self, id: ComponentId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(value)
    }

    pub fn get(&self, id: ComponentId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated (live or free).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Handles of all live values.
    pub fn ids(&self) -> Vec<ComponentId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(index, slot)| ComponentId {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }
}
