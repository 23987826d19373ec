//! Layout node pool.
//!
//! Block formatting contexts are checked out of a generational arena when
//! they open and returned when they close. Contexts refer to their parent by
//! [`BlockId`] instead of a back-pointer, and a stale id is detected by its
//! generation. The arena keeps its slots between passes so steady-state
//! layout does not allocate contexts.

use super::block::BlockContainer;

/// Generational handle to a checked-out [`BlockContainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    value: Option<BlockContainer>,
    next_free: Option<u32>,
}

/// Checkout/release storage for block formatting contexts.
#[derive(Default)]
pub struct LayoutArena {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    live: usize,
}

impl LayoutArena {
    /// An empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            live: 0,
        }
    }

    /// Store `block` in a free slot (or a new one) and hand out its id.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` contexts are open at once.
    pub fn checkout(&mut self, block: BlockContainer) -> BlockId {
        self.live += 1;
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            self.free_head = slot.next_free.take();
            slot.value = Some(block);
            return BlockId {
                index,
                generation: slot.generation,
            };
        }
        let Ok(index) = u32::try_from(self.slots.len()) else {
            panic!("layout arena exhausted");
        };
        self.slots.push(Slot {
            generation: 0,
            value: Some(block),
            next_free: None,
        });
        BlockId {
            index,
            generation: 0,
        }
    }

    /// Return a context to the pool. Each id is released exactly once.
    ///
    /// # Panics
    /// Panics on a stale or already released id.
    pub fn release(&mut self, id: BlockId) -> BlockContainer {
        let next_free = self.free_head;
        let slot = self.live_slot_mut(id);
        let Some(block) = slot.value.take() else {
            unreachable!("live slot without a value");
        };
        slot.generation = slot.generation.wrapping_add(1);
        slot.next_free = next_free;
        self.free_head = Some(id.index);
        self.live -= 1;
        block
    }

    /// Borrow a checked-out context.
    ///
    /// # Panics
    /// Panics on a stale id.
    #[must_use]
    pub fn get(&self, id: BlockId) -> &BlockContainer {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
            .unwrap_or_else(|| panic!("stale layout context handle {id:?}"))
    }

    /// Mutably borrow a checked-out context.
    ///
    /// # Panics
    /// Panics on a stale id.
    pub fn get_mut(&mut self, id: BlockId) -> &mut BlockContainer {
        self.live_slot_mut(id)
            .value
            .as_mut()
            .unwrap_or_else(|| panic!("stale layout context handle {id:?}"))
    }

    /// Borrow a child context and its parent at the same time.
    ///
    /// # Panics
    /// Panics if either id is stale or both are the same.
    pub fn pair_mut(
        &mut self,
        child: BlockId,
        parent: BlockId,
    ) -> (&mut BlockContainer, &mut BlockContainer) {
        assert_ne!(child.index, parent.index, "a context is not its own parent");
        let _ = self.get(child);
        let _ = self.get(parent);
        let (low, high) = (child.index.min(parent.index), child.index.max(parent.index));
        let (head, tail) = self.slots.split_at_mut(high as usize);
        let (low_slot, high_slot) = (&mut head[low as usize], &mut tail[0]);
        let (Some(low_block), Some(high_block)) = (low_slot.value.as_mut(), high_slot.value.as_mut())
        else {
            unreachable!("checked above");
        };
        if child.index < parent.index {
            (low_block, high_block)
        } else {
            (high_block, low_block)
        }
    }

    /// `true` if `id` refers to a checked-out context.
    #[must_use]
    pub fn contains(&self, id: BlockId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.value.is_some())
    }

    /// Number of contexts currently checked out.
    #[must_use]
    pub const fn live_blocks(&self) -> usize {
        self.live
    }

    /// Number of slots ever allocated.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn live_slot_mut(&mut self, id: BlockId) -> &mut Slot {
        match self.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation && slot.value.is_some() => slot,
            _ => panic!("stale layout context handle {id:?}"),
        }
    }
}
