//! Per-depth record of selections, restored when leaving a directory.

/// Bounded stack of selected indices, one per directory depth.
///
/// Past `capacity` the depth keeps counting but nothing is recorded, so
/// leaving those levels restores nothing while shallower levels stay intact.
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    slots: Vec<i32>,
    depth: usize,
    capacity: usize,
}

impl NavigationHistory {
    pub fn new(capacity: usize) -> Self {
        NavigationHistory {
            slots: Vec::with_capacity(capacity),
            depth: 0,
            capacity,
        }
    }

    pub fn push(&mut self, selected: i32) {
        if self.depth < self.capacity {
            self.slots.push(selected);
        }
        self.depth += 1;
    }

    /// Selection recorded for the level being left, if any.
    pub fn pop(&mut self) -> Option<i32> {
        if self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        if self.depth < self.capacity {
            self.slots.pop()
        } else {
            None
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn reset(&mut self) {
        self.slots.clear();
        self.depth = 0;
    }
}
