//! Per-workspace overlay surfaces.
//!
//! One slot per cell of the output's workspace grid. Slots are created the
//! first time the switcher draws on that workspace and all of them are torn
//! down when the session ends.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridSize {
    pub columns: usize,
    pub rows: usize,
}

impl GridSize {
    pub const fn new(columns: usize, rows: usize) -> Self {
        GridSize { columns, rows }
    }

    fn cells(self) -> usize {
        self.columns * self.rows
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkspaceCoord {
    pub x: usize,
    pub y: usize,
}

impl WorkspaceCoord {
    pub const fn new(x: usize, y: usize) -> Self {
        WorkspaceCoord { x, y }
    }
}

#[derive(Debug)]
pub struct OverlayArena<T> {
    size: GridSize,
    slots: Vec<Option<T>>,
}

impl<T> Default for OverlayArena<T> {
    fn default() -> Self {
        OverlayArena {
            size: GridSize::default(),
            slots: Vec::new(),
        }
    }
}

impl<T> OverlayArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match the arena to the output's grid. Handles that no longer fit a
    /// changed grid are returned so the caller can destroy them.
    #[must_use]
    pub fn fit(&mut self, size: GridSize) -> Vec<T> {
        if size == self.size {
            return Vec::new();
        }
        let evicted = self.drain();
        self.size = size;
        self.slots = std::iter::repeat_with(|| None).take(size.cells()).collect();
        evicted
    }

    /// Handle for `coord`, creating it on first use. `None` when `coord`
    /// lies outside the grid.
    pub fn get_or_create(&mut self, coord: WorkspaceCoord, create: impl FnOnce() -> T) -> Option<&T> {
        let index = self.index(coord)?;
        let slot = &mut self.slots[index];
        if slot.is_none() {
            *slot = Some(create());
        }
        slot.as_ref()
    }

    pub fn get(&self, coord: WorkspaceCoord) -> Option<&T> {
        self.index(coord).and_then(|i| self.slots[i].as_ref())
    }

    /// Take every live handle out of the arena, leaving all slots empty.
    #[must_use]
    pub fn drain(&mut self) -> Vec<T> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn index(&self, coord: WorkspaceCoord) -> Option<usize> {
        if coord.x < self.size.columns && coord.y < self.size.rows {
            Some(coord.y * self.size.columns + coord.x)
        } else {
            None
        }
    }
}
