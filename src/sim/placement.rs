//! Bounded-retry cell siting shared by obstacles, humans and consumables

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Half-open rectangle of cells: `min <= cell < max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl CellRect {
    /// The arena shrunk by `margin` cells on every side
    pub fn inset(cols: i32, rows: i32, margin: i32) -> Self {
        Self {
            min: IVec2::splat(margin),
            max: IVec2::new(cols - margin, rows - margin),
        }
    }

    #[inline]
    pub fn contains(&self, cell: IVec2) -> bool {
        cell.cmpge(self.min).all() && cell.cmplt(self.max).all()
    }

    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Clamp a cell into the rectangle
    pub fn clamp(&self, cell: IVec2) -> IVec2 {
        cell.clamp(self.min, self.max - IVec2::ONE)
    }

    /// Uniform random cell inside the rectangle
    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> IVec2 {
        IVec2::new(
            rng.random_range(self.min.x..self.max.x),
            rng.random_range(self.min.y..self.max.y),
        )
    }
}

/// Draw up to `attempts` random cells from `area` and return the first one
/// `accept` approves. `None` means the budget ran out; callers treat that as
/// "skip this item", never as a fatal error.
pub fn find_cell<R, F>(rng: &mut R, area: CellRect, attempts: u32, mut accept: F) -> Option<IVec2>
where
    R: Rng + ?Sized,
    F: FnMut(IVec2) -> bool,
{
    if area.is_empty() {
        return None;
    }
    (0..attempts)
        .map(|_| area.random_cell(rng))
        .find(|&cell| accept(cell))
}
