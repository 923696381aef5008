//! Arena obstacle field
//!
//! Trees occupy one cell, logs a straight run of cells. Every occupied cell
//! maps back to the obstacle that owns it, and only that record carries the
//! hit flash.

use std::collections::HashMap;

use glam::IVec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::placement::{CellRect, find_cell};
use crate::{arena_center, chebyshev, manhattan};

/// Cells kept free of obstacles along every edge
pub const BORDER_MARGIN: i32 = 2;
/// Chebyshev radius around the arena center kept free of obstacles
pub const CENTER_SAFE_RADIUS: i32 = 5;
/// Minimum Manhattan distance between obstacle origins
pub const MIN_OBSTACLE_SPACING: i32 = 4;
pub const TREE_ATTEMPTS: u32 = 100;
pub const LOG_ATTEMPTS: u32 = 200;
/// Logs of this length or more count as long logs
pub const LONG_LOG_MIN: u8 = 4;

const OBSTACLE_FLASH_MS: f32 = 500.0;
const BORDER_FLASH_MS: f32 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Tree,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    fn step(self) -> IVec2 {
        match self {
            Orientation::Horizontal => IVec2::X,
            Orientation::Vertical => IVec2::Y,
        }
    }
}

/// Arena edge, used for wall-hit flashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// A tree or log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub origin: IVec2,
    pub length: u8,
    pub orientation: Orientation,
    /// Visual size multiplier (trees only)
    pub scale: f32,
    /// Remaining hit flash (ms)
    pub flash_ms: f32,
}

impl Obstacle {
    /// Every cell this obstacle covers, origin first
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        let step = self.orientation.step();
        (0..self.length as i32).map(move |i| self.origin + step * i)
    }

    pub fn is_long_log(&self) -> bool {
        self.kind == ObstacleKind::Log && self.length >= LONG_LOG_MIN
    }

    pub fn is_short_log(&self) -> bool {
        self.kind == ObstacleKind::Log && self.length < LONG_LOG_MIN
    }
}

/// Active border flash
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BorderFlash {
    pub side: Side,
    pub remaining_ms: f32,
}

/// Item in a population work queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Planned {
    Tree,
    LongLog,
    ShortLog,
}

/// Per-category outcome of one `populate` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub placed: u32,
    pub dropped: u32,
}

/// Arena obstacle field
#[derive(Debug, Clone, Default)]
pub struct Forest {
    pub cols: i32,
    pub rows: i32,
    obstacles: Vec<Obstacle>,
    /// Occupied cell -> index into `obstacles`
    cells: HashMap<IVec2, usize>,
    pub border_flashes: Vec<BorderFlash>,
}

impl Forest {
    pub fn new(cols: i32, rows: i32) -> Self {
        Self {
            cols,
            rows,
            ..Default::default()
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
        self.cells.clear();
        self.border_flashes.clear();
    }

    #[inline]
    pub fn is_obstacle(&self, cell: IVec2) -> bool {
        self.cells.contains_key(&cell)
    }

    pub fn obstacle_at(&self, cell: IVec2) -> Option<&Obstacle> {
        self.cells.get(&cell).map(|&i| &self.obstacles[i])
    }

    pub fn tree_count(&self) -> u32 {
        self.obstacles
            .iter()
            .filter(|o| o.kind == ObstacleKind::Tree)
            .count() as u32
    }

    pub fn long_log_count(&self) -> u32 {
        self.obstacles.iter().filter(|o| o.is_long_log()).count() as u32
    }

    pub fn short_log_count(&self) -> u32 {
        self.obstacles.iter().filter(|o| o.is_short_log()).count() as u32
    }

    /// Grow the forest toward the target counts.
    ///
    /// Existing obstacles are kept; only the deficit per category is placed,
    /// in shuffled order. Items that can't be sited within their attempt
    /// budget are dropped.
    pub fn populate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        target_trees: u32,
        target_long_logs: u32,
        target_short_logs: u32,
    ) -> PopulateReport {
        let mut queue = Vec::new();
        let deficits = [
            (Planned::Tree, target_trees.saturating_sub(self.tree_count())),
            (
                Planned::LongLog,
                target_long_logs.saturating_sub(self.long_log_count()),
            ),
            (
                Planned::ShortLog,
                target_short_logs.saturating_sub(self.short_log_count()),
            ),
        ];
        for (item, count) in deficits {
            queue.extend(std::iter::repeat_n(item, count as usize));
        }
        queue.shuffle(rng);

        let mut report = PopulateReport::default();
        for item in queue {
            let placed = match item {
                Planned::Tree => self.place_tree(rng),
                Planned::LongLog => self.place_log(rng, 4..=5),
                Planned::ShortLog => self.place_log(rng, 2..=3),
            };
            if placed {
                report.placed += 1;
            } else {
                report.dropped += 1;
            }
        }

        if report.dropped > 0 {
            log::warn!(
                "Forest populate dropped {} of {} obstacles",
                report.dropped,
                report.placed + report.dropped
            );
        }
        log::debug!(
            "Forest: {} trees, {} long logs, {} short logs",
            self.tree_count(),
            self.long_log_count(),
            self.short_log_count()
        );
        report
    }

    fn placement_area(&self) -> CellRect {
        CellRect::inset(self.cols, self.rows, BORDER_MARGIN)
    }

    /// Border, safe-zone and occupancy checks for a single cell
    fn cell_is_free(&self, cell: IVec2) -> bool {
        let center = arena_center(self.cols, self.rows);
        self.placement_area().contains(cell)
            && chebyshev(cell, center) >= CENTER_SAFE_RADIUS
            && !self.is_obstacle(cell)
    }

    fn spaced_from_origins(&self, cell: IVec2) -> bool {
        self.obstacles
            .iter()
            .all(|o| manhattan(o.origin, cell) >= MIN_OBSTACLE_SPACING)
    }

    fn place_tree<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let area = self.placement_area();
        let Some(origin) = find_cell(rng, area, TREE_ATTEMPTS, |c| {
            self.cell_is_free(c) && self.spaced_from_origins(c)
        }) else {
            return false;
        };
        let scale = rng.random_range(1.2..1.6);
        self.insert(Obstacle {
            kind: ObstacleKind::Tree,
            origin,
            length: 1,
            orientation: Orientation::Horizontal,
            scale,
            flash_ms: 0.0,
        });
        true
    }

    fn place_log<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        lengths: std::ops::RangeInclusive<u8>,
    ) -> bool {
        let area = self.placement_area();
        for _ in 0..LOG_ATTEMPTS {
            let origin = area.random_cell(rng);
            let length = rng.random_range(lengths.clone());
            let orientation = if rng.random_bool(0.5) {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let candidate = Obstacle {
                kind: ObstacleKind::Log,
                origin,
                length,
                orientation,
                scale: 1.0,
                flash_ms: 0.0,
            };
            if self.spaced_from_origins(origin) && candidate.cells().all(|c| self.cell_is_free(c)) {
                self.insert(candidate);
                return true;
            }
        }
        false
    }

    pub(crate) fn insert(&mut self, obstacle: Obstacle) {
        let idx = self.obstacles.len();
        for cell in obstacle.cells() {
            self.cells.insert(cell, idx);
        }
        self.obstacles.push(obstacle);
    }

    /// Remove the obstacle covering `cell` (endgame dissolve)
    pub fn remove_at(&mut self, cell: IVec2) -> Option<Obstacle> {
        let idx = *self.cells.get(&cell)?;
        let removed = self.obstacles.remove(idx);
        self.reindex();
        Some(removed)
    }

    fn reindex(&mut self) {
        self.cells.clear();
        for (idx, obstacle) in self.obstacles.iter().enumerate() {
            for cell in obstacle.cells() {
                self.cells.insert(cell, idx);
            }
        }
    }

    /// Flash the obstacle covering `cell` (the flash lives on its origin record)
    pub fn flash_obstacle(&mut self, cell: IVec2) {
        if let Some(&idx) = self.cells.get(&cell) {
            self.obstacles[idx].flash_ms = OBSTACLE_FLASH_MS;
        }
    }

    /// Flash the arena edge crossed by an out-of-bounds `cell`
    pub fn flash_border(&mut self, cell: IVec2) {
        let side = if cell.x < 0 {
            Side::Left
        } else if cell.x >= self.cols {
            Side::Right
        } else if cell.y < 0 {
            Side::Top
        } else if cell.y >= self.rows {
            Side::Bottom
        } else {
            return;
        };
        self.border_flashes.push(BorderFlash {
            side,
            remaining_ms: BORDER_FLASH_MS,
        });
    }

    /// Decay visual timers
    pub fn update(&mut self, dt: f32) {
        for obstacle in &mut self.obstacles {
            obstacle.flash_ms = (obstacle.flash_ms - dt).max(0.0);
        }
        for flash in &mut self.border_flashes {
            flash.remaining_ms -= dt;
        }
        self.border_flashes.retain(|f| f.remaining_ms > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn assert_spacing(forest: &Forest) {
        let center = arena_center(forest.cols, forest.rows);
        let obstacles = forest.obstacles();
        for (i, a) in obstacles.iter().enumerate() {
            for cell in a.cells() {
                assert!(chebyshev(cell, center) >= CENTER_SAFE_RADIUS);
                assert!(CellRect::inset(forest.cols, forest.rows, BORDER_MARGIN).contains(cell));
            }
            for b in &obstacles[i + 1..] {
                assert!(manhattan(a.origin, b.origin) >= MIN_OBSTACLE_SPACING);
            }
        }
    }

    #[test]
    fn test_populate_day_one() {
        for seed in 0..20 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut forest = Forest::new(40, 25);
            let report = forest.populate(&mut rng, 8, 4, 4);
            assert_eq!(report.placed + report.dropped, 16);
            assert!(forest.tree_count() <= 8);
            assert!(forest.long_log_count() <= 4);
            assert!(forest.short_log_count() <= 4);
            assert_spacing(&forest);
        }
    }

    #[test]
    fn test_populate_is_incremental() {
        let mut rng = Pcg32::seed_from_u64(99);
        let mut forest = Forest::new(40, 25);
        forest.populate(&mut rng, 8, 4, 4);
        let before: Vec<IVec2> = forest.obstacles().iter().map(|o| o.origin).collect();

        forest.populate(&mut rng, 10, 6, 6);
        let after: Vec<IVec2> = forest.obstacles().iter().map(|o| o.origin).collect();
        assert_eq!(&after[..before.len()], &before[..]);
        assert_spacing(&forest);

        // Targets already met: nothing new
        let count = forest.obstacles().len();
        let report = forest.populate(&mut rng, 0, 0, 0);
        assert_eq!(report, PopulateReport::default());
        assert_eq!(forest.obstacles().len(), count);
    }

    #[test]
    fn test_log_cells_indexed() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut forest = Forest::new(40, 25);
        forest.populate(&mut rng, 0, 4, 0);
        for log in forest.obstacles() {
            assert!(log.is_long_log());
            for cell in log.cells() {
                assert!(forest.is_obstacle(cell));
                assert_eq!(forest.obstacle_at(cell).map(|o| o.origin), Some(log.origin));
            }
        }
    }

    #[test]
    fn test_flash_and_remove() {
        let mut forest = Forest::new(40, 25);
        let log = Obstacle {
            kind: ObstacleKind::Log,
            origin: IVec2::new(4, 4),
            length: 3,
            orientation: Orientation::Vertical,
            scale: 1.0,
            flash_ms: 0.0,
        };
        forest.insert(Obstacle {
            kind: ObstacleKind::Tree,
            origin: IVec2::new(30, 20),
            length: 1,
            orientation: Orientation::Horizontal,
            scale: 1.3,
            flash_ms: 0.0,
        });
        forest.insert(log.clone());
        let tail = IVec2::new(4, 6);
        assert!(forest.is_obstacle(tail));

        forest.flash_obstacle(tail);
        assert_eq!(forest.obstacle_at(log.origin).unwrap().flash_ms, 500.0);
        forest.update(200.0);
        assert_eq!(forest.obstacle_at(log.origin).unwrap().flash_ms, 300.0);

        let removed = forest.remove_at(tail).unwrap();
        assert_eq!(removed.origin, log.origin);
        assert_eq!(forest.obstacles().len(), 1);
        assert!(!forest.is_obstacle(log.origin));
        assert!(forest.is_obstacle(IVec2::new(30, 20)));
        assert!(forest.remove_at(tail).is_none());
    }

    #[test]
    fn test_border_flash() {
        let mut forest = Forest::new(40, 25);
        forest.flash_border(IVec2::new(-1, 5));
        forest.flash_border(IVec2::new(5, 25));
        forest.flash_border(IVec2::new(5, 5));
        assert_eq!(forest.border_flashes.len(), 2);
        assert_eq!(forest.border_flashes[0].side, Side::Left);
        assert_eq!(forest.border_flashes[1].side, Side::Bottom);
        forest.update(300.0);
        assert!(forest.border_flashes.is_empty());
    }
}
