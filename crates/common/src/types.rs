use glam::IVec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a placed tile instance.
///
/// Every grid cell covered by a multi-cell tile holds the same `TileId`; the
/// id is what "reference identity" means for tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub Uuid);

impl TileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TileId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a placed action tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionTileId(pub Uuid);

impl ActionTileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActionTileId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a room. Survives level resizes and shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub Uuid);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

/// Axis-aligned integer rectangle. `max()` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect2I {
    pub point: IVec2,
    pub size: IVec2,
}

impl Rect2I {
    pub const fn new(point: IVec2, size: IVec2) -> Self {
        Self { point, size }
    }

    pub fn from_min_max(min: IVec2, max: IVec2) -> Self {
        Self {
            point: min,
            size: max - min,
        }
    }

    pub fn min(&self) -> IVec2 {
        self.point
    }

    pub fn max(&self) -> IVec2 {
        self.point + self.size
    }

    pub fn width(&self) -> i32 {
        self.size.x
    }

    pub fn height(&self) -> i32 {
        self.size.y
    }

    pub fn area(&self) -> i32 {
        self.size.x.max(0) * self.size.y.max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    pub fn contains(&self, p: IVec2) -> bool {
        p.x >= self.point.x && p.y >= self.point.y && p.x < self.max().x && p.y < self.max().y
    }

    /// Overlap of two rectangles; empty (zero size) when they do not touch.
    pub fn intersect(&self, other: &Rect2I) -> Rect2I {
        let min = self.min().max(other.min());
        let max = self.max().min(other.max());
        if max.x <= min.x || max.y <= min.y {
            Rect2I::new(min, IVec2::ZERO)
        } else {
            Rect2I::from_min_max(min, max)
        }
    }

    pub fn translated(&self, offset: IVec2) -> Rect2I {
        Rect2I::new(self.point + offset, self.size)
    }

    /// Row-major iteration over every cell inside the rectangle.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + use<> {
        let min = self.min();
        let max = self.max();
        (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| IVec2::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_id_uniqueness() {
        let a = TileId::new();
        let b = TileId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect2I::new(IVec2::new(2, 3), IVec2::new(2, 2));
        assert!(r.contains(IVec2::new(2, 3)));
        assert!(r.contains(IVec2::new(3, 4)));
        assert!(!r.contains(IVec2::new(4, 4)));
        assert!(!r.contains(IVec2::new(1, 3)));
    }

    #[test]
    fn rect_intersection() {
        let a = Rect2I::new(IVec2::ZERO, IVec2::new(10, 8));
        let b = Rect2I::new(IVec2::new(8, 6), IVec2::new(4, 4));
        assert_eq!(a.intersect(&b), Rect2I::new(IVec2::new(8, 6), IVec2::new(2, 2)));

        let far = Rect2I::new(IVec2::new(50, 50), IVec2::ONE);
        assert!(a.intersect(&far).is_empty());
    }

    #[test]
    fn rect_cells_row_major() {
        let r = Rect2I::new(IVec2::new(1, 1), IVec2::new(2, 2));
        let cells: Vec<IVec2> = r.cells().collect();
        assert_eq!(
            cells,
            vec![
                IVec2::new(1, 1),
                IVec2::new(2, 1),
                IVec2::new(1, 2),
                IVec2::new(2, 2)
            ]
        );
    }
}
