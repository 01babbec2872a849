use std::ops::{Index, IndexMut};

/// An addressable two-dimensional field: an energy grid, a cost table,
/// or a dumped visibility map.  Row-major, `(x, y)` addressing.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoDimensionalMap<P: Default + Copy> {
    pub width: usize,
    pub height: usize,
    pub(crate) data: Vec<P>,
}

impl<P: Default + Copy> TwoDimensionalMap<P> {
    /// A map filled with `P::default()`.
    pub fn new(width: usize, height: usize) -> Self {
        TwoDimensionalMap {
            width,
            height,
            data: vec![P::default(); width * height],
        }
    }

    /// Wrap an existing row-major vector.  Panics if the length does
    /// not match.
    pub fn from_vec(width: usize, height: usize, data: Vec<P>) -> Self {
        assert_eq!(data.len(), width * height, "map data does not fit {}x{}", width, height);
        TwoDimensionalMap {
            width,
            height,
            data,
        }
    }

    // Keep the index math in one place and never touch it anywhere
    // else.
    fn get_index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// The whole row-major backing store.
    pub fn as_slice(&self) -> &[P] {
        &self.data
    }

    /// One row.
    pub fn row(&self, y: usize) -> &[P] {
        &self.data[y * self.width..(y + 1) * self.width]
    }
}

impl<P: Default + Copy> Index<(usize, usize)> for TwoDimensionalMap<P> {
    type Output = P;

    fn index(&self, (x, y): (usize, usize)) -> &P {
        let index = self.get_index(x, y);
        &self.data[index]
    }
}

impl<P: Default + Copy> IndexMut<(usize, usize)> for TwoDimensionalMap<P> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut P {
        let index = self.get_index(x, y);
        &mut self.data[index]
    }
}
