// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The minimum-path table
//!
//! For every pixel, the cost of the cheapest top-to-bottom path that
//! ends there:
//!
//! ```text
//!   M(x, 0) = e(x, 0)
//!   M(x, y) = e(x, y) + min  { M(x + dx, y - 1) + r(x, y) R(dx) }
//!                      |dx| <= delta_x
//! ```
//!
//! No backpointers are stored.  Whoever needs the path recomputes the
//! local comparison with `least_predecessor`, which is cheap and always
//! agrees with the table because it runs the same comparison on the
//! same numbers.
//!
//! The algorithms are written against the `CostGrid` trait so that the
//! carver (whose rows are an index table into a larger arena) and a
//! plain `TwoDimensionalMap` share one implementation.

use crate::cq;
use crate::rigidity::Rigidity;
use crate::twodmap::TwoDimensionalMap;

/// Which of several equally cheap candidates wins.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TieBreak {
    /// The leftmost candidate.
    Left,
    /// The rightmost candidate.
    Right,
}

impl TieBreak {
    pub fn flip(self) -> Self {
        cq!(self == TieBreak::Left, TieBreak::Right, TieBreak::Left)
    }
}

/// Anything the dynamic program can run over.
pub trait CostGrid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn energy(&self, x: usize, y: usize) -> f64;
    fn cost(&self, x: usize, y: usize) -> f64;
    fn set_cost(&mut self, x: usize, y: usize, cost: f64);

    /// Per-pixel scale on the rigidity penalty.
    fn rigidity_factor(&self, _x: usize, _y: usize) -> f64 {
        1.0
    }
}

/// Find the cheapest predecessor of `(x, y)` in row `y - 1`.  Returns
/// its column and its cost including the rigidity penalty.
#[inline]
pub fn least_predecessor<G: CostGrid>(
    grid: &G,
    x: usize,
    y: usize,
    rigidity: &Rigidity,
    tie: TieBreak,
) -> (usize, f64) {
    let (xi, w, d) = (x as isize, grid.width() as isize, rigidity.delta_x() as isize);
    let (lo, hi) = ((-xi).max(-d), (w - 1 - xi).min(d));
    let factor = cq!(rigidity.is_flat(), 0.0, grid.rigidity_factor(x, y));

    let mut best = (xi + lo) as usize;
    let mut m = grid.cost(best, y - 1) + factor * rigidity.penalty(lo);
    for dx in (lo + 1)..=hi {
        let x1 = (xi + dx) as usize;
        let m1 = grid.cost(x1, y - 1) + factor * rigidity.penalty(dx);
        if m1 < m || (m1 == m && tie == TieBreak::Right) {
            m = m1;
            best = x1;
        }
    }
    (best, m)
}

/// Recompute one cell from the row above; returns the new cost.
#[inline]
fn update_cell<G: CostGrid>(
    grid: &mut G,
    x: usize,
    y: usize,
    rigidity: &Rigidity,
    tie: TieBreak,
) -> f64 {
    let cost = if y == 0 {
        grid.energy(x, 0)
    } else {
        grid.energy(x, y) + least_predecessor(grid, x, y, rigidity, tie).1
    };
    grid.set_cost(x, y, cost);
    cost
}

/// Fill the whole table, top to bottom.
pub fn build<G: CostGrid>(grid: &mut G, rigidity: &Rigidity, tie: TieBreak) {
    let (width, height) = (grid.width(), grid.height());
    for y in 0..height {
        for x in 0..width {
            update_cell(grid, x, y, rigidity, tie);
        }
    }
}

fn union(a: Option<(usize, usize)>, b: Option<(usize, usize)>) -> Option<(usize, usize)> {
    match (a, b) {
        (Some((l1, h1)), Some((l2, h2))) => Some((l1.min(l2), h1.max(h2))),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Refresh the table after a local change.  `bands[y]` is the inclusive
/// range of columns in row `y` whose own inputs changed (their energy,
/// or which pixels sit in their predecessor window).  Anything whose
/// predecessors changed value is picked up as well, row by row, so the
/// work stays proportional to the disturbed region.
pub fn update_bands<G: CostGrid>(
    grid: &mut G,
    rigidity: &Rigidity,
    tie: TieBreak,
    bands: &[Option<(usize, usize)>],
) {
    let (width, height, d) = (grid.width(), grid.height(), rigidity.delta_x());
    if width == 0 {
        return;
    }
    let mut changed: Option<(usize, usize)> = None;
    for (y, band) in bands.iter().enumerate().take(height) {
        let spread = changed.map(|(lo, hi)| (lo.saturating_sub(d), (hi + d).min(width - 1)));
        changed = None;
        if let Some((lo, hi)) = union(*band, spread) {
            for x in lo..=hi.min(width - 1) {
                let old = grid.cost(x, y);
                if update_cell(grid, x, y, rigidity, tie) != old {
                    changed = union(changed, Some((x, x)));
                }
            }
        }
    }
}

// A grid over plain maps, for callers who already have an energy map.
struct PlainGrid<'a> {
    energy: &'a TwoDimensionalMap<f64>,
    mask: Option<&'a TwoDimensionalMap<f64>>,
    cost: TwoDimensionalMap<f64>,
}

impl<'a> CostGrid for PlainGrid<'a> {
    fn width(&self) -> usize {
        self.energy.width
    }

    fn height(&self) -> usize {
        self.energy.height
    }

    fn energy(&self, x: usize, y: usize) -> f64 {
        self.energy[(x, y)]
    }

    fn cost(&self, x: usize, y: usize) -> f64 {
        self.cost[(x, y)]
    }

    fn set_cost(&mut self, x: usize, y: usize, cost: f64) {
        self.cost[(x, y)] = cost
    }

    fn rigidity_factor(&self, x: usize, y: usize) -> f64 {
        self.mask.map_or(1.0, |m| m[(x, y)])
    }
}

/// Given an energy map, compute its minimum-path table.  The optional
/// mask scales the rigidity penalty per pixel.
pub fn minpath_map(
    energy: &TwoDimensionalMap<f64>,
    mask: Option<&TwoDimensionalMap<f64>>,
    rigidity: &Rigidity,
    tie: TieBreak,
) -> TwoDimensionalMap<f64> {
    let mut grid = PlainGrid {
        energy,
        mask,
        cost: TwoDimensionalMap::new(energy.width, energy.height),
    };
    build(&mut grid, rigidity, tie);
    grid.cost
}

pub(crate) fn plain_seam(
    energy: &TwoDimensionalMap<f64>,
    rigidity: &Rigidity,
    tie: TieBreak,
) -> Vec<usize> {
    let mut grid = PlainGrid {
        energy,
        mask: None,
        cost: TwoDimensionalMap::new(energy.width, energy.height),
    };
    build(&mut grid, rigidity, tie);
    crate::seam::extract(&grid, rigidity, tie)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize, energy: &[f64]) -> TwoDimensionalMap<f64> {
        TwoDimensionalMap::from_vec(width, height, energy.to_vec())
    }

    #[test]
    fn accumulates_cheapest_parent() {
        let energy = grid(3, 2, &[5.0, 1.0, 7.0, 1.0, 1.0, 1.0]);
        let m = minpath_map(&energy, None, &Rigidity::new(0.0, 1, 2), TieBreak::Left);
        assert_eq!(m.as_slice(), &[5.0, 1.0, 7.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn rigidity_penalizes_steps() {
        // Without rigidity the cheap column 0 in row 0 wins for (2, 1)
        // only with delta_x = 2; rigidity makes the straight path win.
        let energy = grid(3, 2, &[0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let loose = minpath_map(&energy, None, &Rigidity::new(0.0, 2, 2), TieBreak::Left);
        assert_eq!(loose[(2, 1)], 1.0);
        let stiff = minpath_map(&energy, None, &Rigidity::new(4.0, 2, 2), TieBreak::Left);
        assert_eq!(stiff[(2, 1)], 2.0);
    }

    #[test]
    fn mask_scales_rigidity() {
        let energy = grid(3, 2, &[0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let mask = grid(3, 2, &[1.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
        let m = minpath_map(&energy, Some(&mask), &Rigidity::new(4.0, 2, 2), TieBreak::Left);
        assert_eq!(m[(2, 1)], 1.0);
        assert_eq!(m[(1, 1)], 2.0);
    }

    #[test]
    fn tie_break_direction() {
        let energy = grid(3, 2, &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        let rigidity = Rigidity::new(0.0, 1, 2);
        let plain = PlainGrid {
            energy: &energy,
            mask: None,
            cost: minpath_map(&energy, None, &rigidity, TieBreak::Left),
        };
        assert_eq!(least_predecessor(&plain, 1, 1, &rigidity, TieBreak::Left).0, 0);
        assert_eq!(least_predecessor(&plain, 1, 1, &rigidity, TieBreak::Right).0, 2);
    }

    #[test]
    fn band_update_matches_full_build() {
        let rigidity = Rigidity::new(1.0, 1, 4);
        let mut energy = grid(
            5,
            4,
            &[
                9.0, 9.0, 0.0, 9.0, 9.0, 9.0, 1.0, 9.0, 8.0, 9.0, 9.0, 9.0, 9.0, 9.0, 0.0, 9.0,
                9.0, 9.0, 0.0, 9.0,
            ],
        );
        let mut plain = PlainGrid {
            energy: &energy,
            mask: None,
            cost: TwoDimensionalMap::new(5, 4),
        };
        build(&mut plain, &rigidity, TieBreak::Left);
        let mut cost = plain.cost;

        energy[(1, 1)] = 20.0;
        let mut plain = PlainGrid {
            energy: &energy,
            mask: None,
            cost,
        };
        let bands = [None, Some((1, 1)), None, None];
        update_bands(&mut plain, &rigidity, TieBreak::Left, &bands);
        cost = plain.cost;

        assert_eq!(cost, minpath_map(&energy, None, &rigidity, TieBreak::Left));
    }
}
