// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seam extraction
//!
//! Given a complete minimum-path table, find the cheapest cell in the
//! bottom row and walk upward, choosing at each row the predecessor
//! that produced the recorded minimum.

use crate::minpath::{least_predecessor, plain_seam, CostGrid, TieBreak};
use crate::rigidity::Rigidity;
use crate::twodmap::TwoDimensionalMap;

/// Return the column of the seam in every row, top to bottom.
pub fn extract<G: CostGrid>(grid: &G, rigidity: &Rigidity, tie: TieBreak) -> Vec<usize> {
    let (width, height) = (grid.width(), grid.height());
    if width == 0 || height == 0 {
        return Vec::new();
    }

    // Find the x coordinate of the bottommost cell with the least cost.
    let last = height - 1;
    let mut seam_col = (1..width).fold(0, |best, x| {
        let (m, m1) = (grid.cost(best, last), grid.cost(x, last));
        if m1 < m || (m1 == m && tie == TieBreak::Right) {
            x
        } else {
            best
        }
    });

    // Working backwards, collect the columns, then reverse.
    (0..height)
        .rev()
        .fold(Vec::with_capacity(height), |mut acc, y| {
            acc.push(seam_col);
            if y > 0 {
                seam_col = least_predecessor(grid, seam_col, y, rigidity, tie).0;
            }
            acc
        })
        .into_iter()
        .rev()
        .collect()
}

/// Given an energy map, return the x coordinate of the vertical seam in
/// every row.
pub fn find_vertical_seam(energy: &TwoDimensionalMap<f64>, rigidity: &Rigidity) -> Vec<usize> {
    plain_seam(energy, rigidity, TieBreak::Left)
}

/// Given an energy map, return the y coordinate of the horizontal seam
/// in every column.
pub fn find_horizontal_seam(energy: &TwoDimensionalMap<f64>, rigidity: &Rigidity) -> Vec<usize> {
    let mut flipped = TwoDimensionalMap::new(energy.height, energy.width);
    for y in 0..energy.height {
        for x in 0..energy.width {
            flipped[(y, x)] = energy[(x, y)];
        }
    }
    plain_seam(&flipped, rigidity, TieBreak::Left)
}
