// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seam rigidity
//!
//! A seam may step up to `delta_x` columns sideways between two rows.
//! Each step of `dx` columns costs `rigidity * |dx|^1.5 / h`, so a
//! positive rigidity straightens seams.  The table is precomputed for
//! every allowed `dx` and must be rebuilt whenever the height changes,
//! which is to say on every transpose.

/// The penalty table for lateral seam steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Rigidity {
    coefficient: f64,
    delta_x: usize,
    table: Vec<f64>,
}

impl Rigidity {
    pub fn new(coefficient: f64, delta_x: usize, height: usize) -> Self {
        let mut rigidity = Rigidity {
            coefficient,
            delta_x,
            table: Vec::new(),
        };
        rigidity.rebuild(height);
        rigidity
    }

    /// Recompute the table for a new image height.
    pub fn rebuild(&mut self, height: usize) {
        let (d, h) = (self.delta_x as isize, height.max(1) as f64);
        let coefficient = self.coefficient;
        self.table = (-d..=d)
            .map(|dx| coefficient * (dx.abs() as f64).powf(1.5) / h)
            .collect();
    }

    pub fn delta_x(&self) -> usize {
        self.delta_x
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// True when the penalty is identically zero.
    pub fn is_flat(&self) -> bool {
        self.coefficient == 0.0
    }

    /// The cost of stepping `dx` columns, `|dx| <= delta_x`.
    #[inline]
    pub fn penalty(&self, dx: isize) -> f64 {
        self.table[(dx + self.delta_x as isize) as usize]
    }
}

impl Default for Rigidity {
    fn default() -> Self {
        Rigidity::new(0.0, 1, 1)
    }
}
