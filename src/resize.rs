// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Resizing
//!
//! Width is the native direction.  Height is handled by transposing
//! the carver and resizing its width; the carver then stays transposed
//! until something needs the original orientation again, so a run of
//! height changes costs a single transpose.
//!
//! An enlargement larger than one step allows runs in rounds.
//! Each round grows the image by at most `(enl_step - 1) * w_start`
//! columns and then flattens, making the enlarged image the new start.

use crate::attached::sync_attached;
use crate::carver::{Carver, ResizeOrder};
use crate::cq;
use crate::error::{CarverError, Result};

impl Carver {
    /// Resize to `w1` columns.
    pub fn resize_width(&mut self, w1: usize) -> Result<()> {
        self.check_active()?;
        if w1 < 1 {
            return Err(CarverError::geometry("cannot resize to zero width"));
        }
        let r = self.to_orientation(false, w1);
        self.guard(r)
    }

    /// Resize to `h1` rows.
    pub fn resize_height(&mut self, h1: usize) -> Result<()> {
        self.check_active()?;
        if h1 < 1 {
            return Err(CarverError::geometry("cannot resize to zero height"));
        }
        let r = self.to_orientation(true, h1);
        self.guard(r)
    }

    /// Resize both dimensions, in the configured order.
    pub fn resize(&mut self, w1: usize, h1: usize) -> Result<()> {
        self.check_active()?;
        if w1 < 1 || h1 < 1 {
            return Err(CarverError::geometry(format!(
                "cannot resize to {}x{}",
                w1, h1
            )));
        }
        match self.resize_order {
            ResizeOrder::Horizontal => {
                self.resize_width(w1)?;
                self.resize_height(h1)
            }
            ResizeOrder::Vertical => {
                self.resize_height(h1)?;
                self.resize_width(w1)
            }
        }
    }

    fn to_orientation(&mut self, transposed: bool, size: usize) -> Result<()> {
        if size == self.size_along(transposed) {
            return Ok(());
        }
        if size > self.size_along(transposed) && self.start_along(transposed) < 2 {
            return Err(CarverError::geometry(
                "cannot enlarge an image one pixel across",
            ));
        }
        if self.transposed != transposed {
            self.transpose()?;
        }
        self.report_init(
            (size as isize - self.w as isize).abs() as usize,
            transposed,
        );
        self.resize_primary(size)?;
        self.report_end(transposed);
        Ok(())
    }

    // Current size and starting size along an axis, whatever the
    // current orientation.
    fn size_along(&self, transposed: bool) -> usize {
        cq!(transposed == self.transposed, self.w, self.h)
    }

    fn start_along(&self, transposed: bool) -> usize {
        cq!(transposed == self.transposed, self.w_start, self.h_start)
    }

    // The widest single enlargement round.
    fn enlargement_step(&self) -> usize {
        let step = ((self.enl_step - 1.0) * self.w_start as f64).floor() as isize - 1;
        step.max(1) as usize
    }

    // Resize along the current width.
    fn resize_primary(&mut self, w1: usize) -> Result<()> {
        let mut delta = w1 as isize - self.w_start as isize;
        let mut gamma = w1 as isize - self.w as isize;
        let mut delta_max = self.enlargement_step() as isize;
        if delta < 0 {
            delta = -delta;
            delta_max = delta;
        }
        log::debug!(
            "resizing {} -> {} (start {}, step {})",
            self.w,
            w1,
            self.w_start,
            delta_max
        );

        while gamma != 0 {
            let delta0 = delta.min(delta_max);
            delta -= delta0;
            let new_w = (w1 as isize).min(self.w_start as isize + delta_max) as usize;
            gamma = w1 as isize - new_w as isize;

            self.build_maps(delta0 as usize + 1)?;
            self.set_width(new_w);
            sync_attached(&mut self.attached, self.resize_aux_layers, |aux| {
                aux.set_width(new_w);
                Ok(())
            })?;

            if gamma != 0 {
                self.flatten()?;
                delta_max = self.enlargement_step() as isize;
            }
        }
        Ok(())
    }
}
