// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of an image
//!
//! The energy of a pixel is the gradient function applied to the
//! brightness differences around it, plus whatever bias the user has
//! painted on that pixel, spread over the starting width.  Brightness
//! is the mean of the color channels in normalized units; an alpha
//! channel, if there is one, scales it so that transparent regions
//! look flat.
//!
//! After a seam is removed only the pixels that gained new neighbours
//! need new energies.  `update_emap` recomputes exactly those and
//! records, per row, the columns it touched so the minimum-path table
//! can follow suit.

use crate::carver::Carver;
use crate::cq;
use crate::error::{CarverError, Result};
use crate::gradient::GradientFunction;
use crate::pixelbuffer::PixelBuffer;
use crate::twodmap::TwoDimensionalMap;
use itertools::iproduct;

/// Brightness of physical pixel `pixel`.
#[inline]
pub(crate) fn brightness(buffer: &PixelBuffer, pixel: usize, alpha: Option<usize>) -> f64 {
    let channels = buffer.channels();
    match alpha {
        Some(a) if channels > 1 => {
            let sum: f64 = (0..channels)
                .filter(|k| *k != a)
                .map(|k| buffer.read_at(pixel, k))
                .sum();
            sum / (channels - 1) as f64 * buffer.read_at(pixel, a)
        }
        _ => (0..channels).map(|k| buffer.read_at(pixel, k)).sum::<f64>() / channels as f64,
    }
}

/// The alpha channel implied by a channel count: grey+alpha and RGBA.
pub(crate) fn default_alpha(channels: usize) -> Option<usize> {
    cq!(channels == 2 || channels == 4, Some(channels - 1), None)
}

// Central difference along one axis of length `len`, one-sided at the
// borders, zero when there is nothing to compare against.
#[inline]
fn difference<F: Fn(usize) -> f64>(read: F, pos: usize, len: usize) -> f64 {
    if len < 2 {
        0.0
    } else if pos == 0 {
        read(1) - read(0)
    } else if pos == len - 1 {
        read(pos) - read(pos - 1)
    } else {
        (read(pos + 1) - read(pos - 1)) / 2.0
    }
}

/// Compute the energy of every pixel of a plain buffer, with no bias.
pub fn calculate_energy(buffer: &PixelBuffer, gradient: GradientFunction) -> TwoDimensionalMap<f64> {
    let (width, height) = (buffer.width(), buffer.height());
    let alpha = default_alpha(buffer.channels());
    let read = |x: usize, y: usize| brightness(buffer, y * width + x, alpha);

    let mut emap = TwoDimensionalMap::new(width, height);
    for (y, x) in iproduct!(0..height, 0..width) {
        let gx = difference(|x1| read(x1, y), x, width);
        let gy = difference(|y1| read(x, y1), y, height);
        emap[(x, y)] = gradient.apply(gx, gy);
    }
    emap
}

impl Carver {
    // Brightness of the visible pixel at (x, y).
    #[inline]
    fn read_visible(&self, x: usize, y: usize) -> f64 {
        brightness(&self.rgb, self.raw[y][x], self.alpha_channel)
    }

    /// Energy of the visible pixel at (x, y), stored by physical index.
    pub(crate) fn compute_e(&mut self, x: usize, y: usize) {
        let gx = difference(|x1| self.read_visible(x1, y), x, self.w);
        let gy = difference(|y1| self.read_visible(x, y1), y, self.h);
        let z = self.raw[y][x];
        self.en[z] = self.gradient.apply(gx, gy) + self.bias[z] / self.w_start as f64;
    }

    /// Energy of every visible pixel.
    pub(crate) fn build_emap(&mut self) {
        for (y, x) in iproduct!(0..self.h, 0..self.w) {
            self.compute_e(x, y);
        }
    }

    /// Refresh the energies disturbed by the last seam removal.  Row `y`
    /// lost column `s(y)`; a pixel's horizontal neighbours changed if
    /// it sits next to the gap, its vertical ones if it lies between
    /// the gaps of two adjacent rows.
    pub(crate) fn update_emap(&mut self) {
        let h = self.h;
        for y in 0..h {
            let s = self.vpath_x[y];
            let (lo, hi) = (y.saturating_sub(1)..=(y + 1).min(h - 1))
                .map(|y1| self.vpath_x[y1])
                .fold((s, s), |(lo, hi), s1| (lo.min(s1), hi.max(s1)));
            let (lo, hi) = (lo.saturating_sub(1), hi.min(self.w - 1));
            for x in lo..=hi {
                self.compute_e(x, y);
            }
            self.nrg_band[y] = Some((lo, hi));
        }
    }

    /// The energy of the visible image, in the caller's orientation.
    /// Useful for looking at what the carver sees.
    pub fn energy_map(&mut self) -> Result<TwoDimensionalMap<f64>> {
        if !self.active {
            return Err(CarverError::InactiveCarver);
        }
        self.build_emap();
        let (w, h) = (self.w, self.h);
        let mut emap = cq!(
            self.transposed,
            TwoDimensionalMap::new(h, w),
            TwoDimensionalMap::new(w, h)
        );
        for (y, x) in iproduct!(0..h, 0..w) {
            let e = self.en[self.raw[y][x]];
            if self.transposed {
                emap[(y, x)] = e;
            } else {
                emap[(x, y)] = e;
            }
        }
        Ok(emap)
    }
}
