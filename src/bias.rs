// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bias and rigidity masks
//!
//! A bias raises (positive) or lowers (negative) the energy of the
//! pixels it covers, protecting them from or offering them to the
//! seams.  A rigidity mask scales the rigidity penalty per pixel.
//!
//! Both are painted in the original orientation on the starting image,
//! so any existing visibility map is flattened away first.  Rectangles
//! that stick out of the image are clipped.

use crate::carver::Carver;
use crate::cq;
use crate::error::{try_vec, CarverError, Result};

// The part of a `width × height` rectangle at `(x_off, y_off)` that
// overlaps a `w0 × h0` image, as image coordinates.
fn clip(
    width: usize,
    height: usize,
    x_off: isize,
    y_off: isize,
    w0: usize,
    h0: usize,
) -> (std::ops::Range<isize>, std::ops::Range<isize>) {
    let x1 = x_off.max(0);
    let y1 = y_off.max(0);
    let x2 = (x_off + width as isize).min(w0 as isize);
    let y2 = (y_off + height as isize).min(h0 as isize);
    (x1..x2.max(x1), y1..y2.max(y1))
}

fn check_len(len: usize, needed: usize) -> Result<()> {
    cq!(
        len >= needed,
        Ok(()),
        Err(CarverError::geometry(format!(
            "a buffer of {} values cannot cover {}",
            len, needed
        )))
    )
}

impl Carver {
    // Back to the starting image in the original orientation.
    fn normalize(&mut self) -> Result<()> {
        if self.transposed {
            self.transpose()?;
        }
        if self.max_level > 1 || self.level > 1 {
            self.flatten()?;
        }
        Ok(())
    }

    // Visit every clipped pixel: physical index and source index.
    fn paint<F>(&mut self, width: usize, height: usize, x_off: isize, y_off: isize, mut f: F)
    where
        F: FnMut(&mut Carver, usize, usize),
    {
        let (xs, ys) = clip(width, height, x_off, y_off, self.w0, self.h0);
        for ty in ys {
            for tx in xs.clone() {
                let z = ty as usize * self.w0 + tx as usize;
                let src = (ty - y_off) as usize * width + (tx - x_off) as usize;
                f(self, z, src);
            }
        }
    }

    /// Add `factor * v / 2` to the bias of every pixel covered by a
    /// `width × height` buffer placed at `(x_off, y_off)`.
    pub fn add_bias_area(
        &mut self,
        buffer: &[f64],
        factor: f64,
        width: usize,
        height: usize,
        x_off: isize,
        y_off: isize,
    ) -> Result<()> {
        if factor == 0.0 {
            return Ok(());
        }
        self.check_active()?;
        check_len(buffer.len(), width * height)?;
        let r = self.normalize();
        self.guard(r)?;
        self.paint(width, height, x_off, y_off, |c, z, src| {
            c.bias[z] += factor * buffer[src] / 2.0;
        });
        Ok(())
    }

    /// Add a bias buffer the size of the image.
    pub fn add_bias(&mut self, buffer: &[f64], factor: f64) -> Result<()> {
        let (w, h) = (self.width(), self.height());
        self.add_bias_area(buffer, factor, w, h, 0, 0)
    }

    /// Add bias from 8-bit interleaved samples with `bpp` channels per
    /// pixel.  The color channels are averaged; with 2 or 4+ channels
    /// the last one is alpha and scales the result.
    pub fn add_bias_rgb_area(
        &mut self,
        rgb: &[u8],
        factor: f64,
        bpp: usize,
        width: usize,
        height: usize,
        x_off: isize,
        y_off: isize,
    ) -> Result<()> {
        if factor == 0.0 {
            return Ok(());
        }
        self.check_active()?;
        if bpp == 0 {
            return Err(CarverError::geometry("a pixel needs at least one channel"));
        }
        check_len(rgb.len(), width * height * bpp)?;
        let has_alpha = bpp == 2 || bpp >= 4;
        let c_bpp = bpp - cq!(has_alpha, 1, 0);
        let r = self.normalize();
        self.guard(r)?;
        self.paint(width, height, x_off, y_off, |c, z, src| {
            let pixel = &rgb[src * bpp..(src + 1) * bpp];
            let sum: f64 = pixel[..c_bpp].iter().map(|v| f64::from(*v)).sum();
            let alpha = cq!(has_alpha, f64::from(pixel[bpp - 1]) / 255.0, 1.0);
            c.bias[z] += factor * sum / (2.0 * 255.0 * c_bpp as f64) * alpha;
        });
        Ok(())
    }

    /// `add_bias_rgb_area` over the whole image.
    pub fn add_bias_rgb(&mut self, rgb: &[u8], factor: f64, bpp: usize) -> Result<()> {
        let (w, h) = (self.width(), self.height());
        self.add_bias_rgb_area(rgb, factor, bpp, w, h, 0, 0)
    }

    /// Set the rigidity mask over a rectangle.  Pixels never painted
    /// have a factor of zero once a mask exists.
    pub fn add_rigidity_mask_area(
        &mut self,
        buffer: &[f64],
        width: usize,
        height: usize,
        x_off: isize,
        y_off: isize,
    ) -> Result<()> {
        self.check_active()?;
        check_len(buffer.len(), width * height)?;
        let r = self.normalize();
        self.guard(r)?;
        if self.rigidity_mask.is_none() {
            let mask = try_vec(self.w0 * self.h0, 0.0);
            self.rigidity_mask = Some(self.guard(mask)?);
        }
        self.paint(width, height, x_off, y_off, |c, z, src| {
            if let Some(mask) = c.rigidity_mask.as_mut() {
                mask[z] = buffer[src];
            }
        });
        Ok(())
    }

    pub fn add_rigidity_mask(&mut self, buffer: &[f64]) -> Result<()> {
        let (w, h) = (self.width(), self.height());
        self.add_rigidity_mask_area(buffer, w, h, 0, 0)
    }

    /// Remove the rigidity mask.
    pub fn clear_rigidity_mask(&mut self) {
        self.rigidity_mask = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixelbuffer::PixelBuffer;

    fn carver(width: usize, height: usize) -> Carver {
        let buffer = PixelBuffer::from_samples(width, height, 1, vec![128u8; width * height]);
        let mut carver = Carver::new(buffer.unwrap()).unwrap();
        carver.init(1, 0.0).unwrap();
        carver
    }

    #[test]
    fn zero_factor_is_a_no_op() {
        let mut c = carver(6, 4);
        c.resize_width(4).unwrap();
        let (bias, level) = (c.bias.clone(), c.level);
        c.add_bias(&[1.0; 24], 0.0).unwrap();
        c.add_bias_rgb(&[255; 24 * 3], 0.0, 3).unwrap();
        assert_eq!(c.bias, bias);
        assert_eq!(c.level, level);
        assert_eq!(c.max_level, 3);
    }

    #[test]
    fn areas_are_clipped_and_accumulate() {
        let mut c = carver(4, 3);
        c.add_bias_area(&[1.0, 2.0, 3.0, 4.0], 2.0, 2, 2, -1, 2).unwrap();
        c.add_bias_area(&[1.0, 2.0, 3.0, 4.0], 2.0, 2, 2, -1, 2).unwrap();
        // Only the source pixel (1, 0) lands, at (0, 2).
        let mut expected = vec![0.0; 12];
        expected[8] = 4.0;
        assert_eq!(c.bias, expected);
    }

    #[test]
    fn rgb_bias_weighs_alpha() {
        let mut c = carver(2, 1);
        c.add_bias_rgb(&[255, 255, 255, 255, 255, 255, 255, 0], 10.0, 4)
            .unwrap();
        assert_eq!(c.bias, vec![5.0, 0.0]);

        let mut grey = carver(1, 1);
        grey.add_bias_rgb(&[51], -2.0, 1).unwrap();
        assert!((grey.bias[0] + 0.2).abs() < 1e-12);
    }

    #[test]
    fn bias_flattens_an_existing_map() {
        let mut c = carver(6, 3);
        c.resize_width(4).unwrap();
        c.add_bias(&[1.0; 12], 1.0).unwrap();
        assert_eq!((c.w0, c.w_start, c.max_level), (4, 4, 1));
        assert!(c.bias.iter().all(|b| *b == 0.5));
    }

    #[test]
    fn rigidity_mask_defaults_to_zero() {
        let mut c = carver(3, 2);
        c.add_rigidity_mask_area(&[1.0], 1, 1, 2, 1).unwrap();
        assert_eq!(c.rigidity_mask, Some(vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0]));
        c.clear_rigidity_mask();
        assert!(c.rigidity_mask.is_none());
    }

    #[test]
    fn short_buffers_are_refused() {
        let mut c = carver(3, 3);
        assert!(c.add_bias(&[1.0; 8], 1.0).is_err());
        assert!(c.add_bias_rgb(&[1; 9], 1.0, 0).is_err());
    }
}
