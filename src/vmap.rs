// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The visibility map
//!
//! Building the map to depth `d` removes `d - 1` seams, one level at a
//! time, marking each removed pixel with the level at which it goes.
//! The map is then inflated: every pixel of the new seams gets a
//! blended twin inserted to its left, so that the same seams, taken in
//! reverse, also say where to add columns.  After inflation the map
//! covers every width from `w_start - (d - 1)` to `w_start + (d - 1)`.
//!
//! Deepening an existing map resumes from the narrowest width it
//! reached, so earlier seams are never recomputed.

use crate::attached::sync_attached;
use crate::carver::{identity_raw, Carver};
use crate::cq;
use crate::error::{try_vec, CarverError, Result};
use crate::twodmap::TwoDimensionalMap;
use itertools::iproduct;

/// A snapshot of the visibility levels, in the caller's orientation.
/// With `transposed` set the levels describe horizontal seams.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityMap {
    pub levels: TwoDimensionalMap<usize>,
    pub depth: usize,
    pub transposed: bool,
}

impl VisibilityMap {
    pub fn width(&self) -> usize {
        self.levels.width
    }

    pub fn height(&self) -> usize {
        self.levels.height
    }
}

// Blend helper for the scalar per-pixel maps.
fn inflate_scalar(
    source: &[f64],
    width: usize,
    height: usize,
    added: usize,
    is_new: &dyn Fn(usize) -> bool,
) -> Result<Vec<f64>> {
    let new_width = width + added;
    let mut out = try_vec(new_width * height, 0.0)?;
    for y in 0..height {
        let mut z0 = y * new_width;
        for x in 0..width {
            let z = y * width + x;
            if is_new(z) {
                let left = cq!(x > 0, z - 1, z);
                out[z0] = (source[left] + source[z]) / 2.0;
                z0 += 1;
            }
            out[z0] = source[z];
            z0 += 1;
        }
    }
    Ok(out)
}

// Transpose a `width × height` scalar map.
pub(crate) fn transpose_scalar(source: &[f64], width: usize, height: usize) -> Result<Vec<f64>> {
    let mut out = try_vec(width * height, 0.0)?;
    for (y, x) in iproduct!(0..height, 0..width) {
        out[x * height + y] = source[y * width + x];
    }
    Ok(out)
}

fn broken_row(y: usize) -> CarverError {
    CarverError::geometry(format!(
        "row {} of the map does not describe a set of seams",
        y
    ))
}

impl Carver {
    /// Make sure the map reaches `depth`.
    pub(crate) fn build_maps(&mut self, depth: usize) -> Result<()> {
        if depth <= self.max_level {
            return Ok(());
        }
        self.check_active()?;
        if depth > self.w_start {
            return Err(CarverError::geometry(format!(
                "cannot remove {} seams from an image {} wide",
                depth - 1,
                self.w_start
            )));
        }

        let narrowest = self.w_start - self.max_level + 1;
        self.set_width(narrowest);
        sync_attached(&mut self.attached, self.resize_aux_layers, |aux| {
            aux.set_width(narrowest);
            Ok(())
        })?;
        self.build_emap();
        self.build_mmap();
        self.build_vsmap(depth)
    }

    fn build_vsmap(&mut self, depth: usize) -> Result<()> {
        let first = self.max_level;
        let base = self.level;
        let added = depth - first;
        let interval = cq!(
            self.lr_switch_frequency > 0,
            (added - 1) / self.lr_switch_frequency + 1,
            0
        );
        log::debug!(
            "building visibility map levels {}..{} at width {}",
            first,
            depth,
            self.w
        );

        for l in first..depth {
            let columns = self.build_vpath();
            log::trace!("seam {} at level {}: {:?}", l, self.level, columns);
            self.remove_seam(&columns)?;
            sync_attached(&mut self.attached, self.resize_aux_layers, |aux| {
                aux.remove_seam(&columns)
            })?;

            self.update_emap();
            if interval > 0 && (l - first + interval / 2) % interval == 0 {
                self.tie = self.tie.flip();
                self.build_mmap();
            } else {
                self.update_mmap();
            }
            self.report_tick();
        }

        self.inflate(base, added)?;
        sync_attached(&mut self.attached, self.resize_aux_layers, |aux| {
            aux.inflate(base, added)
        })?;
        debug_assert_eq!(self.max_level, depth);
        Ok(())
    }

    /// Insert a blended twin to the left of every pixel whose level is
    /// in `base..base + added`.  Twins take levels `added` down to 1 in
    /// removal order; every other nonzero level moves up by `added`.
    pub(crate) fn inflate(&mut self, base: usize, added: usize) -> Result<()> {
        let (w0, h0) = (self.w0, self.h0);
        let new_w0 = w0 + added;
        log::debug!("inflating {}x{} by {} columns", w0, h0, added);

        let vs = &self.vs;
        let is_new = |z: usize| vs[z] >= base && vs[z] < base + added;

        let mut rgb = self.rgb.alloc_like(new_w0, h0)?;
        let mut new_vs = try_vec(new_w0 * h0, 0)?;
        for y in 0..h0 {
            let mut z0 = y * new_w0;
            for x in 0..w0 {
                let z = y * w0 + x;
                let v = vs[z];
                if is_new(z) {
                    rgb.blend_pixel(z0, &self.rgb, cq!(x > 0, z - 1, z), z);
                    new_vs[z0] = base + added - v;
                    z0 += 1;
                }
                rgb.copy_pixel(z0, &self.rgb, z);
                new_vs[z0] = cq!(v == 0, 0, v + added);
                z0 += 1;
            }
        }
        let bias = cq!(
            self.bias.is_empty(),
            Vec::new(),
            inflate_scalar(&self.bias, w0, h0, added, &is_new)?
        );
        let mask = match self.rigidity_mask {
            Some(ref mask) => Some(inflate_scalar(mask, w0, h0, added, &is_new)?),
            None => None,
        };

        self.rgb = rgb;
        self.vs = new_vs;
        self.bias = bias;
        self.rigidity_mask = mask;
        self.w0 = new_w0;
        self.max_level += added;
        self.raw = identity_raw(new_w0, h0)?;
        if !self.en.is_empty() {
            self.alloc_maps(new_w0 * h0)?;
        }
        let w_start = self.w_start;
        self.set_width(w_start);
        Ok(())
    }

    /// Make the visible image the new starting image and forget the map.
    pub(crate) fn flatten(&mut self) -> Result<()> {
        let (w, h) = (self.w, self.h);
        log::debug!("flattening to {}x{}", w, h);

        let mut rgb = self.rgb.alloc_like(w, h)?;
        let mut bias = try_vec(cq!(self.bias.is_empty(), 0, w * h), 0.0)?;
        let mut mask = match self.rigidity_mask {
            Some(_) => Some(try_vec(w * h, 0.0)?),
            None => None,
        };
        for (y, x) in iproduct!(0..h, 0..w) {
            let (z0, z) = (y * w + x, self.raw[y][x]);
            rgb.copy_pixel(z0, &self.rgb, z);
            if !bias.is_empty() {
                bias[z0] = self.bias[z];
            }
            if let (Some(new), Some(old)) = (mask.as_mut(), self.rigidity_mask.as_ref()) {
                new[z0] = old[z];
            }
        }

        self.rgb = rgb;
        self.bias = bias;
        self.rigidity_mask = mask;
        self.vs = try_vec(w * h, 0)?;
        self.raw = identity_raw(w, h)?;
        if !self.en.is_empty() {
            self.alloc_maps(w * h)?;
        }
        self.w0 = w;
        self.h0 = h;
        self.w_start = w;
        self.h_start = h;
        self.level = 1;
        self.max_level = 1;

        sync_attached(&mut self.attached, self.resize_aux_layers, |aux| aux.flatten())
    }

    /// Swap the axes.  Any map is flattened away first.
    pub(crate) fn transpose(&mut self) -> Result<()> {
        if self.level > 1 || self.max_level > 1 {
            // The attachments flatten with us.
            self.flatten()?;
        }
        let (w0, h0) = (self.w0, self.h0);
        log::debug!("transposing {}x{}", w0, h0);

        self.rgb = self.rgb.transposed()?;
        if !self.bias.is_empty() {
            self.bias = transpose_scalar(&self.bias, w0, h0)?;
        }
        if let Some(ref mask) = self.rigidity_mask {
            self.rigidity_mask = Some(transpose_scalar(mask, w0, h0)?);
        }
        self.vs = try_vec(w0 * h0, 0)?;
        self.raw = identity_raw(h0, w0)?;
        self.vpath_x = try_vec(w0, 0)?;
        self.nrg_band = try_vec(w0, None)?;

        std::mem::swap(&mut self.w0, &mut self.h0);
        std::mem::swap(&mut self.w, &mut self.h);
        std::mem::swap(&mut self.w_start, &mut self.h_start);
        self.transposed = !self.transposed;
        self.rigidity.rebuild(self.h);

        if self.active {
            self.build_emap();
            self.build_mmap();
        }
        sync_attached(&mut self.attached, self.resize_aux_layers, |aux| aux.transpose())
    }

    /// The visibility levels, in the caller's orientation.
    pub fn dump_vmap(&self) -> VisibilityMap {
        let (w0, h0) = (self.w0, self.h0);
        let mut levels = cq!(
            self.transposed,
            TwoDimensionalMap::new(h0, w0),
            TwoDimensionalMap::new(w0, h0)
        );
        for (y, x) in iproduct!(0..h0, 0..w0) {
            let v = self.vs[y * w0 + x];
            if self.transposed {
                levels[(y, x)] = v;
            } else {
                levels[(x, y)] = v;
            }
        }
        VisibilityMap {
            levels,
            depth: self.max_level,
            transposed: self.transposed,
        }
    }

    /// Take over a map from `dump_vmap`, dumped by this carver or by
    /// another one holding an image of the same size.  The carver must
    /// not have a map of its own yet.  The levels are renumbered as if
    /// built in one pass, and the twins are blended from this carver's
    /// pixels; every width the dump covered is then available.
    pub fn load_vmap(&mut self, map: &VisibilityMap) -> Result<()> {
        self.check_active()?;
        if self.max_level > 1 {
            return Err(CarverError::geometry(
                "cannot load over an existing visibility map",
            ));
        }
        // Sizes along and across the map's seams.
        let (w1, h1) = cq!(
            map.transposed,
            (map.height(), map.width()),
            (map.width(), map.height())
        );
        let (w0, h0) = cq!(
            self.transposed == map.transposed,
            (self.w0, self.h0),
            (self.h0, self.w0)
        );
        let added = map.depth.saturating_sub(1);
        if map.depth == 0 || w1 < added || (w1 - added, h1) != (w0, h0) {
            return Err(CarverError::geometry(format!(
                "a {}x{} map of depth {} does not fit a {}x{} carver",
                map.width(),
                map.height(),
                map.depth,
                self.width(),
                self.height()
            )));
        }

        // Twins are the pixels already hidden at the starting width.
        let mut vs = try_vec(w0 * h0, 0)?;
        let mut seen = try_vec(added + 1, 0)?;
        for y in 0..h0 {
            let mut x0 = 0;
            for x in 0..w1 {
                let v = cq!(map.transposed, map.levels[(y, x)], map.levels[(x, y)]);
                if v != 0 && v <= added {
                    continue;
                }
                let v = cq!(v == 0, 0, v - added);
                if x0 == w0 || v > added || (v > 0 && seen[v] == y + 1) {
                    return Err(broken_row(y));
                }
                seen[v] = y + 1;
                vs[y * w0 + x0] = v;
                x0 += 1;
            }
            if x0 != w0 || (1..=added).any(|v| seen[v] != y + 1) {
                return Err(broken_row(y));
            }
        }
        if added == 0 {
            return Ok(());
        }
        log::debug!("loading a visibility map of depth {}", map.depth);

        if self.transposed != map.transposed {
            self.transpose()?;
        }
        let r = sync_attached(&mut self.attached, self.resize_aux_layers, |aux| {
            aux.vs.copy_from_slice(&vs);
            aux.inflate(1, added)
        });
        self.guard(r)?;
        self.vs = vs;
        let r = self.inflate(1, added);
        self.guard(r)
    }
}
