// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The carver
//!
//! A `Carver` owns an image and everything needed to resize it by seam
//! carving.  The pixels never move: they live in a `w0 × h0` arena,
//! and a table of physical indices (`raw`) says which of them are
//! visible at the current width, row by row, left to right.  Removing a
//! seam is a matter of shifting the tail of every row of that table one
//! step to the left.
//!
//! Each pixel also carries a visibility level.  Level 0 pixels are
//! never removed; a pixel with level `v` is visible as long as the
//! current level (`w0 - w + 1`) is at most `v`.  Once the levels have
//! been computed for some range of widths, any width in that range is
//! just a rebuild of the index table.
//!
//! A `Carver` is not `Send` while a progress reporter is installed.
//! Share one between threads only behind your own lock.

use crate::cq;
use crate::energy::default_alpha;
use crate::error::{try_vec, CarverError, Result, Severity};
use crate::gradient::GradientFunction;
use crate::minpath::{self, CostGrid, TieBreak};
use crate::pixelbuffer::{ColorDepth, PixelBuffer};
use crate::progress::{Progress, ProgressMessages, Session};
use crate::rigidity::Rigidity;
use crate::seam;

/// Which dimension `resize` handles first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResizeOrder {
    Horizontal,
    Vertical,
}

impl Default for ResizeOrder {
    fn default() -> Self {
        ResizeOrder::Horizontal
    }
}

pub struct Carver {
    pub(crate) w: usize,
    pub(crate) h: usize,
    pub(crate) w0: usize,
    pub(crate) h0: usize,
    pub(crate) w_start: usize,
    pub(crate) h_start: usize,

    pub(crate) transposed: bool,
    pub(crate) active: bool,
    pub(crate) level: usize,
    pub(crate) max_level: usize,

    pub(crate) resize_order: ResizeOrder,
    pub(crate) resize_aux_layers: bool,
    pub(crate) enl_step: f64,
    pub(crate) lr_switch_frequency: usize,
    pub(crate) tie: TieBreak,
    pub(crate) rigidity: Rigidity,
    pub(crate) rigidity_mask: Option<Vec<f64>>,
    pub(crate) gradient: GradientFunction,
    pub(crate) alpha_channel: Option<usize>,

    pub(crate) rgb: PixelBuffer,
    pub(crate) vs: Vec<usize>,
    pub(crate) en: Vec<f64>,
    pub(crate) bias: Vec<f64>,
    pub(crate) m: Vec<f64>,
    pub(crate) raw: Vec<Vec<usize>>,
    pub(crate) vpath_x: Vec<usize>,
    pub(crate) nrg_band: Vec<Option<(usize, usize)>>,

    pub(crate) progress: Option<Box<dyn Progress>>,
    pub(crate) progress_messages: ProgressMessages,
    pub(crate) session: Session,
    pub(crate) attached: Vec<Carver>,
}

impl std::fmt::Debug for Carver {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Carver")
            .field("w", &self.w)
            .field("h", &self.h)
            .field("w0", &self.w0)
            .field("h0", &self.h0)
            .field("transposed", &self.transposed)
            .field("active", &self.active)
            .field("level", &self.level)
            .field("max_level", &self.max_level)
            .field("attached", &self.attached.len())
            .finish()
    }
}

// The identity index table for a fresh `width × height` arena.
pub(crate) fn identity_raw(width: usize, height: usize) -> Result<Vec<Vec<usize>>> {
    let mut raw = Vec::new();
    raw.try_reserve_exact(height)
        .map_err(|_| CarverError::AllocationFailure { elements: height })?;
    for y in 0..height {
        let mut row = try_vec(width, 0)?;
        row.iter_mut()
            .enumerate()
            .for_each(|(x, z)| *z = y * width + x);
        raw.push(row);
    }
    Ok(raw)
}

impl Carver {
    /// Take ownership of an image.  The carver is inactive until `init`.
    pub fn new(buffer: PixelBuffer) -> Result<Carver> {
        let (width, height) = (buffer.width(), buffer.height());
        if width == 0 || height == 0 {
            return Err(CarverError::geometry(format!(
                "cannot carve an empty {}x{} image",
                width, height
            )));
        }
        Ok(Carver {
            w: width,
            h: height,
            w0: width,
            h0: height,
            w_start: width,
            h_start: height,
            transposed: false,
            active: false,
            level: 1,
            max_level: 1,
            resize_order: ResizeOrder::default(),
            resize_aux_layers: true,
            enl_step: 2.0,
            lr_switch_frequency: 0,
            tie: TieBreak::Left,
            rigidity: Rigidity::new(0.0, 1, height),
            rigidity_mask: None,
            gradient: GradientFunction::default(),
            alpha_channel: default_alpha(buffer.channels()),
            rgb: buffer,
            vs: try_vec(width * height, 0)?,
            en: Vec::new(),
            bias: Vec::new(),
            m: Vec::new(),
            raw: identity_raw(width, height)?,
            vpath_x: try_vec(height, 0)?,
            nrg_band: try_vec(height, None)?,
            progress: None,
            progress_messages: ProgressMessages::default(),
            session: Session::default(),
            attached: Vec::new(),
        })
    }

    /// Allocate the energy, bias and minimum-path maps and make the
    /// carver ready to resize.  `delta_x` is the largest sideways step a
    /// seam may take between rows; `rigidity` penalizes such steps.
    pub fn init(&mut self, delta_x: usize, rigidity: f64) -> Result<()> {
        if rigidity < 0.0 || !rigidity.is_finite() {
            return Err(CarverError::geometry(format!(
                "rigidity must be a non-negative number, not {}",
                rigidity
            )));
        }
        let size = self.w0 * self.h0;
        let r = self.alloc_maps(size);
        self.guard(r)?;
        if self.bias.is_empty() {
            let bias = try_vec(size, 0.0);
            self.bias = self.guard(bias)?;
        }
        self.rigidity = Rigidity::new(rigidity, delta_x, self.h);
        self.active = true;
        log::debug!(
            "carver {}x{} initialized, delta_x {}, rigidity {}",
            self.w,
            self.h,
            delta_x,
            rigidity
        );
        Ok(())
    }

    // Energy and cost maps, sized to the arena.  Only active carvers
    // have them.
    pub(crate) fn alloc_maps(&mut self, size: usize) -> Result<()> {
        self.en = try_vec(size, 0.0)?;
        self.m = try_vec(size, 0.0)?;
        Ok(())
    }

    /// Deactivate on fatal errors; pass everything through.
    pub(crate) fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(ref e) = result {
            if e.severity() == Severity::Fatal {
                log::error!("carver poisoned: {}", e);
                self.active = false;
            }
        }
        result
    }

    pub(crate) fn check_active(&self) -> Result<()> {
        cq!(self.active, Ok(()), Err(CarverError::InactiveCarver))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_gradient_function(&mut self, gradient: GradientFunction) {
        self.gradient = gradient;
    }

    /// The largest factor by which one enlargement step may grow the
    /// image.  Must lie in (1, 2].
    pub fn set_enl_step(&mut self, enl_step: f64) -> Result<()> {
        if !(enl_step > 1.0 && enl_step <= 2.0) {
            return Err(CarverError::geometry(format!(
                "enlargement step must lie in (1, 2], not {}",
                enl_step
            )));
        }
        self.enl_step = enl_step;
        Ok(())
    }

    pub fn enl_step(&self) -> f64 {
        self.enl_step
    }

    pub fn set_resize_order(&mut self, order: ResizeOrder) {
        self.resize_order = order;
    }

    /// Flip the left/right tie preference `frequency` times during each
    /// map build.  Zero keeps it fixed.
    pub fn set_side_switch_frequency(&mut self, frequency: usize) {
        self.lr_switch_frequency = frequency;
    }

    /// Whether attached carvers follow this one.  With `false` they stay
    /// at their original size.
    pub fn set_resize_aux_layers(&mut self, resize: bool) {
        self.resize_aux_layers = resize;
    }

    pub fn set_progress(&mut self, progress: Box<dyn Progress>) {
        self.progress = Some(progress);
    }

    pub fn set_progress_init_width_message(&mut self, message: &str) {
        self.progress_messages.init_width = message.to_owned();
    }

    pub fn set_progress_init_height_message(&mut self, message: &str) {
        self.progress_messages.init_height = message.to_owned();
    }

    pub fn set_progress_end_width_message(&mut self, message: &str) {
        self.progress_messages.end_width = message.to_owned();
    }

    pub fn set_progress_end_height_message(&mut self, message: &str) {
        self.progress_messages.end_height = message.to_owned();
    }

    pub fn progress_messages(&self) -> &ProgressMessages {
        &self.progress_messages
    }

    /// Which channel weighs brightness.  `None` treats every channel as
    /// color.
    pub fn set_alpha_channel(&mut self, channel: Option<usize>) -> Result<()> {
        if let Some(k) = channel {
            if k >= self.rgb.channels() {
                return Err(CarverError::geometry(format!(
                    "no channel {} in a {}-channel image",
                    k,
                    self.rgb.channels()
                )));
            }
        }
        self.alpha_channel = channel;
        Ok(())
    }

    /// Current width, in the caller's orientation.
    pub fn width(&self) -> usize {
        cq!(self.transposed, self.h, self.w)
    }

    /// Current height, in the caller's orientation.
    pub fn height(&self) -> usize {
        cq!(self.transposed, self.w, self.h)
    }

    pub fn channels(&self) -> usize {
        self.rgb.channels()
    }

    pub fn depth(&self) -> ColorDepth {
        self.rgb.depth()
    }

    /// One channel of the visible pixel at `(x, y)`, normalized.
    pub fn pixel(&self, x: usize, y: usize, channel: usize) -> Result<f64> {
        if x >= self.width() || y >= self.height() || channel >= self.channels() {
            return Err(CarverError::geometry(format!(
                "({}, {}, {}) is outside a {}x{}x{} image",
                x,
                y,
                channel,
                self.width(),
                self.height(),
                self.channels()
            )));
        }
        let (x, y) = cq!(self.transposed, (y, x), (x, y));
        Ok(self.rgb.read_at(self.raw[y][x], channel))
    }

    /// Copy out the visible image, in the caller's orientation.
    pub fn readout(&self) -> Result<PixelBuffer> {
        let mut out = self.rgb.alloc_like(self.w, self.h)?;
        for (y, row) in self.raw.iter().take(self.h).enumerate() {
            for (x, z) in row.iter().take(self.w).enumerate() {
                out.copy_pixel(y * self.w + x, &self.rgb, *z);
            }
        }
        cq!(self.transposed, out.transposed(), Ok(out))
    }

    /// Show the pixels visible at width `w1`.  The map must cover it.
    pub(crate) fn set_width(&mut self, w1: usize) {
        self.w = w1;
        self.level = self.w0 - w1 + 1;
        self.rebuild_raw();
    }

    // Refill the index table from the visibility levels.
    pub(crate) fn rebuild_raw(&mut self) {
        let (w0, level, vs) = (self.w0, self.level, &self.vs);
        for (y, row) in self.raw.iter_mut().take(self.h).enumerate() {
            let visible = (y * w0..(y + 1) * w0).filter(|z| vs[*z] == 0 || vs[*z] >= level);
            for (slot, z) in row.iter_mut().zip(visible) {
                *slot = z;
            }
        }
    }

    /// Remove one seam, given its column in every row.
    pub(crate) fn remove_seam(&mut self, columns: &[usize]) -> Result<()> {
        if columns.len() != self.h || columns.iter().any(|x| *x >= self.w) || self.w < 2 {
            return Err(CarverError::geometry(format!(
                "a seam of {} columns does not fit a {}x{} image",
                columns.len(),
                self.w,
                self.h
            )));
        }
        let (w, level) = (self.w, self.level);
        for (y, x) in columns.iter().enumerate() {
            let row = &mut self.raw[y];
            self.vs[row[*x]] = level;
            row.copy_within(x + 1..w, *x);
        }
        self.vpath_x.copy_from_slice(columns);
        self.level += 1;
        self.w -= 1;
        Ok(())
    }

    fn window(&mut self) -> Window {
        Window {
            w: self.w,
            h: self.h,
            raw: &self.raw,
            en: &self.en,
            m: &mut self.m,
            mask: self.rigidity_mask.as_ref().map(|m| m.as_slice()),
        }
    }

    /// Fill the whole minimum-path table for the visible window.
    pub(crate) fn build_mmap(&mut self) {
        let (rigidity, tie) = (self.rigidity.clone(), self.tie);
        minpath::build(&mut self.window(), &rigidity, tie);
    }

    /// Refresh the table after the last seam removal.
    pub(crate) fn update_mmap(&mut self) {
        let d = self.rigidity.delta_x();
        let w = self.w;
        // Rows whose predecessor window straddles the gaps of this row
        // and the previous one see different pixels above them.
        let bands: Vec<Option<(usize, usize)>> = (0..self.h)
            .map(|y| {
                let energy = self.nrg_band[y];
                if y == 0 {
                    return energy;
                }
                let (s0, s1) = (self.vpath_x[y - 1], self.vpath_x[y]);
                let lo = s0.min(s1).saturating_sub(d + 1);
                let hi = (s0.max(s1) + d).min(w - 1);
                let crossing = cq!(lo <= hi, Some((lo, hi)), None);
                match (energy, crossing) {
                    (Some((l1, h1)), Some((l2, h2))) => Some((l1.min(l2), h1.max(h2))),
                    (a, None) => a,
                    (None, b) => b,
                }
            })
            .collect();
        let (rigidity, tie) = (self.rigidity.clone(), self.tie);
        minpath::update_bands(&mut self.window(), &rigidity, tie, &bands);
    }

    /// The cheapest seam through the visible window.
    pub(crate) fn build_vpath(&mut self) -> Vec<usize> {
        let (rigidity, tie) = (self.rigidity.clone(), self.tie);
        seam::extract(&self.window(), &rigidity, tie)
    }

    // `height` picks which pair of messages to send.
    pub(crate) fn report_init(&mut self, total: usize, height: bool) {
        if let Some(progress) = self.progress.as_mut() {
            self.session = Session::new(total, progress.update_step());
            progress.init(self.progress_messages.init(height));
        }
    }

    pub(crate) fn report_tick(&mut self) {
        if let Some(progress) = self.progress.as_mut() {
            if self.session.tick() {
                progress.update(self.session.fraction());
            }
        }
    }

    pub(crate) fn report_end(&mut self, height: bool) {
        if let Some(progress) = self.progress.as_mut() {
            progress.end(self.progress_messages.end(height));
        }
    }
}

// The visible window of a carver, seen by the dynamic program.
struct Window<'a> {
    w: usize,
    h: usize,
    raw: &'a [Vec<usize>],
    en: &'a [f64],
    m: &'a mut [f64],
    mask: Option<&'a [f64]>,
}

impl<'a> CostGrid for Window<'a> {
    fn width(&self) -> usize {
        self.w
    }

    fn height(&self) -> usize {
        self.h
    }

    #[inline]
    fn energy(&self, x: usize, y: usize) -> f64 {
        self.en[self.raw[y][x]]
    }

    #[inline]
    fn cost(&self, x: usize, y: usize) -> f64 {
        self.m[self.raw[y][x]]
    }

    #[inline]
    fn set_cost(&mut self, x: usize, y: usize, cost: f64) {
        self.m[self.raw[y][x]] = cost
    }

    fn rigidity_factor(&self, x: usize, y: usize) -> f64 {
        self.mask.map_or(1.0, |m| m[self.raw[y][x]])
    }
}
