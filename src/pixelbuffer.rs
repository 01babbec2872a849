// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Depth-polymorphic pixel storage
//!
//! A `PixelBuffer` is a dense, row-major, interleaved array of samples
//! of one of four depths.  Everything outside this module talks to it
//! in normalized units (0.0 to 1.0), so the carving code is written
//! once for all depths.  The only place that knows about the concrete
//! sample types is the `dispatch!` macro below.

use crate::error::{try_vec, CarverError, Result};
use num_traits::NumCast;

/// The color depth of a buffer: which sample type backs it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColorDepth {
    U8,
    U16,
    F32,
    F64,
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// One of the four supported sample types.  Sealed: the set of depths
/// is closed.
pub trait Sample: Copy + Default + NumCast + PartialOrd + sealed::Sealed + 'static {
    /// The depth tag for this type.
    const DEPTH: ColorDepth;
    /// The value that maps to 1.0.
    const ONE: f64;

    /// Convert to normalized units.
    fn to_unit(self) -> f64 {
        <f64 as NumCast>::from(self).unwrap_or(0.0) / Self::ONE
    }

    /// Convert from normalized units.  Integer depths round and clamp.
    fn from_unit(v: f64) -> Self;

    #[doc(hidden)]
    fn wrap(samples: Vec<Self>) -> Samples;

    #[doc(hidden)]
    fn unwrap(samples: &Samples) -> Option<&[Self]>;
}

macro_rules! integer_sample {
    ($t: ty, $depth: ident, $one: expr) => {
        impl Sample for $t {
            const DEPTH: ColorDepth = ColorDepth::$depth;
            const ONE: f64 = $one;

            fn from_unit(v: f64) -> Self {
                NumCast::from((v * Self::ONE).round().max(0.0).min(Self::ONE)).unwrap_or(0)
            }

            fn wrap(samples: Vec<Self>) -> Samples {
                Samples::$depth(samples)
            }

            fn unwrap(samples: &Samples) -> Option<&[Self]> {
                match samples {
                    Samples::$depth(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! float_sample {
    ($t: ty, $depth: ident) => {
        impl Sample for $t {
            const DEPTH: ColorDepth = ColorDepth::$depth;
            const ONE: f64 = 1.0;

            fn from_unit(v: f64) -> Self {
                v as $t
            }

            fn wrap(samples: Vec<Self>) -> Samples {
                Samples::$depth(samples)
            }

            fn unwrap(samples: &Samples) -> Option<&[Self]> {
                match samples {
                    Samples::$depth(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

integer_sample!(u8, U8, 255.0);
integer_sample!(u16, U16, 65535.0);
float_sample!(f32, F32);
float_sample!(f64, F64);

/// The backing store, one variant per depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

// The single dispatch point.  `$v` is bound to the concrete Vec and
// `$t` to its element type in each arm; the `depth` form picks the
// element type from a tag, for buffers that do not exist yet.
macro_rules! dispatch {
    (depth $depth: expr, $t: ident => $body: expr) => {
        match $depth {
            ColorDepth::U8 => {
                type $t = u8;
                $body
            }
            ColorDepth::U16 => {
                type $t = u16;
                $body
            }
            ColorDepth::F32 => {
                type $t = f32;
                $body
            }
            ColorDepth::F64 => {
                type $t = f64;
                $body
            }
        }
    };
    ($samples: expr, $v: ident, $t: ident => $body: expr) => {
        match $samples {
            Samples::U8($v) => {
                #[allow(dead_code)]
                type $t = u8;
                $body
            }
            Samples::U16($v) => {
                #[allow(dead_code)]
                type $t = u16;
                $body
            }
            Samples::F32($v) => {
                #[allow(dead_code)]
                type $t = f32;
                $body
            }
            Samples::F64($v) => {
                #[allow(dead_code)]
                type $t = f64;
                $body
            }
        }
    };
}

impl Samples {
    fn alloc(depth: ColorDepth, len: usize) -> Result<Samples> {
        dispatch!(depth depth, T => Ok(<T as Sample>::wrap(try_vec(len, T::default())?)))
    }

    fn depth(&self) -> ColorDepth {
        dispatch!(self, _v, T => <T as Sample>::DEPTH)
    }

    fn len(&self) -> usize {
        dispatch!(self, v, T => v.len())
    }

    fn get(&self, i: usize) -> f64 {
        dispatch!(self, v, T => v[i].to_unit())
    }

    fn set(&mut self, i: usize, value: f64) {
        dispatch!(self, v, T => v[i] = T::from_unit(value))
    }
}

/// A `width × height` image of `channels` interleaved samples per
/// pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    channels: usize,
    samples: Samples,
}

impl PixelBuffer {
    /// A zero-filled buffer.
    pub fn new(depth: ColorDepth, width: usize, height: usize, channels: usize) -> Result<Self> {
        if channels == 0 {
            return Err(CarverError::geometry("a pixel needs at least one channel"));
        }
        Ok(PixelBuffer {
            width,
            height,
            channels,
            samples: Samples::alloc(depth, width * height * channels)?,
        })
    }

    /// A buffer with every sample set to `value` (normalized units).
    pub fn filled(
        depth: ColorDepth,
        width: usize,
        height: usize,
        channels: usize,
        value: f64,
    ) -> Result<Self> {
        let mut buffer = PixelBuffer::new(depth, width, height, channels)?;
        for i in 0..buffer.samples.len() {
            buffer.samples.set(i, value);
        }
        Ok(buffer)
    }

    /// Take ownership of an existing interleaved sample vector.
    pub fn from_samples<S: Sample>(
        width: usize,
        height: usize,
        channels: usize,
        samples: Vec<S>,
    ) -> Result<Self> {
        if channels == 0 {
            return Err(CarverError::geometry("a pixel needs at least one channel"));
        }
        if samples.len() != width * height * channels {
            return Err(CarverError::geometry(format!(
                "{} samples cannot fill a {}x{}x{} buffer",
                samples.len(),
                width,
                height,
                channels
            )));
        }
        Ok(PixelBuffer {
            width,
            height,
            channels,
            samples: S::wrap(samples),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn depth(&self) -> ColorDepth {
        self.samples.depth()
    }

    /// Borrow the raw samples, if `S` matches the buffer's depth.
    pub fn as_slice<S: Sample>(&self) -> Option<&[S]> {
        S::unwrap(&self.samples)
    }

    /// Read one channel of the pixel at `(x, y)`.
    pub fn read(&self, x: usize, y: usize, channel: usize) -> f64 {
        self.samples.get(self.sample_index(y * self.width + x, channel))
    }

    /// Write one channel of the pixel at `(x, y)`.
    pub fn write(&mut self, x: usize, y: usize, channel: usize, value: f64) {
        let i = self.sample_index(y * self.width + x, channel);
        self.samples.set(i, value)
    }

    /// Read one channel by physical pixel index, ignoring the 2D shape.
    pub(crate) fn read_at(&self, pixel: usize, channel: usize) -> f64 {
        self.samples.get(self.sample_index(pixel, channel))
    }

    fn sample_index(&self, pixel: usize, channel: usize) -> usize {
        pixel * self.channels + channel
    }

    /// Copy every channel of pixel `src` of `from` into pixel `dst` of
    /// `self`.  Depths must match; the caller guarantees it.
    pub(crate) fn copy_pixel(&mut self, dst: usize, from: &PixelBuffer, src: usize) {
        let c = self.channels;
        let (dst, src) = (dst * c..(dst + 1) * c, src * c..(src + 1) * c);
        dispatch!(&mut self.samples, d, T => match <T as Sample>::unwrap(&from.samples) {
            Some(s) => d[dst].copy_from_slice(&s[src]),
            None => unreachable!("pixel copy across depths"),
        })
    }

    /// Write into pixel `dst` of `self` the average of pixels `a` and `b`
    /// of `from`.  Integer depths round to nearest.
    pub(crate) fn blend_pixel(&mut self, dst: usize, from: &PixelBuffer, a: usize, b: usize) {
        for k in 0..self.channels {
            let value = (from.read_at(a, k) + from.read_at(b, k)) / 2.0;
            let i = self.sample_index(dst, k);
            self.samples.set(i, value);
        }
    }

    /// A fresh buffer of the same depth and channel count.
    pub(crate) fn alloc_like(&self, width: usize, height: usize) -> Result<PixelBuffer> {
        PixelBuffer::new(self.depth(), width, height, self.channels)
    }

    /// The 90° transpose: rows become columns.
    pub fn transposed(&self) -> Result<PixelBuffer> {
        let mut out = self.alloc_like(self.height, self.width)?;
        for y in 0..self.height {
            for x in 0..self.width {
                out.copy_pixel(x * self.height + y, self, y * self.width + x);
            }
        }
        Ok(out)
    }
}
