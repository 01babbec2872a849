// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Moving pixels between the `image` crate and the carver.

use crate::carver::Carver;
use crate::error::{CarverError, Result};
use crate::pixelbuffer::{PixelBuffer, Sample};
use crate::twodmap::TwoDimensionalMap;
use image::{GenericImageView, GrayImage, ImageBuffer, Luma, Pixel, Primitive};
use itertools::iproduct;

/// Copy any image view into a new, inactive carver.  The sample type
/// of the image becomes the color depth of the carver.
pub fn carver_from_image<I, P, S>(image: &I) -> Result<Carver>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + Sample + 'static,
{
    let (width, height) = image.dimensions();
    let channels = P::CHANNEL_COUNT as usize;
    let mut samples = Vec::with_capacity(width as usize * height as usize * channels);
    for (y, x) in iproduct!(0..height, 0..width) {
        samples.extend_from_slice(image.get_pixel(x, y).channels());
    }
    Carver::new(PixelBuffer::from_samples(
        width as usize,
        height as usize,
        channels,
        samples,
    )?)
}

/// Copy a buffer into an `ImageBuffer`.  The channel counts must agree;
/// the depth is converted if it differs.
pub fn buffer_to_image<P, S>(buffer: &PixelBuffer) -> Result<ImageBuffer<P, Vec<S>>>
where
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + Sample + 'static,
{
    let (width, height, channels) = (buffer.width(), buffer.height(), buffer.channels());
    if channels != P::CHANNEL_COUNT as usize {
        return Err(CarverError::geometry(format!(
            "cannot store {} channels in a {}-channel pixel",
            channels,
            P::CHANNEL_COUNT
        )));
    }
    let samples = match buffer.as_slice::<S>() {
        Some(samples) => samples.to_vec(),
        None => iproduct!(0..height, 0..width, 0..channels)
            .map(|(y, x, k)| S::from_unit(buffer.read(x, y, k)))
            .collect(),
    };
    ImageBuffer::from_raw(width as u32, height as u32, samples)
        .ok_or_else(|| CarverError::geometry("image buffer size mismatch"))
}

impl Carver {
    /// The visible image as an `ImageBuffer`.
    pub fn to_image<P, S>(&self) -> Result<ImageBuffer<P, Vec<S>>>
    where
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + Sample + 'static,
    {
        buffer_to_image(&self.readout()?)
    }
}

/// Render an energy map as a greyscale image, brightest where the
/// energy is highest.
pub fn energy_to_image(energy: &TwoDimensionalMap<f64>) -> GrayImage {
    let (width, height) = (energy.width as u32, energy.height as u32);
    let factor = energy
        .as_slice()
        .iter()
        .cloned()
        .fold(0.0f64, f64::max);
    let mut out: GrayImage = ImageBuffer::new(width, height);
    for (y, x) in iproduct!(0..height, 0..width) {
        let e = energy[(x as usize, y as usize)];
        let c = if factor > 0.0 {
            (e / factor * 255.0).round().max(0.0).min(255.0) as u8
        } else {
            0
        };
        out.put_pixel(x, y, Luma([c]));
    }
    out
}
