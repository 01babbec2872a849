// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Attached carvers
//!
//! An attached carver is an auxiliary layer (a mask, a depth map, a
//! second exposure) that must be resized exactly like the root image.
//! It never computes seams of its own.  Every structural operation on
//! the root is replayed on each attachment, in order, synchronously.
//!
//! A replay that fails stops the fan-out.  The root and any earlier
//! attachments keep the work already done.

use crate::carver::Carver;
use crate::error::{CarverError, Result};

/// Run `op` on every attachment, in order, unless replay is disabled.
pub(crate) fn sync_attached<F>(attached: &mut [Carver], enabled: bool, mut op: F) -> Result<()>
where
    F: FnMut(&mut Carver) -> Result<()>,
{
    if !enabled {
        return Ok(());
    }
    for (index, aux) in attached.iter_mut().enumerate() {
        op(aux).map_err(|e| {
            log::warn!("attached carver #{} failed: {}", index, e);
            CarverError::PropagationFailure {
                index,
                source: Box::new(e),
            }
        })?;
    }
    Ok(())
}

impl Carver {
    /// Attach `aux` so that it follows every resize of this carver.
    /// Both must have the same size, be in their original orientation,
    /// and have no visibility map yet.  Anything already attached to
    /// `aux` is attached here instead.
    pub fn attach(&mut self, mut aux: Carver) -> Result<()> {
        if (aux.w0, aux.h0, aux.w, aux.h) != (self.w0, self.h0, self.w, self.h) {
            return Err(CarverError::geometry(format!(
                "cannot attach a {}x{} carver to a {}x{} one",
                aux.w, aux.h, self.w, self.h
            )));
        }
        if self.transposed || aux.transposed {
            return Err(CarverError::geometry("cannot attach while transposed"));
        }
        if self.max_level > 1 || aux.max_level > 1 {
            return Err(CarverError::geometry(
                "cannot attach once a visibility map has been built",
            ));
        }
        let nested = std::mem::replace(&mut aux.attached, Vec::new());
        aux.vs.copy_from_slice(&self.vs);
        aux.level = self.level;
        self.attached.push(aux);
        self.attached.extend(nested);
        log::debug!("{} carver(s) attached", self.attached.len());
        Ok(())
    }

    /// The attachments, in replay order.  They change only through
    /// this carver; to work on one alone, detach it first.
    pub fn attached(&self) -> &[Carver] {
        &self.attached
    }

    /// Give back the attachments, detaching them.
    pub fn detach_all(&mut self) -> Vec<Carver> {
        std::mem::replace(&mut self.attached, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixelbuffer::PixelBuffer;

    fn carver(width: usize, height: usize) -> Carver {
        Carver::new(PixelBuffer::from_samples(width, height, 1, vec![0u8; width * height]).unwrap())
            .unwrap()
    }

    #[test]
    fn nested_attachments_are_flattened() {
        let mut root = carver(4, 3);
        let mut middle = carver(4, 3);
        middle.attach(carver(4, 3)).unwrap();
        middle.attach(carver(4, 3)).unwrap();
        root.attach(middle).unwrap();
        assert_eq!(root.attached().len(), 3);
        assert!(root.attached().iter().all(|a| a.attached().is_empty()));
    }

    #[test]
    fn detached_layers_keep_their_last_size() {
        let mut root = carver(5, 3);
        root.init(1, 0.0).unwrap();
        root.attach(carver(5, 3)).unwrap();
        root.resize_width(3).unwrap();
        assert_eq!(root.attached()[0].width(), 3);

        let layers = root.detach_all();
        assert!(root.attached().is_empty());
        assert_eq!(layers.len(), 1);
        root.resize_width(4).unwrap();
        assert_eq!(root.width(), 4);
        assert_eq!(layers[0].width(), 3);
        assert_eq!(layers[0].readout().unwrap().width(), 3);
    }

    #[test]
    fn mismatched_geometry_is_refused() {
        let mut root = carver(4, 3);
        assert!(root.attach(carver(3, 4)).is_err());
        assert!(root.attached().is_empty());
    }

    #[test]
    fn first_failure_stops_the_fan_out() {
        let mut layers = vec![carver(2, 2), carver(2, 2), carver(2, 2)];
        let mut visited = 0;
        let result = sync_attached(&mut layers, true, |aux| {
            visited += 1;
            remove_or_fail(visited == 2, aux)
        });
        match result {
            Err(CarverError::PropagationFailure { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(visited, 2);
        assert_eq!(layers[0].w, 1);
        assert_eq!(layers[2].w, 2);
    }

    #[test]
    fn disabled_replay_touches_nothing() {
        let mut layers = vec![carver(2, 2)];
        sync_attached(&mut layers, false, |_| panic!("replayed")).unwrap();
    }

    // Remove a seam, or fail when asked to.
    fn remove_or_fail(fail: bool, aux: &mut Carver) -> Result<()> {
        if fail {
            Err(CarverError::geometry("boom"))
        } else {
            aux.remove_seam(&[0, 0])
        }
    }
}
