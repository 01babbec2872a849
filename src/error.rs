// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Carver errors
//!
//! Every fallible operation returns a `CarverError`.  Geometry and
//! usage errors are checked before anything is touched and can be
//! retried with corrected arguments; allocation failures leave the
//! carver in an unknown state and deactivate it.

use failure::Fail;

/// How bad a failure is, from the caller's point of view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Severity {
    /// Nothing was mutated; fix the arguments and call again.
    Recoverable,
    /// Buffers may be half-updated.  Discard the carver.
    Fatal,
}

#[derive(Debug, Fail)]
pub enum CarverError {
    #[fail(display = "the carver has not been initialized, or was poisoned by an earlier failure")]
    InactiveCarver,

    #[fail(display = "could not allocate a buffer of {} elements", elements)]
    AllocationFailure { elements: usize },

    #[fail(display = "invalid geometry: {}", _0)]
    InvalidGeometry(String),

    #[fail(display = "attached carver #{} failed: {}", index, source)]
    PropagationFailure {
        index: usize,
        source: Box<CarverError>,
    },
}

impl CarverError {
    pub fn severity(&self) -> Severity {
        match self {
            CarverError::AllocationFailure { .. } => Severity::Fatal,
            CarverError::PropagationFailure { source, .. } => source.severity(),
            _ => Severity::Recoverable,
        }
    }

    pub(crate) fn geometry<S: Into<String>>(msg: S) -> Self {
        CarverError::InvalidGeometry(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CarverError>;

/// Allocate a vector of `len` copies of `value`, reporting failure
/// instead of aborting.
pub(crate) fn try_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| CarverError::AllocationFailure { elements: len })?;
    v.resize(len, value);
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagation_inherits_severity() {
        let err = CarverError::PropagationFailure {
            index: 2,
            source: Box::new(CarverError::AllocationFailure { elements: 12 }),
        };
        assert_eq!(err.severity(), Severity::Fatal);
        assert_eq!(
            CarverError::geometry("too small").severity(),
            Severity::Recoverable
        );
        assert!(format!("{}", err).contains("#2"));
    }

    #[test]
    fn try_vec_fills() {
        let v = try_vec(5, 1.5f64).unwrap();
        assert_eq!(v, vec![1.5; 5]);
    }
}
