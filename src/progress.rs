//! Progress reporting.
//!
//! A resize may compute hundreds of seams.  A carver with a reporter
//! calls `init` once, `update` every time another `update_step` of the
//! work is done, and `end` when it finishes.  Reporting never affects
//! the result.

use crate::cq;

/// Callbacks for long-running resizes.  Every method has a no-op
/// default.
pub trait Progress {
    fn init(&mut self, _message: &str) {}
    fn update(&mut self, _fraction: f64) {}
    fn end(&mut self, _message: &str) {}

    /// Fraction of the work between two `update` calls.
    fn update_step(&self) -> f64 {
        0.02
    }
}

/// Reports through the `log` facade at `info` level.
#[derive(Debug, Default)]
pub struct LogProgress {
    last: f64,
}

impl Progress for LogProgress {
    fn init(&mut self, message: &str) {
        self.last = 0.0;
        log::info!("{}", message);
    }

    fn update(&mut self, fraction: f64) {
        // One line every ten percent is plenty for a log.
        if fraction - self.last >= 0.1 {
            self.last = fraction;
            log::info!("{:3.0}%", fraction * 100.0);
        }
    }

    fn end(&mut self, message: &str) {
        log::info!("{}", message);
    }
}

/// What a carver passes to `init` and `end`, for each direction.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressMessages {
    pub init_width: String,
    pub init_height: String,
    pub end_width: String,
    pub end_height: String,
}

impl Default for ProgressMessages {
    fn default() -> Self {
        ProgressMessages {
            init_width: "Resizing width...".to_owned(),
            init_height: "Resizing height...".to_owned(),
            end_width: "done".to_owned(),
            end_height: "done".to_owned(),
        }
    }
}

impl ProgressMessages {
    pub(crate) fn init(&self, height: bool) -> &str {
        cq!(height, &self.init_height, &self.init_width)
    }

    pub(crate) fn end(&self, height: bool) -> &str {
        cq!(height, &self.end_height, &self.end_width)
    }
}

// Tracks when a session should report, given its total size.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub total: usize,
    pub current: usize,
    pub step: usize,
}

impl Session {
    pub fn new(total: usize, step_fraction: f64) -> Self {
        Session {
            total,
            current: 0,
            step: ((total as f64 * step_fraction) as usize).max(1),
        }
    }

    /// Advance by one unit; true when a report is due.
    pub fn tick(&mut self) -> bool {
        self.current += 1;
        self.current % self.step == 0
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.current as f64 / self.total as f64).min(1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_reports_every_step() {
        let mut session = Session::new(100, 0.1);
        let due = (0..100).filter(|_| session.tick()).count();
        assert_eq!(due, 10);
        assert_eq!(session.fraction(), 1.0);
    }

    #[test]
    fn messages_follow_the_direction() {
        let messages = ProgressMessages {
            end_height: "rows done".to_owned(),
            ..ProgressMessages::default()
        };
        assert_eq!(messages.init(false), "Resizing width...");
        assert_eq!(messages.init(true), "Resizing height...");
        assert_eq!(messages.end(false), "done");
        assert_eq!(messages.end(true), "rows done");
    }

    #[test]
    fn tiny_sessions_report_every_unit() {
        let mut session = Session::new(3, 0.02);
        assert_eq!(session.step, 1);
        assert!(session.tick());
    }
}
