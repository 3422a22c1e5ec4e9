// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reports emitted between pages of a long-running command.

use serde::{Deserialize, Serialize};

/// One progress step: a percentage and an optional short note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 0–100, non-decreasing within one command.
    pub percent: u8,
    pub note: Option<String>,
}

impl Progress {
    /// Progress after `done` of `total` steps.
    pub fn of(done: usize, total: usize, note: impl Into<String>) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((done.min(total) as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            percent,
            note: Some(note.into()),
        }
    }
}

/// Receiver for progress reports. Any `FnMut(Progress)` closure qualifies.
pub trait ProgressSink {
    fn report(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressSink for F {
    fn report(&mut self, progress: Progress) {
        self(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(Progress::of(1, 3, "").percent, 33);
        assert_eq!(Progress::of(2, 3, "").percent, 67);
        assert_eq!(Progress::of(3, 3, "").percent, 100);
    }

    #[test]
    fn empty_total_is_complete() {
        assert_eq!(Progress::of(0, 0, "").percent, 100);
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: Progress| seen.push(p.percent);
            sink.report(Progress::of(1, 2, "half"));
        }
        assert_eq!(seen, vec![50]);
    }
}
