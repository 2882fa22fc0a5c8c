//! Anneal schedules as piecewise linear `(t, s)` points, with `t` in microseconds and `s` the normalised anneal
//! fraction. `s = 1` is the fully classical end of the anneal.

use crate::errors::{NurseError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnealSchedule {
    points: Vec<(f64, f64)>,
}

impl AnnealSchedule {
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self> {
        let schedule = Self { points };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Pairs up time and anneal fraction lists.
    pub fn from_parts(t: &[f64], s: &[f64]) -> Result<Self> {
        if t.len() != s.len() {
            return Err(NurseError::InvalidSchedule(format!(
                "{} times for {} anneal fractions",
                t.len(),
                s.len()
            )));
        }
        Self::new(t.iter().copied().zip(s.iter().copied()).collect())
    }

    /// Start classical, back off to s = 0.6 for 10 us, then return.
    pub fn reverse_default() -> Self {
        Self {
            points: vec![(0.0, 1.0), (2.0, 0.6), (12.0, 0.6), (14.0, 1.0)],
        }
    }

    pub fn forward(duration: f64) -> Self {
        Self {
            points: vec![(0.0, 0.0), (duration, 1.0)],
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(NurseError::InvalidSchedule(msg));

        if self.points.len() < 2 {
            return invalid(format!("need at least 2 points, got {}", self.points.len()));
        }
        if self.points[0].0 != 0.0 {
            return invalid(format!("must start at t = 0, starts at {}", self.points[0].0));
        }
        for window in self.points.windows(2) {
            if window[1].0 <= window[0].0 {
                return invalid(format!(
                    "time must strictly increase, {} follows {}",
                    window[1].0, window[0].0
                ));
            }
        }
        if let Some(&(t, s)) = self.points.iter().find(|(_, s)| !(0.0..=1.0).contains(s)) {
            return invalid(format!("s = {s} at t = {t} is outside [0, 1]"));
        }
        if let Some(&(_, s)) = self.points.last() {
            if s != 1.0 {
                return invalid(format!("must end at s = 1, ends at {s}"));
            }
        }
        Ok(())
    }

    /// A schedule that starts at s = 1 anneals backwards from a classical state.
    pub fn is_reverse(&self) -> bool {
        self.points.first().is_some_and(|&(_, s)| s == 1.0)
    }

    pub fn duration(&self) -> f64 {
        self.points.last().map_or(0.0, |&(t, _)| t)
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Anneal fraction at time t, clamped to the end points outside the schedule.
    pub fn s_at(&self, t: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 1.0,
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        for window in self.points.windows(2) {
            let (t0, s0) = window[0];
            let (t1, s1) = window[1];
            if t <= t1 {
                return s0 + (s1 - s0) * (t - t0) / (t1 - t0);
            }
        }
        last.1
    }

    /// The smallest anneal fraction reached, the point of deepest re-annealing.
    pub fn min_s(&self) -> f64 {
        self.points.iter().map(|&(_, s)| s).fold(1.0, f64::min)
    }
}

impl Default for AnnealSchedule {
    fn default() -> Self {
        Self::reverse_default()
    }
}
