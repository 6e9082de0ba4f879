//! Discrete beat-unit grid used by the game clock.
//!
//! The engine does not count time linearly in milliseconds. Every interval
//! between two consecutive markers is split into the same number of steps,
//! so the absolute width of a step depends on the width of the interval it
//! belongs to. Times are mapped onto the grid by snapping to the nearest
//! point.

use serde::{Deserialize, Serialize};

/// Number of grid steps appended for every interval between two markers.
pub const SUBDIVISIONS_PER_MARKER: usize = 24;

/// Ordered sequence of grid points built from a marker list.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatGrid {
    units: Vec<f64>,
}

impl BeatGrid {
    /// Builds the grid for `markers`.
    ///
    /// The grid always starts at `0` and gains exactly
    /// [`SUBDIVISIONS_PER_MARKER`] points per marker interval, whatever the
    /// size of that interval. Fewer than two markers yield the single point
    /// `[0]`.
    pub fn build(markers: &[f64]) -> Self {
        let intervals = markers.len().saturating_sub(1);
        let mut units = Vec::with_capacity(1 + SUBDIVISIONS_PER_MARKER * intervals);
        units.push(0.0);

        for pair in markers.windows(2) {
            let step = (pair[1] - pair[0]) / SUBDIVISIONS_PER_MARKER as f64;
            let mut last = units[units.len() - 1];
            for _ in 0..SUBDIVISIONS_PER_MARKER {
                last += step;
                units.push(last);
            }
        }

        Self { units }
    }

    pub fn units(&self) -> &[f64] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always false: a grid holds at least its origin point.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Value of the grid point at `index`, if it exists.
    pub fn unit_at(&self, index: usize) -> Option<f64> {
        self.units.get(index).copied()
    }

    /// Index of the point closest to `value`. Equal distances keep the
    /// earliest index.
    fn closest_index(&self, value: f64) -> usize {
        let mut closest = 0;
        let mut min_diff = (self.units[0] - value).abs();

        for (index, unit) in self.units.iter().enumerate().skip(1) {
            let diff = (unit - value).abs();
            if diff < min_diff {
                min_diff = diff;
                closest = index;
            }
        }

        closest
    }
}

/// How [`TimeMapper::map_span`] interprets its second argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingMode {
    /// The second argument is an absolute time mapped on its own; the
    /// resulting index is returned as the duration.
    Absolute,
    /// The second argument is a span length added to the start time before
    /// mapping; the duration is the difference of the two indices.
    Relative,
}

/// Start and duration expressed in grid indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: i64,
    pub duration: i64,
}

/// Maps real timestamps onto an immutable [`BeatGrid`].
#[derive(Debug, Clone)]
pub struct TimeMapper {
    grid: BeatGrid,
    mode: MappingMode,
}

impl TimeMapper {
    pub fn new(grid: BeatGrid, mode: MappingMode) -> Self {
        Self { grid, mode }
    }

    /// Builds the grid from `markers` and wraps it in a mapper.
    pub fn from_markers(markers: &[f64], mode: MappingMode) -> Self {
        Self::new(BeatGrid::build(markers), mode)
    }

    pub fn grid(&self) -> &BeatGrid {
        &self.grid
    }

    pub fn mode(&self) -> MappingMode {
        self.mode
    }

    /// Returns the index of the grid point nearest to `|time|`, carrying the
    /// sign of `time`. Times past the end of the grid snap to the last index.
    pub fn to_index(&self, time: f64) -> i64 {
        let index = self.grid.closest_index(time.abs()) as i64;
        if time < 0.0 {
            -index
        } else {
            index
        }
    }

    /// Grid value for a (possibly negative) index, clamped to the grid.
    pub fn to_time(&self, index: i64) -> f64 {
        let last = self.grid.len() - 1;
        let clamped = (index.unsigned_abs() as usize).min(last);
        let value = self.grid.units[clamped];
        if index < 0 {
            -value
        } else {
            value
        }
    }

    /// Maps a start time and a second value into a [`TimeSpan`] according to
    /// the configured [`MappingMode`].
    pub fn map_span(&self, time: f64, duration: f64) -> TimeSpan {
        let start = self.to_index(time);
        let duration = match self.mode {
            MappingMode::Absolute => self.to_index(duration),
            MappingMode::Relative => self.to_index(time + duration) - start,
        };

        TimeSpan { start, duration }
    }
}
