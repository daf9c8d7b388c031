//! Date → column mapping.
//!
//! The engine never computes horizontal positions itself; it asks a [`Timeline`]. [`DayScale`]
//! is the stock axis with one evenly spaced tick per calendar day.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::grid::Column;

/// Maps a calendar day to its column. Columns must not decrease as days advance.
pub trait Timeline {
    fn column(&self, day: NaiveDate) -> Column;
}

impl<F> Timeline for F
where
    F: Fn(NaiveDate) -> Column,
{
    fn column(&self, day: NaiveDate) -> Column {
        self(day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickLabel {
    pub column: Column,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayScale {
    start: NaiveDate,
    end: NaiveDate,
    tick: i64,
}

impl DayScale {
    /// `tick` is the distance between consecutive days; values below 1 are raised to 1.
    pub fn new(start: NaiveDate, end: NaiveDate, tick: i64) -> Self {
        Self {
            start,
            end: end.max(start),
            tick: tick.max(1),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn tick(&self) -> i64 {
        self.tick
    }

    /// Number of day ticks, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Full axis width: one tick of margin on each side.
    pub fn width(&self) -> i64 {
        self.days() * self.tick + self.tick * 2
    }

    /// Days from `start` through `end`, in order.
    pub fn ticks(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.days() as usize)
    }

    /// Axis labels: the first and last day, plus every first of a month that sits more than ten
    /// days away from both ends.
    pub fn labels(&self, view_format: &str) -> Vec<TickLabel> {
        let days = self.days();
        self.ticks()
            .enumerate()
            .filter(|&(k, day)| {
                let k = k as i64;
                k == 0 || k == days - 1 || (day.day() == 1 && k > 10 && k < days - 10)
            })
            .map(|(_, day)| TickLabel {
                column: self.column(day),
                text: day.format(view_format).to_string(),
            })
            .collect()
    }
}

impl Timeline for DayScale {
    fn column(&self, day: NaiveDate) -> Column {
        let k = (day - self.start).num_days();
        Column(k * self.tick + self.tick)
    }
}

/// Calendar days from `from` back to `to`, both inclusive, latest first. Empty when `to` is
/// later than `from`.
pub(crate) fn days_back(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(from), |d| d.pred_opt()).take_while(move |d| *d >= to)
}
