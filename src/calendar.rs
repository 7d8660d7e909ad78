//! Sunday-anchored month grid and spatial date navigation.
//!
//! A date's cell is `(week, column)` where
//! `index = day - 1 + first_weekday_of_month`, `week = index / 7` and
//! `column = index % 7`. Moving is arithmetic on that index, so crossing a
//! month boundary needs no special casing: the resulting offset from the
//! 1st is simply applied with date arithmetic.
use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::NavDirection;

pub const WEEKDAY_HEADER: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// Grid coordinates of `date` within its own month.
pub fn grid_position(date: NaiveDate) -> (i64, i64) {
    let index = grid_index(date);
    (index / 7, index % 7)
}

fn grid_index(date: NaiveDate) -> i64 {
    let first = first_of_month(date);
    i64::from(date.day0()) + i64::from(first.weekday().num_days_from_sunday())
}

/// The date one cell away from `date` in `direction`.
pub fn get_spatial_date(date: NaiveDate, direction: NavDirection) -> NaiveDate {
    let (week, column) = grid_position(date);
    let (new_week, new_column) = match direction {
        NavDirection::Up => (week - 1, column),
        NavDirection::Down => (week + 1, column),
        NavDirection::Left if column == 0 => (week - 1, 6),
        NavDirection::Left => (week, column - 1),
        NavDirection::Right if column == 6 => (week + 1, 0),
        NavDirection::Right => (week, column + 1),
    };

    let first = first_of_month(date);
    let start = i64::from(first.weekday().num_days_from_sunday());
    let offset = new_week * 7 + new_column - start;
    first
        .checked_add_signed(Duration::days(offset))
        .unwrap_or(date)
}

/// Same day `months` months away, clamped to the target month's length.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    let next = shift_month(first, 1);
    (next - first).num_days() as u32
}

/// Rows of a month, Sunday first, `None` for cells outside the month.
pub fn month_grid(date: NaiveDate) -> Vec<[Option<NaiveDate>; 7]> {
    let first = first_of_month(date);
    let start = first.weekday().num_days_from_sunday() as usize;
    let days = days_in_month(date) as usize;
    let cells = start + days;
    let rows = cells.div_ceil(7);

    let mut grid = vec![[None; 7]; rows];
    for day in 0..days {
        let index = start + day;
        grid[index / 7][index % 7] = first.checked_add_signed(Duration::days(day as i64));
    }
    grid
}
