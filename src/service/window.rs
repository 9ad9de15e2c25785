use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Inclusive date range; `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub start: NaiveDate,
    #[schema(value_type = String, format = "date", example = "2026-03-08")]
    pub end: NaiveDate,
}

/// Calendar month key, ordered by year then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

fn out_of_range() -> AppError {
    AppError::validation("Date is outside the supported calendar range")
}

/// First and last dates MySQL can store in a `DATE` column.
fn storable_bounds() -> Result<(NaiveDate, NaiveDate), AppError> {
    let floor = NaiveDate::from_ymd_opt(1000, 1, 1).ok_or_else(out_of_range)?;
    let ceiling = NaiveDate::from_ymd_opt(9999, 12, 31).ok_or_else(out_of_range)?;
    Ok((floor, ceiling))
}

impl DateRange {
    /// Validated range; both bounds must fall inside the storable calendar.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::validation(format!(
                "Start date {start} is after end date {end}"
            )));
        }
        let (floor, ceiling) = storable_bounds()?;
        if start < floor || end > ceiling {
            return Err(AppError::validation(format!(
                "Dates must lie between {floor} and {ceiling}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Range for optional list filters: an exact `day` wins, otherwise open
    /// bounds extend to the ends of the storable calendar.
    pub fn from_filters(
        day: Option<NaiveDate>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<Self>, AppError> {
        if let Some(day) = day {
            return Ok(Some(Self::single_day(day)));
        }
        if start.is_none() && end.is_none() {
            return Ok(None);
        }

        let (floor, ceiling) = storable_bounds()?;
        Self::new(start.unwrap_or(floor), end.unwrap_or(ceiling)).map(Some)
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Monday through Sunday of the week containing `date`.
    pub fn week_of(date: NaiveDate) -> Result<Self, AppError> {
        let offset = date.weekday().num_days_from_monday();
        let start = date
            .checked_sub_days(Days::new(offset.into()))
            .ok_or_else(out_of_range)?;
        let end = start.checked_add_days(Days::new(6)).ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }

    /// First through last day of the month containing `date`.
    pub fn month_of(date: NaiveDate) -> Result<Self, AppError> {
        let start = date.with_day(1).ok_or_else(out_of_range)?;
        let next_month = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
        };
        let end = next_month
            .and_then(|d| d.pred_opt())
            .ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    /// First and last calendar month with at least one day inside the
    /// range. Every month between them is touched as well.
    pub fn month_span(&self) -> (YearMonth, YearMonth) {
        (YearMonth::of(self.start), YearMonth::of(self.end))
    }
}
