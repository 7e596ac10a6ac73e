use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::database::SetLog;

/// Longest report we build in one request, in buckets
pub const MAX_BUCKETS: usize = 400;

/// Report dates must fall within these years
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 9999;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Day,
    #[default]
    Week,
    Month,
}

impl Bucket {
    /// First day of the bucket containing `date`; weeks start on Monday.
    /// A week starting before the earliest representable date is clamped to it.
    pub fn start_of(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Bucket::Day => date,
            Bucket::Week => date
                .checked_sub_signed(Duration::days(i64::from(date.weekday().num_days_from_monday())))
                .unwrap_or(NaiveDate::MIN),
            Bucket::Month => date.with_day(1).unwrap_or(date),
        }
    }

    fn next(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Bucket::Day => start.checked_add_signed(Duration::days(1)),
            Bucket::Week => start.checked_add_signed(Duration::days(7)),
            Bucket::Month => start.checked_add_months(Months::new(1)),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("range start {from} is after range end {to}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },
    #[error("range spans more than {max} buckets")]
    RangeTooLarge { max: usize },
    #[error("date {date} is outside the supported years {min}..={max}")]
    DateOutOfRange { date: NaiveDate, min: i32, max: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TonnageBucket {
    pub start: NaiveDate,
    pub tonnage: f64,
    pub sets: u32,
}

/// Half-open UTC window `[from 00:00, to + 1 day 00:00)` covering both dates
pub fn query_window(from: NaiveDate, to: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), ReportError> {
    let start = Utc.from_utc_datetime(&from.and_time(NaiveTime::MIN));
    let end = Utc
        .from_utc_datetime(&to.and_time(NaiveTime::MIN))
        .checked_add_signed(Duration::days(1))
        .ok_or(ReportError::DateOutOfRange { date: to, min: MIN_YEAR, max: MAX_YEAR })?;
    Ok((start, end))
}

fn check_year(date: NaiveDate) -> Result<(), ReportError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(())
    } else {
        Err(ReportError::DateOutOfRange { date, min: MIN_YEAR, max: MAX_YEAR })
    }
}

/// Contiguous bucket starts covering `from..=to`
pub fn bucket_starts(from: NaiveDate, to: NaiveDate, bucket: Bucket) -> Result<Vec<NaiveDate>, ReportError> {
    check_year(from)?;
    check_year(to)?;
    if from > to {
        return Err(ReportError::InvertedRange { from, to });
    }

    let mut starts = Vec::new();
    let mut cursor = Some(bucket.start_of(from));
    while let Some(start) = cursor.filter(|start| *start <= to) {
        if starts.len() == MAX_BUCKETS {
            return Err(ReportError::RangeTooLarge { max: MAX_BUCKETS });
        }
        starts.push(start);
        cursor = bucket.next(start);
    }

    Ok(starts)
}

/// Sum reps × weight per bucket. Empty buckets are kept at zero and sets
/// outside `from..=to` are ignored.
pub fn tonnage_report(
    sets: &[SetLog],
    from: NaiveDate,
    to: NaiveDate,
    bucket: Bucket,
) -> Result<Vec<TonnageBucket>, ReportError> {
    let mut buckets: BTreeMap<NaiveDate, TonnageBucket> = bucket_starts(from, to, bucket)?
        .into_iter()
        .map(|start| (start, TonnageBucket { start, tonnage: 0.0, sets: 0 }))
        .collect();

    for set in sets {
        let day = set.performed_at.date_naive();
        if day < from || day > to {
            continue;
        }
        if let Some(entry) = buckets.get_mut(&bucket.start_of(day)) {
            entry.tonnage += set.tonnage();
            entry.sets += 1;
        }
    }

    Ok(buckets.into_values().collect())
}
