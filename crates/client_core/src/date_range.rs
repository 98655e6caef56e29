use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shared::protocol::{DateRange, Notification};

const INVALID_RANGE_TITLE: &str = "Invalid Date Range...";
const INVALID_RANGE_MESSAGE: &str = "Start date must be less than or the same as end date.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateChange {
    /// Both dates set (or both cleared); the range goes to the filter.
    Changed(Option<DateRange>),
    /// Start is after end; nothing is emitted, the user is warned.
    Invalid(Notification),
    /// Only one end of the range is set so far.
    Pending,
}

/// Start/end date inputs for the email list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRangePicker {
    defaults: DateRange,
    range: DateRange,
}

impl DateRangePicker {
    pub fn new(defaults: DateRange) -> Self {
        Self {
            defaults,
            range: defaults,
        }
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn set_start_date(&mut self, date: Option<NaiveDate>) -> DateChange {
        self.range.start_date = date.map(start_of_day);
        self.date_set()
    }

    pub fn set_end_date(&mut self, date: Option<NaiveDate>) -> DateChange {
        self.range.end_date = date.and_then(end_of_day);
        self.date_set()
    }

    pub fn clear(&mut self) -> DateChange {
        self.range = self.defaults;
        self.fire_date_changed()
    }

    pub fn is_invalid_date_range(&self) -> bool {
        self.range.is_invalid()
    }

    fn date_set(&self) -> DateChange {
        if self.range.has_both_dates() {
            self.fire_date_changed()
        } else {
            DateChange::Pending
        }
    }

    fn fire_date_changed(&self) -> DateChange {
        if self.is_invalid_date_range() {
            return DateChange::Invalid(Notification::warning(
                INVALID_RANGE_TITLE,
                INVALID_RANGE_MESSAGE,
            ));
        }
        DateChange::Changed(self.range.has_both_dates().then_some(self.range))
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .map(|end| end.and_utc())
}

#[cfg(test)]
#[path = "tests/date_range_tests.rs"]
mod tests;
