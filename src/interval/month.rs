use std::fmt;

use jiff::{civil::Date, Zoned};

/// A calendar month, no timezone attached.  The metrics web service is
/// queried by year and month only.
#[derive(PartialEq, Debug, Clone, Copy, Hash, Eq, PartialOrd, Ord)]
pub struct Month {
    year: i16,
    month: i8,
}

/// Panics if `month` is not in 1..=12.
pub fn month(year: i16, month: i8) -> Month {
    Month::new(year, month).unwrap()
}

impl Month {
    /// Return `None` if the month of year is not in 1..=12.
    pub fn new(year: i16, month: i8) -> Option<Month> {
        if (1..=12).contains(&month) {
            Some(Month { year, month })
        } else {
            None
        }
    }

    pub fn containing(date: Date) -> Month {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month we are in right now, in the system timezone.
    pub fn current() -> Month {
        Month::containing(Zoned::now().date())
    }

    pub fn year(&self) -> i16 {
        self.year
    }

    pub fn month(&self) -> i8 {
        self.month
    }

    /// The month before this one.  Going back from January crosses into
    /// December of the previous year.
    pub fn previous(&self) -> Month {
        if self.month == 1 {
            Month {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Month {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}
