//! The month token used to filter cashflow rows.

use std::{fmt::Display, str::FromStr};

use time::Date;

/// A month-of-year filter token.
///
/// `All` selects every row. The twelve month variants select rows whose
/// date falls in that calendar month, across any year. Multi-year datasets
/// are deliberately not disambiguated by year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Month {
    /// Selects every month.
    All,
    /// January.
    January,
    /// February.
    February,
    /// March.
    March,
    /// April.
    April,
    /// May.
    May,
    /// June.
    June,
    /// July.
    July,
    /// August.
    August,
    /// September.
    September,
    /// October.
    October,
    /// November.
    November,
    /// December.
    December,
}

impl Month {
    /// The ordered set of filter tokens offered by the month select.
    pub const OPTIONS: [Month; 13] = [
        Month::All,
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// The month-of-year number (1-12), or `None` for [Month::All].
    pub fn number(self) -> Option<u8> {
        match self {
            Month::All => None,
            Month::January => Some(1),
            Month::February => Some(2),
            Month::March => Some(3),
            Month::April => Some(4),
            Month::May => Some(5),
            Month::June => Some(6),
            Month::July => Some(7),
            Month::August => Some(8),
            Month::September => Some(9),
            Month::October => Some(10),
            Month::November => Some(11),
            Month::December => Some(12),
        }
    }

    /// Whether `date` falls in this month, ignoring the year.
    pub fn matches(self, date: Date) -> bool {
        match self.number() {
            None => true,
            Some(number) => u8::from(date.month()) == number,
        }
    }

    /// The display name of the token.
    pub fn name(self) -> &'static str {
        match self {
            Month::All => "All",
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}

impl FromStr for Month {
    type Err = std::convert::Infallible;

    /// Parse a month token.
    ///
    /// Unrecognized tokens parse as [Month::All] so that an unknown filter
    /// selects the full table rather than an empty one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let month = Month::OPTIONS
            .into_iter()
            .find(|month| month.name() == s)
            .unwrap_or(Month::All);

        Ok(month)
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod month_tests {
    use time::macros::date;

    use super::Month;

    #[test]
    fn options_start_with_all_and_run_january_to_december() {
        assert_eq!(Month::OPTIONS[0], Month::All);
        assert_eq!(Month::OPTIONS[1], Month::January);
        assert_eq!(Month::OPTIONS[12], Month::December);
        assert_eq!(Month::OPTIONS.len(), 13);
    }

    #[test]
    fn name_round_trips_through_from_str() {
        for month in Month::OPTIONS {
            let parsed: Month = month.name().parse().unwrap();
            assert_eq!(parsed, month);
        }
    }

    #[test]
    fn unrecognized_token_parses_as_all() {
        let month: Month = "Smarch".parse().unwrap();

        assert_eq!(month, Month::All);
    }

    #[test]
    fn all_matches_any_date() {
        assert!(Month::All.matches(date!(2023 - 01 - 05)));
        assert!(Month::All.matches(date!(2024 - 12 - 31)));
    }

    #[test]
    fn month_matches_ignore_the_year() {
        assert!(Month::January.matches(date!(2023 - 01 - 05)));
        assert!(Month::January.matches(date!(2024 - 01 - 20)));
        assert!(!Month::January.matches(date!(2023 - 02 - 01)));
    }
}
