//! Common types shared across transport-schedule records.
//!
//! This module contains the foundational pieces every mapper leans on:
//! - centralized scalar parsing (`parse_int`, `parse_date`,
//!   `parse_datetime`, `parse_bool`, `parse_duration`) that returns
//!   absence, never panics, on malformed text;
//! - [`DateRange`] - a start/end date pair;
//! - [`DaysOfWeek`] - a day set with range shorthands;
//! - [`BankHolidayDays`] - named bank-holiday day sets;
//! - [`TransportMode`] - the service mode table with its default.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime};

use crate::navigator::Element;

// ============================================================================
// Scalar parsing
// ============================================================================

/// Parses an integer, returning `None` on malformed text.
pub fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// Parses a `YYYY-MM-DD` date, returning `None` on malformed text.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Parses a timestamp, with or without a zone offset or fractional
/// seconds, returning `None` on malformed text.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Parses an `HH:MM:SS` time of day, returning `None` on malformed text.
pub fn parse_time(text: &str) -> Option<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(text.trim(), "%H:%M:%S").ok()
}

/// Parses a boolean value from a string.
///
/// Accepts "1", "0", "true", "false" (case-insensitive).
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Parses an ISO 8601 time duration (`PT30S`, `PT5M`, `PT1H30M`) into
/// seconds. Date components (years, months, days) are not used by the
/// dialect's run times and yield `None`.
pub fn parse_duration(text: &str) -> Option<i64> {
    let text = text.trim();
    let rest = text.strip_prefix("PT")?;
    if rest.is_empty() {
        return None;
    }
    let mut seconds: i64 = 0;
    let mut number = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            number.push(ch);
            continue;
        }
        let value: i64 = number.parse().ok()?;
        number.clear();
        match ch {
            'H' => seconds += value * 3600,
            'M' => seconds += value * 60,
            'S' => seconds += value,
            _ => return None,
        }
    }
    if !number.is_empty() {
        return None;
    }
    Some(seconds)
}

// ============================================================================
// Date ranges
// ============================================================================

/// An inclusive start/end date pair, as carried by operating periods and
/// operating-profile date ranges. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive start date
    pub start: Option<NaiveDate>,
    /// Inclusive end date
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Reads `StartDate`/`EndDate` children of the given element.
    pub fn from_element(el: &Element<'_, '_>) -> Self {
        let found = el.scan_children(&["StartDate", "EndDate"]);
        Self {
            start: found[0].and_then(|e| e.text()).and_then(parse_date),
            end: found[1].and_then(|e| e.text()).and_then(parse_date),
        }
    }

    /// Returns true when neither bound is set.
    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Returns true when both bounds are set and the range covers more
    /// than `months` calendar months.
    pub fn spans_more_than_months(&self, months: u32) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => match start.checked_add_months(Months::new(months)) {
                Some(limit) => end > limit,
                None => true,
            },
            _ => false,
        }
    }
}

// ============================================================================
// Day-of-week sets
// ============================================================================

/// A set of operating days, one flag per weekday.
///
/// Built from `DaysOfWeek` children including the dialect's range
/// shorthands. An empty `DaysOfWeek` element yields all days false; the
/// declarative guidance reads empty as "every day", but this library
/// preserves the established behaviour until the authoritative schema
/// settles it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaysOfWeek {
    /// Operates on Mondays
    pub monday: bool,
    /// Operates on Tuesdays
    pub tuesday: bool,
    /// Operates on Wednesdays
    pub wednesday: bool,
    /// Operates on Thursdays
    pub thursday: bool,
    /// Operates on Fridays
    pub friday: bool,
    /// Operates on Saturdays
    pub saturday: bool,
    /// Operates on Sundays
    pub sunday: bool,
}

impl DaysOfWeek {
    /// Reads the day tags that are direct children of a `DaysOfWeek`
    /// element. Unknown tags are ignored.
    pub fn from_element(el: &Element<'_, '_>) -> Self {
        let mut days = Self::default();
        for child in el.children() {
            days.set_tag(child.name());
        }
        days
    }

    fn set_tag(&mut self, tag: &str) {
        match tag {
            "Monday" => self.monday = true,
            "Tuesday" => self.tuesday = true,
            "Wednesday" => self.wednesday = true,
            "Thursday" => self.thursday = true,
            "Friday" => self.friday = true,
            "Saturday" => self.saturday = true,
            "Sunday" => self.sunday = true,
            "MondayToFriday" => {
                self.monday = true;
                self.tuesday = true;
                self.wednesday = true;
                self.thursday = true;
                self.friday = true;
            }
            "MondayToSaturday" => {
                self.set_tag("MondayToFriday");
                self.saturday = true;
            }
            "MondayToSunday" => {
                self.set_tag("MondayToSaturday");
                self.sunday = true;
            }
            "Weekend" => {
                self.saturday = true;
                self.sunday = true;
            }
            _ => {}
        }
    }

    /// Returns true if at least one day is flagged.
    pub fn any(&self) -> bool {
        self.monday
            || self.tuesday
            || self.wednesday
            || self.thursday
            || self.friday
            || self.saturday
            || self.sunday
    }
}

// ============================================================================
// Bank holidays
// ============================================================================

/// Named bank holidays recognised by the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BankHoliday {
    /// New Year's Day
    NewYearsDay,
    /// Good Friday
    GoodFriday,
    /// Easter Monday
    EasterMonday,
    /// Early May bank holiday
    MayDay,
    /// Spring bank holiday
    SpringBank,
    /// Late summer bank holiday (not Scotland)
    LateSummerBankHolidayNotScotland,
    /// Christmas Day
    ChristmasDay,
    /// Boxing Day
    BoxingDay,
    /// Christmas Eve
    ChristmasEve,
    /// New Year's Eve
    NewYearsEve,
}

/// The statutory holidays covered by the `AllBankHolidays` shorthand.
const ALL_BANK_HOLIDAYS: [BankHoliday; 8] = [
    BankHoliday::NewYearsDay,
    BankHoliday::GoodFriday,
    BankHoliday::EasterMonday,
    BankHoliday::MayDay,
    BankHoliday::SpringBank,
    BankHoliday::LateSummerBankHolidayNotScotland,
    BankHoliday::ChristmasDay,
    BankHoliday::BoxingDay,
];

const HOLIDAY_MONDAYS: [BankHoliday; 4] = [
    BankHoliday::EasterMonday,
    BankHoliday::MayDay,
    BankHoliday::SpringBank,
    BankHoliday::LateSummerBankHolidayNotScotland,
];

const EARLY_RUN_OFF_DAYS: [BankHoliday; 2] =
    [BankHoliday::ChristmasEve, BankHoliday::NewYearsEve];

impl BankHoliday {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "NewYearsDay" => Some(BankHoliday::NewYearsDay),
            "GoodFriday" => Some(BankHoliday::GoodFriday),
            "EasterMonday" => Some(BankHoliday::EasterMonday),
            "MayDay" => Some(BankHoliday::MayDay),
            "SpringBank" => Some(BankHoliday::SpringBank),
            "LateSummerBankHolidayNotScotland" => {
                Some(BankHoliday::LateSummerBankHolidayNotScotland)
            }
            "ChristmasDay" => Some(BankHoliday::ChristmasDay),
            "BoxingDay" => Some(BankHoliday::BoxingDay),
            "ChristmasEve" => Some(BankHoliday::ChristmasEve),
            "NewYearsEve" => Some(BankHoliday::NewYearsEve),
            _ => None,
        }
    }
}

/// The set of bank holidays named under a `DaysOfOperation` or
/// `DaysOfNonOperation` element, with group shorthands expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankHolidayDays {
    /// The expanded set of named holidays
    pub days: BTreeSet<BankHoliday>,
}

impl BankHolidayDays {
    /// Reads named-holiday child tags, expanding `AllBankHolidays`,
    /// `HolidayMondays`, `AllHolidaysExceptChristmas`, and
    /// `EarlyRunOffDays`. Unknown tags are ignored.
    pub fn from_element(el: &Element<'_, '_>) -> Self {
        let mut days = BTreeSet::new();
        for child in el.children() {
            match child.name() {
                "AllBankHolidays" => days.extend(ALL_BANK_HOLIDAYS),
                "HolidayMondays" => days.extend(HOLIDAY_MONDAYS),
                "EarlyRunOffDays" => days.extend(EARLY_RUN_OFF_DAYS),
                "AllHolidaysExceptChristmas" => {
                    days.extend(ALL_BANK_HOLIDAYS.iter().filter(|h| {
                        !matches!(h, BankHoliday::ChristmasDay | BankHoliday::BoxingDay)
                    }));
                }
                tag => {
                    if let Some(holiday) = BankHoliday::from_tag(tag) {
                        days.insert(holiday);
                    }
                }
            }
        }
        Self { days }
    }

    /// Returns true when no holidays are named.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

// ============================================================================
// Transport mode
// ============================================================================

/// The mode of a service. Unknown or absent modes fall back to [`Bus`],
/// the dialect's default.
///
/// [`Bus`]: TransportMode::Bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Air services
    Air,
    /// Bus services (the default)
    #[default]
    Bus,
    /// Coach services
    Coach,
    /// Ferry services
    Ferry,
    /// Metro services
    Metro,
    /// Rail services
    Rail,
    /// Tram services
    Tram,
    /// Underground services
    Underground,
}

impl TransportMode {
    /// Returns the XML tag text for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Air => "air",
            TransportMode::Bus => "bus",
            TransportMode::Coach => "coach",
            TransportMode::Ferry => "ferry",
            TransportMode::Metro => "metro",
            TransportMode::Rail => "rail",
            TransportMode::Tram => "tram",
            TransportMode::Underground => "underground",
        }
    }
}

impl FromStr for TransportMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "air" => TransportMode::Air,
            "coach" => TransportMode::Coach,
            "ferry" => TransportMode::Ferry,
            "metro" => TransportMode::Metro,
            "rail" => TransportMode::Rail,
            "tram" => TransportMode::Tram,
            "underground" => TransportMode::Underground,
            _ => TransportMode::Bus,
        })
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
