//! Operating profiles: which days a journey or service actually runs.

use tracing::debug;

use crate::navigator::Element;
use crate::records::common::{BankHolidayDays, DateRange, DaysOfWeek};

/// The regular day pattern of an operating profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegularDayType {
    /// Weekday flags; all false when `DaysOfWeek` is empty or absent
    pub days: DaysOfWeek,
    /// Set when the profile runs on holidays only
    pub holidays_only: bool,
}

impl RegularDayType {
    /// Reads a `RegularDayType` element.
    ///
    /// An empty `DaysOfWeek` yields all-days-false rather than every day;
    /// the declarative guidance disagrees with itself here and this
    /// library keeps the established reading.
    pub fn from_element(el: &Element<'_, '_>) -> Self {
        let found = el.scan_children(&["HolidaysOnly", "DaysOfWeek"]);
        if found[0].is_some() {
            return Self {
                days: DaysOfWeek::default(),
                holidays_only: true,
            };
        }
        let days = found[1]
            .map(|d| DaysOfWeek::from_element(&d))
            .unwrap_or_default();
        Self {
            days,
            holidays_only: false,
        }
    }
}

/// Explicit date ranges on which a profile does or does not operate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialDaysOperation {
    /// Extra operating ranges
    pub days_of_operation: Vec<DateRange>,
    /// Suppressed ranges
    pub days_of_non_operation: Vec<DateRange>,
}

impl SpecialDaysOperation {
    /// Reads a `SpecialDaysOperation` element.
    pub fn from_element(el: &Element<'_, '_>) -> Self {
        let ranges = |path: &str| {
            el.get_elements(path)
                .iter()
                .map(DateRange::from_element)
                .collect()
        };
        Self {
            days_of_operation: ranges("DaysOfOperation/DateRange"),
            days_of_non_operation: ranges("DaysOfNonOperation/DateRange"),
        }
    }
}

/// Named bank holidays on which a profile does or does not operate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankHolidayOperation {
    /// Holidays the profile additionally operates on
    pub days_of_operation: BankHolidayDays,
    /// Holidays the profile does not operate on
    pub days_of_non_operation: BankHolidayDays,
}

impl BankHolidayOperation {
    /// Reads a `BankHolidayOperation` element.
    pub fn from_element(el: &Element<'_, '_>) -> Self {
        let days = |path: &str| {
            el.get_element(path)
                .found()
                .map(|d| BankHolidayDays::from_element(&d))
                .unwrap_or_default()
        };
        Self {
            days_of_operation: days("DaysOfOperation"),
            days_of_non_operation: days("DaysOfNonOperation"),
        }
    }
}

/// Working-day calendars borrowed from serviced organisations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServicedOrganisationDayType {
    /// Organisations whose working days the profile operates on
    pub working_days_of_operation: Vec<String>,
    /// Organisations whose working days the profile skips
    pub working_days_of_non_operation: Vec<String>,
}

impl ServicedOrganisationDayType {
    /// Reads a `ServicedOrganisationDayType` element.
    pub fn from_element(el: &Element<'_, '_>) -> Self {
        let refs = |path: &str| {
            el.get_elements(path)
                .iter()
                .filter_map(Element::text)
                .map(str::to_string)
                .collect()
        };
        Self {
            working_days_of_operation: refs(
                "DaysOfOperation/WorkingDays/ServicedOrganisationRef",
            ),
            working_days_of_non_operation: refs(
                "DaysOfNonOperation/WorkingDays/ServicedOrganisationRef",
            ),
        }
    }

    /// Returns true when no organisation is referenced either way.
    pub fn is_empty(&self) -> bool {
        self.working_days_of_operation.is_empty() && self.working_days_of_non_operation.is_empty()
    }
}

/// A complete operating profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatingProfile {
    /// Regular weekday pattern
    pub regular: RegularDayType,
    /// Explicit operating/non-operating date ranges
    pub special_days: SpecialDaysOperation,
    /// Bank-holiday behaviour
    pub bank_holidays: BankHolidayOperation,
    /// Serviced-organisation calendars
    pub serviced_organisations: ServicedOrganisationDayType,
}

impl OperatingProfile {
    /// Builds a profile from an `OperatingProfile` element. The
    /// `RegularDayType` child is required; without it the profile does
    /// not exist.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let Some(regular_el) = el.get_element("RegularDayType").found() else {
            debug!(line = el.line_number(), "skipping operating profile without RegularDayType");
            return None;
        };
        let regular = RegularDayType::from_element(&regular_el);

        let special_days = el
            .get_element("SpecialDaysOperation")
            .found()
            .map(|s| SpecialDaysOperation::from_element(&s))
            .unwrap_or_default();
        let bank_holidays = el
            .get_element("BankHolidayOperation")
            .found()
            .map(|b| BankHolidayOperation::from_element(&b))
            .unwrap_or_default();
        let serviced_organisations = el
            .get_element("ServicedOrganisationDayType")
            .found()
            .map(|s| ServicedOrganisationDayType::from_element(&s))
            .unwrap_or_default();

        Some(Self {
            regular,
            special_days,
            bank_holidays,
            serviced_organisations,
        })
    }

    /// A degenerate profile names no day on which anything could run:
    /// no weekday, not holidays-only, no bank-holiday operation, no
    /// special operating range, and no serviced-organisation calendar.
    pub fn is_degenerate(&self) -> bool {
        !self.regular.days.any()
            && !self.regular.holidays_only
            && self.bank_holidays.days_of_operation.is_empty()
            && self.special_days.days_of_operation.is_empty()
            && self.serviced_organisations.is_empty()
    }
}
