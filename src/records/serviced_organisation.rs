//! Serviced organisations: schools and works whose calendars journeys
//! can follow.

use crate::navigator::Element;
use crate::records::common::DateRange;

/// An organisation with a working-day calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicedOrganisation {
    /// Code journeys use to reference this organisation
    pub organisation_code: String,
    /// Display name
    pub name: Option<String>,
    /// Term-time / working date ranges
    pub working_days: Vec<DateRange>,
    /// Holiday date ranges
    pub holidays: Vec<DateRange>,
}

impl ServicedOrganisation {
    /// Builds an organisation from a `ServicedOrganisation` element; the
    /// organisation code is required.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let organisation_code = el
            .get_element("OrganisationCode")
            .found()
            .and_then(|e| e.text())?
            .to_string();
        let ranges = |path: &str| {
            el.get_elements(path)
                .iter()
                .map(DateRange::from_element)
                .collect()
        };
        Some(Self {
            organisation_code,
            name: el
                .get_element("Name")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            working_days: ranges("WorkingDays/DateRange"),
            holidays: ranges("Holidays/DateRange"),
        })
    }
}
