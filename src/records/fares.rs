//! Fares records from the NeTEx-side vocabulary.
//!
//! Fares documents use id/ref attributes rather than text references, so
//! these mappers read attributes where the timetable mappers read child
//! text.

use crate::navigator::Element;

/// A zone of stops sharing a fare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareZone {
    /// Zone id attribute
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Scheduled stop points belonging to the zone
    pub members: Vec<String>,
}

impl FareZone {
    /// Builds a zone from a `FareZone` element; the id attribute is
    /// required.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let id = el.attribute("id")?.to_string();
        Some(Self {
            id,
            name: el
                .get_element("Name")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            members: el
                .get_elements("members/ScheduledStopPointRef")
                .iter()
                .filter_map(|m| m.attribute("ref"))
                .map(str::to_string)
                .collect(),
        })
    }
}

/// One element of a fare structure (access rights, eligibility,
/// conditions of travel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareStructureElement {
    /// Element id attribute
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Classification of the element
    pub type_of_fare_structure_element_ref: Option<String>,
    /// Tariff intervals referenced by the element
    pub fare_interval_refs: Vec<String>,
}

impl FareStructureElement {
    /// Builds an element from a `FareStructureElement` element; the id
    /// attribute is required.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let id = el.attribute("id")?.to_string();
        Some(Self {
            id,
            name: el
                .get_element("Name")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            type_of_fare_structure_element_ref: el
                .get_element("TypeOfFareStructureElementRef")
                .found()
                .and_then(|e| e.attribute("ref"))
                .map(str::to_string),
            fare_interval_refs: el
                .get_elements("timeIntervals/TimeIntervalRef")
                .iter()
                .filter_map(|m| m.attribute("ref"))
                .map(str::to_string)
                .collect(),
        })
    }
}
