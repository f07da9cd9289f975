//! Typed records mapped from transport-schedule documents.
//!
//! One mapper per structural concept, each with the same contract: given
//! a navigated element, return `Some(record)` when every required field
//! is present and well-typed, else `None`. Absence is not an error;
//! callers skip or log. There are no partially-populated records.
//!
//! - [`StopPoint`], [`AnnotatedStopPointRef`] - stops
//! - [`Service`], [`Line`], [`TxcAttributes`] - services and revisions
//! - [`JourneyPattern`], [`JourneyPatternSection`],
//!   [`JourneyPatternTimingLink`], [`VehicleJourney`] - journeys
//! - [`OperatingProfile`] and its parts - operating days
//! - [`Route`], [`RouteSection`], [`RouteLink`] - routes
//! - [`ServicedOrganisation`] - organisation calendars
//! - [`FareZone`], [`FareStructureElement`] - fares

pub mod common;
mod fares;
mod journey;
mod operating_profile;
mod routes;
mod service;
mod serviced_organisation;
mod stops;

pub use common::{
    parse_bool, parse_date, parse_datetime, parse_duration, parse_int, parse_time, BankHoliday,
    BankHolidayDays, DateRange, DaysOfWeek, TransportMode,
};
pub use fares::{FareStructureElement, FareZone};
pub use journey::{
    JourneyPattern, JourneyPatternSection, JourneyPatternTimingLink, VehicleJourney,
};
pub use operating_profile::{
    BankHolidayOperation, OperatingProfile, RegularDayType, ServicedOrganisationDayType,
    SpecialDaysOperation,
};
pub use routes::{Route, RouteLink, RouteSection};
pub use service::{Line, Service, TxcAttributes};
pub use serviced_organisation::ServicedOrganisation;
pub use stops::{active_stop_area_refs, AnnotatedStopPointRef, StopPoint};

use crate::navigator::Element;

/// A record produced by the schema mapper, tagged by structural concept.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainRecord {
    /// A full stop-point definition
    StopPoint(StopPoint),
    /// A stop reference with its display name
    AnnotatedStopPointRef(AnnotatedStopPointRef),
    /// A registered service
    Service(Service),
    /// A journey pattern
    JourneyPattern(JourneyPattern),
    /// A journey pattern section
    JourneyPatternSection(JourneyPatternSection),
    /// A single timing link
    JourneyPatternTimingLink(JourneyPatternTimingLink),
    /// A scheduled vehicle journey
    VehicleJourney(VehicleJourney),
    /// An operating profile
    OperatingProfile(OperatingProfile),
    /// A route
    Route(Route),
    /// A route section
    RouteSection(RouteSection),
    /// A serviced organisation
    ServicedOrganisation(ServicedOrganisation),
    /// A fare zone
    FareZone(FareZone),
    /// A fare structure element
    FareStructureElement(FareStructureElement),
}

/// Maps every recognised structure in a timetable document.
///
/// Incomplete structures are skipped, so the returned list holds only
/// records that fully exist. Mapping the same tree twice yields equal
/// lists; nothing here mutates shared state.
pub fn map_timetable_document(root: &Element<'_, '_>) -> Vec<DomainRecord> {
    let mut records = Vec::new();

    for el in root.get_elements("StopPoints/StopPoint") {
        if let Some(stop) = StopPoint::from_element(&el) {
            records.push(DomainRecord::StopPoint(stop));
        }
    }
    for el in root.get_elements("StopPoints/AnnotatedStopPointRef") {
        if let Some(stop) = AnnotatedStopPointRef::from_element(&el) {
            records.push(DomainRecord::AnnotatedStopPointRef(stop));
        }
    }
    for el in root.get_elements("RouteSections/RouteSection") {
        if let Some(section) = RouteSection::from_element(&el) {
            records.push(DomainRecord::RouteSection(section));
        }
    }
    for el in root.get_elements("Routes/Route") {
        if let Some(route) = Route::from_element(&el) {
            records.push(DomainRecord::Route(route));
        }
    }
    for el in root.get_elements("JourneyPatternSections/JourneyPatternSection") {
        if let Some(section) = JourneyPatternSection::from_element(&el) {
            records.push(DomainRecord::JourneyPatternSection(section));
        }
    }
    for el in root.get_elements("ServicedOrganisations/ServicedOrganisation") {
        if let Some(org) = ServicedOrganisation::from_element(&el) {
            records.push(DomainRecord::ServicedOrganisation(org));
        }
    }
    for el in root.get_elements("Services/Service") {
        if let Some(service) = Service::from_element(&el) {
            records.push(DomainRecord::Service(service));
        }
    }
    for el in root.get_elements("Services/Service/StandardService/JourneyPattern") {
        if let Some(pattern) = JourneyPattern::from_element(&el) {
            records.push(DomainRecord::JourneyPattern(pattern));
        }
    }
    for el in root.get_elements("VehicleJourneys/VehicleJourney") {
        if let Some(journey) = VehicleJourney::from_element(&el) {
            records.push(DomainRecord::VehicleJourney(journey));
        }
    }

    records
}

/// Maps the fares structures of a NeTEx document.
pub fn map_fares_document(root: &Element<'_, '_>) -> Vec<DomainRecord> {
    let mut records = Vec::new();

    let frames = "dataObjects/CompositeFrame/frames/FareFrame";
    for el in root.get_elements(&format!("{frames}/fareZones/FareZone")) {
        if let Some(zone) = FareZone::from_element(&el) {
            records.push(DomainRecord::FareZone(zone));
        }
    }
    for el in root.get_elements(&format!(
        "{frames}/tariffs/Tariff/fareStructureElements/FareStructureElement"
    )) {
        if let Some(element) = FareStructureElement::from_element(&el) {
            records.push(DomainRecord::FareStructureElement(element));
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::parse_document;

    const TIMETABLE: &str = r#"<?xml version="1.0"?>
<TransXChange xmlns="http://www.transxchange.org.uk/" SchemaVersion="2.4">
  <StopPoints>
    <AnnotatedStopPointRef>
      <StopPointRef>9100YORK</StopPointRef>
      <CommonName>York Rail Station</CommonName>
    </AnnotatedStopPointRef>
  </StopPoints>
  <RouteSections>
    <RouteSection id="rs_1">
      <RouteLink id="rl_1">
        <From><StopPointRef>9100YORK</StopPointRef></From>
        <To><StopPointRef>9100LEEDS</StopPointRef></To>
      </RouteLink>
    </RouteSection>
  </RouteSections>
  <Routes>
    <Route id="r_1">
      <RouteSectionRef>rs_1</RouteSectionRef>
    </Route>
  </Routes>
  <Services>
    <Service>
      <ServiceCode>PB0002032:467</ServiceCode>
      <Lines><Line id="l_1"><LineName>42A</LineName></Line></Lines>
      <StandardService>
        <JourneyPattern id="jp_1">
          <JourneyPatternSectionRefs>jps_1</JourneyPatternSectionRefs>
        </JourneyPattern>
      </StandardService>
    </Service>
  </Services>
  <VehicleJourneys>
    <VehicleJourney>
      <VehicleJourneyCode>vj_1</VehicleJourneyCode>
      <ServiceRef>PB0002032:467</ServiceRef>
      <LineRef>l_1</LineRef>
    </VehicleJourney>
    <VehicleJourney>
      <VehicleJourneyCode>vj_broken</VehicleJourneyCode>
    </VehicleJourney>
  </VehicleJourneys>
</TransXChange>"#;

    #[test]
    fn test_map_timetable_document() {
        let doc = parse_document(TIMETABLE).unwrap();
        let root = Element::transxchange_root(&doc);
        let records = map_timetable_document(&root);

        let kinds: Vec<&str> = records
            .iter()
            .map(|r| match r {
                DomainRecord::AnnotatedStopPointRef(_) => "stop_ref",
                DomainRecord::RouteSection(_) => "route_section",
                DomainRecord::Route(_) => "route",
                DomainRecord::Service(_) => "service",
                DomainRecord::JourneyPattern(_) => "journey_pattern",
                DomainRecord::VehicleJourney(_) => "vehicle_journey",
                _ => "other",
            })
            .collect();
        // The incomplete vehicle journey is skipped, not half-built.
        assert_eq!(
            kinds,
            vec![
                "stop_ref",
                "route_section",
                "route",
                "service",
                "journey_pattern",
                "vehicle_journey"
            ]
        );
    }

    #[test]
    fn test_mapping_twice_is_identical() {
        let doc = parse_document(TIMETABLE).unwrap();
        let root = Element::transxchange_root(&doc);
        assert_eq!(map_timetable_document(&root), map_timetable_document(&root));
    }

    #[test]
    fn test_map_fares_document() {
        let xml = r#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex">
  <dataObjects>
    <CompositeFrame id="cf_1">
      <frames>
        <FareFrame id="ff_1">
          <fareZones>
            <FareZone id="fz_1"><Name>City</Name></FareZone>
          </fareZones>
          <tariffs>
            <Tariff id="t_1">
              <fareStructureElements>
                <FareStructureElement id="fse_1"/>
              </fareStructureElements>
            </Tariff>
          </tariffs>
        </FareFrame>
      </frames>
    </CompositeFrame>
  </dataObjects>
</PublicationDelivery>"#;
        let doc = parse_document(xml).unwrap();
        let root = Element::netex_root(&doc);
        let records = map_fares_document(&root);
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], DomainRecord::FareZone(_)));
        assert!(matches!(records[1], DomainRecord::FareStructureElement(_)));
    }
}
