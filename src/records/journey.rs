//! Journey records: patterns, pattern sections, timing links, and
//! vehicle journeys.

use chrono::NaiveTime;
use tracing::debug;

use crate::navigator::Element;
use crate::records::common::{parse_duration, parse_time};
use crate::records::operating_profile::OperatingProfile;

/// A journey pattern declared under a standard service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyPattern {
    /// Pattern id attribute
    pub id: String,
    /// Direction of travel ("inbound"/"outbound")
    pub direction: Option<String>,
    /// Route this pattern follows
    pub route_ref: Option<String>,
    /// Referenced journey pattern sections, in order
    pub section_refs: Vec<String>,
}

impl JourneyPattern {
    /// Builds a pattern from a `JourneyPattern` element; the id attribute
    /// is required.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let id = el.attribute("id")?.to_string();
        Some(Self {
            id,
            direction: el
                .get_element("Direction")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            route_ref: el
                .get_element("RouteRef")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            section_refs: el
                .get_elements("JourneyPatternSectionRefs")
                .iter()
                .filter_map(Element::text)
                .map(str::to_string)
                .collect(),
        })
    }
}

/// One timed link between two stops in a journey pattern section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyPatternTimingLink {
    /// Link id attribute
    pub id: String,
    /// Departure stop reference
    pub from_stop: String,
    /// Arrival stop reference
    pub to_stop: String,
    /// Route link this timing link runs over
    pub route_link_ref: Option<String>,
    /// Scheduled run time in seconds
    pub run_time_seconds: Option<i64>,
    /// Timing status at the departure stop
    pub from_timing_status: Option<String>,
    /// Timing status at the arrival stop
    pub to_timing_status: Option<String>,
}

impl JourneyPatternTimingLink {
    /// Builds a timing link from a `JourneyPatternTimingLink` element;
    /// the id and both stop references are required.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let id = el.attribute("id")?.to_string();
        let found = el.scan_children(&["From", "To", "RouteLinkRef", "RunTime"]);
        let from = found[0]?;
        let to = found[1]?;
        let Some(from_stop) = from.get_element("StopPointRef").found().and_then(|e| e.text())
        else {
            debug!(link = %id, "skipping timing link without a From stop");
            return None;
        };
        let Some(to_stop) = to.get_element("StopPointRef").found().and_then(|e| e.text())
        else {
            debug!(link = %id, "skipping timing link without a To stop");
            return None;
        };
        Some(Self {
            id,
            from_stop: from_stop.to_string(),
            to_stop: to_stop.to_string(),
            route_link_ref: found[2].and_then(|e| e.text()).map(str::to_string),
            run_time_seconds: found[3].and_then(|e| e.text()).and_then(parse_duration),
            from_timing_status: from
                .get_element("TimingStatus")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            to_timing_status: to
                .get_element("TimingStatus")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
        })
    }
}

/// An ordered group of timing links shared by journey patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyPatternSection {
    /// Section id attribute
    pub id: String,
    /// Timing links, in order; never empty
    pub timing_links: Vec<JourneyPatternTimingLink>,
}

impl JourneyPatternSection {
    /// Builds a section from a `JourneyPatternSection` element. The id
    /// and at least one complete timing link are required; incomplete
    /// links are skipped rather than failing the whole section.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let id = el.attribute("id")?.to_string();
        let timing_links: Vec<_> = el
            .get_elements("JourneyPatternTimingLink")
            .iter()
            .filter_map(JourneyPatternTimingLink::from_element)
            .collect();
        if timing_links.is_empty() {
            debug!(section = %id, "skipping journey pattern section without timing links");
            return None;
        }
        Some(Self { id, timing_links })
    }
}

/// A scheduled vehicle journey.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleJourney {
    /// Journey code
    pub vehicle_journey_code: String,
    /// Service this journey belongs to
    pub service_ref: String,
    /// Line this journey runs on
    pub line_ref: String,
    /// Journey pattern the journey follows
    pub journey_pattern_ref: Option<String>,
    /// Another journey this one inherits from
    pub vehicle_journey_ref: Option<String>,
    /// Scheduled departure time
    pub departure_time: Option<NaiveTime>,
    /// Journey-level operating profile, when declared
    pub operating_profile: Option<OperatingProfile>,
}

impl VehicleJourney {
    /// Builds a journey from a `VehicleJourney` element; the journey
    /// code, service reference, and line reference are required.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let found = el.scan_children(&[
            "VehicleJourneyCode",
            "ServiceRef",
            "LineRef",
            "JourneyPatternRef",
            "VehicleJourneyRef",
            "DepartureTime",
            "OperatingProfile",
        ]);
        let vehicle_journey_code = found[0].and_then(|e| e.text())?.to_string();
        let Some(service_ref) = found[1].and_then(|e| e.text()) else {
            debug!(journey = %vehicle_journey_code, "skipping vehicle journey without ServiceRef");
            return None;
        };
        let Some(line_ref) = found[2].and_then(|e| e.text()) else {
            debug!(journey = %vehicle_journey_code, "skipping vehicle journey without LineRef");
            return None;
        };
        Some(Self {
            vehicle_journey_code,
            service_ref: service_ref.to_string(),
            line_ref: line_ref.to_string(),
            journey_pattern_ref: found[3].and_then(|e| e.text()).map(str::to_string),
            vehicle_journey_ref: found[4].and_then(|e| e.text()).map(str::to_string),
            departure_time: found[5].and_then(|e| e.text()).and_then(parse_time),
            operating_profile: found[6].and_then(|e| OperatingProfile::from_element(&e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::parse_document;

    const SECTION_XML: &str = r#"<JourneyPatternSection id="jps_1">
  <JourneyPatternTimingLink id="jptl_1">
    <From SequenceNumber="1">
      <StopPointRef>9100YORK</StopPointRef>
      <TimingStatus>principalTimingPoint</TimingStatus>
    </From>
    <To SequenceNumber="2">
      <StopPointRef>9100LEEDS</StopPointRef>
    </To>
    <RouteLinkRef>rl_1</RouteLinkRef>
    <RunTime>PT25M</RunTime>
  </JourneyPatternTimingLink>
  <JourneyPatternTimingLink id="jptl_broken">
    <From><StopPointRef>9100LEEDS</StopPointRef></From>
  </JourneyPatternTimingLink>
</JourneyPatternSection>"#;

    #[test]
    fn test_section_skips_incomplete_links() {
        let doc = parse_document(SECTION_XML).unwrap();
        let section = JourneyPatternSection::from_element(&Element::root(&doc)).unwrap();
        assert_eq!(section.id, "jps_1");
        assert_eq!(section.timing_links.len(), 1);
        let link = &section.timing_links[0];
        assert_eq!(link.from_stop, "9100YORK");
        assert_eq!(link.to_stop, "9100LEEDS");
        assert_eq!(link.run_time_seconds, Some(1500));
        assert_eq!(
            link.from_timing_status.as_deref(),
            Some("principalTimingPoint")
        );
        assert_eq!(link.route_link_ref.as_deref(), Some("rl_1"));
    }

    #[test]
    fn test_section_requires_links() {
        let doc = parse_document("<JourneyPatternSection id=\"jps\"/>").unwrap();
        assert!(JourneyPatternSection::from_element(&Element::root(&doc)).is_none());
    }

    #[test]
    fn test_journey_pattern() {
        let xml = r#"<JourneyPattern id="jp_1">
  <Direction>outbound</Direction>
  <RouteRef>r_1</RouteRef>
  <JourneyPatternSectionRefs>jps_1</JourneyPatternSectionRefs>
  <JourneyPatternSectionRefs>jps_2</JourneyPatternSectionRefs>
</JourneyPattern>"#;
        let doc = parse_document(xml).unwrap();
        let pattern = JourneyPattern::from_element(&Element::root(&doc)).unwrap();
        assert_eq!(pattern.id, "jp_1");
        assert_eq!(pattern.direction.as_deref(), Some("outbound"));
        assert_eq!(pattern.section_refs, vec!["jps_1", "jps_2"]);
    }

    #[test]
    fn test_vehicle_journey() {
        let xml = r#"<VehicleJourney>
  <VehicleJourneyCode>vj_1</VehicleJourneyCode>
  <ServiceRef>PB0002032:467</ServiceRef>
  <LineRef>l_1</LineRef>
  <JourneyPatternRef>jp_1</JourneyPatternRef>
  <DepartureTime>09:15:00</DepartureTime>
  <OperatingProfile>
    <RegularDayType><DaysOfWeek><Saturday/></DaysOfWeek></RegularDayType>
  </OperatingProfile>
</VehicleJourney>"#;
        let doc = parse_document(xml).unwrap();
        let journey = VehicleJourney::from_element(&Element::root(&doc)).unwrap();
        assert_eq!(journey.vehicle_journey_code, "vj_1");
        assert_eq!(journey.service_ref, "PB0002032:467");
        assert_eq!(
            journey.departure_time,
            NaiveTime::from_hms_opt(9, 15, 0)
        );
        let profile = journey.operating_profile.unwrap();
        assert!(profile.regular.days.saturday);
    }

    #[test]
    fn test_vehicle_journey_requires_refs() {
        let xml = "<VehicleJourney><VehicleJourneyCode>vj</VehicleJourneyCode></VehicleJourney>";
        let doc = parse_document(xml).unwrap();
        assert!(VehicleJourney::from_element(&Element::root(&doc)).is_none());
    }
}
