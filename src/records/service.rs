//! Service records and document-level file attributes.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::navigator::Element;
use crate::records::common::{parse_datetime, parse_int, DateRange, TransportMode};
use crate::records::operating_profile::OperatingProfile;

/// Attributes of the document root that identify a revision of a dataset.
///
/// These drive the cross-revision rules: a draft is compared against the
/// live document sharing its service-code/line-name set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxcAttributes {
    /// Declared schema version of the document
    pub schema_version: Option<String>,
    /// Revision number, incremented on each published change
    pub revision_number: i64,
    /// Timestamp of the last modification
    pub modification_datetime: NaiveDateTime,
    /// Kind of modification ("new", "revise", "delete")
    pub modification: Option<String>,
    /// Service codes declared by the document
    pub service_codes: Vec<String>,
    /// Line names declared by the document
    pub line_names: Vec<String>,
}

impl TxcAttributes {
    /// Reads the revision attributes from a document root. Returns `None`
    /// unless the revision number and modification timestamp both parse;
    /// a document without them cannot participate in revision checks.
    pub fn from_element(root: &Element<'_, '_>) -> Option<Self> {
        let revision_number = root.attribute("RevisionNumber").and_then(parse_int)?;
        let modification_datetime = root
            .attribute("ModificationDateTime")
            .and_then(parse_datetime)?;

        let service_codes = root
            .get_elements("Services/Service/ServiceCode")
            .iter()
            .filter_map(Element::text)
            .map(str::to_string)
            .collect();
        let line_names = root
            .get_elements("Services/Service/Lines/Line/LineName")
            .iter()
            .filter_map(Element::text)
            .map(str::to_string)
            .collect();

        Some(Self {
            schema_version: root.attribute("SchemaVersion").map(str::to_string),
            revision_number,
            modification_datetime,
            modification: root.attribute("Modification").map(str::to_string),
            service_codes,
            line_names,
        })
    }
}

/// One line of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line id attribute
    pub id: String,
    /// Public line name ("42A")
    pub line_name: String,
}

impl Line {
    /// Builds a line from a `Line` element; both the id attribute and the
    /// `LineName` child are required.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let id = el.attribute("id")?.to_string();
        let line_name = el.get_element("LineName").found()?.text()?.to_string();
        Some(Self { id, line_name })
    }
}

/// A registered service with its lines and operating period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Registration service code
    pub service_code: String,
    /// Lines run under this service; never empty
    pub lines: Vec<Line>,
    /// Period over which the registration operates
    pub operating_period: DateRange,
    /// Transport mode; absent or unknown modes default to bus
    pub mode: TransportMode,
    /// Free-text description
    pub description: Option<String>,
    /// Origin of the standard service
    pub origin: Option<String>,
    /// Destination of the standard service
    pub destination: Option<String>,
    /// Journey pattern ids declared under the standard service
    pub journey_pattern_ids: Vec<String>,
    /// Operator registered for this service
    pub registered_operator_ref: Option<String>,
    /// Service-level operating profile, inherited by journeys that do
    /// not declare their own
    pub operating_profile: Option<OperatingProfile>,
}

impl Service {
    /// Builds a service from a `Service` element. The service code and at
    /// least one complete line are required; anything less yields `None`.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let service_code = el.get_element("ServiceCode").found()?.text()?.to_string();

        let lines: Vec<Line> = el
            .get_elements("Lines/Line")
            .iter()
            .filter_map(Line::from_element)
            .collect();
        if lines.is_empty() {
            debug!(service = %service_code, "skipping service without lines");
            return None;
        }

        let operating_period = el
            .get_element("OperatingPeriod")
            .found()
            .map(|p| DateRange::from_element(&p))
            .unwrap_or_default();

        let mode = el
            .get_text_or_default("Mode", "")
            .parse()
            .unwrap_or(TransportMode::Bus);

        let journey_pattern_ids = el
            .get_elements("StandardService/JourneyPattern")
            .iter()
            .filter_map(|jp| jp.attribute("id"))
            .map(str::to_string)
            .collect();

        Some(Self {
            service_code,
            lines,
            operating_period,
            mode,
            description: el
                .get_element("Description")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            origin: el
                .get_element("StandardService/Origin")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            destination: el
                .get_element("StandardService/Destination")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            journey_pattern_ids,
            registered_operator_ref: el
                .get_element("RegisteredOperatorRef")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            operating_profile: el
                .get_element("OperatingProfile")
                .found()
                .and_then(|p| OperatingProfile::from_element(&p)),
        })
    }
}
