//! Stop records: full stop-point definitions and annotated references.

use tracing::debug;

use crate::navigator::Element;

/// A lightweight reference to a NaPTAN stop, as carried in the
/// `StopPoints` section of a timetable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedStopPointRef {
    /// NaPTAN ATCO code being referenced
    pub stop_point_ref: String,
    /// Public-facing stop name
    pub common_name: String,
    /// Stop indicator ("opp", "adj", stand letter)
    pub indicator: Option<String>,
    /// Locality name, when annotated
    pub locality_name: Option<String>,
}

impl AnnotatedStopPointRef {
    /// Builds a reference from an `AnnotatedStopPointRef` element.
    /// Returns `None` unless both the ref and the common name are present.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let found = el.scan_children(&[
            "StopPointRef",
            "CommonName",
            "Indicator",
            "LocalityName",
        ]);
        let stop_point_ref = found[0].and_then(|e| e.text())?.to_string();
        let Some(common_name) = found[1].and_then(|e| e.text()) else {
            debug!(stop = %stop_point_ref, "skipping stop ref without a common name");
            return None;
        };
        Some(Self {
            stop_point_ref,
            common_name: common_name.to_string(),
            indicator: found[2].and_then(|e| e.text()).map(str::to_string),
            locality_name: found[3].and_then(|e| e.text()).map(str::to_string),
        })
    }
}

/// A full stop-point definition with its descriptor and area membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopPoint {
    /// NaPTAN ATCO code
    pub atco_code: String,
    /// Public-facing stop name
    pub common_name: String,
    /// Abbreviated name for constrained displays
    pub short_common_name: Option<String>,
    /// Nearby landmark
    pub landmark: Option<String>,
    /// Street the stop is on
    pub street: Option<String>,
    /// Stop indicator ("opp", "adj", stand letter)
    pub indicator: Option<String>,
    /// NPTG locality reference
    pub locality_ref: Option<String>,
    /// Administrative area reference
    pub administrative_area_ref: Option<String>,
    /// Active stop-area memberships; inactive references are dropped
    pub stop_areas: Vec<String>,
}

impl StopPoint {
    /// Builds a stop point from a `StopPoint` element. Returns `None`
    /// unless the ATCO code and descriptor common name are present.
    ///
    /// The descriptor's optional children are collected in one pass over
    /// its direct children rather than one query per tag.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let atco_code = el.get_element("AtcoCode").found()?.text()?.to_string();
        let Some(descriptor) = el.get_element("Descriptor").found() else {
            debug!(stop = %atco_code, "skipping stop point without a descriptor");
            return None;
        };
        let found = descriptor.scan_children(&[
            "CommonName",
            "ShortCommonName",
            "Landmark",
            "Street",
            "Indicator",
        ]);
        let Some(common_name) = found[0].and_then(|e| e.text()) else {
            debug!(stop = %atco_code, "skipping stop point without a common name");
            return None;
        };

        let stop_areas = el
            .get_element("StopAreas")
            .found()
            .map(|areas| active_stop_area_refs(&areas))
            .unwrap_or_default();

        Some(Self {
            atco_code,
            common_name: common_name.to_string(),
            short_common_name: found[1].and_then(|e| e.text()).map(str::to_string),
            landmark: found[2].and_then(|e| e.text()).map(str::to_string),
            street: found[3].and_then(|e| e.text()).map(str::to_string),
            indicator: found[4].and_then(|e| e.text()).map(str::to_string),
            locality_ref: el
                .get_element("Place/NptgLocalityRef")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            administrative_area_ref: el
                .get_element("AdministrativeAreaRef")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            stop_areas,
        })
    }
}

/// Collects the stop-area references under a `StopAreas` element whose
/// status is active. A missing `Status` attribute counts as active: live
/// feeds only mark transitions.
pub fn active_stop_area_refs(el: &Element<'_, '_>) -> Vec<String> {
    el.children()
        .filter(|child| child.name() == "StopAreaRef")
        .filter(|child| child.attribute("Status") != Some("inactive"))
        .filter_map(|child| child.text().map(str::to_string))
        .collect()
}
