//! Route records: routes, route sections, and route links.

use tracing::debug;

use crate::navigator::Element;
use crate::records::common::parse_int;

/// A physical link between two stops on a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLink {
    /// Link id attribute
    pub id: String,
    /// Departure stop reference
    pub from_stop: String,
    /// Arrival stop reference
    pub to_stop: String,
    /// Link length in metres
    pub distance: Option<i64>,
    /// Direction of travel along the link
    pub direction: Option<String>,
}

impl RouteLink {
    /// Builds a link from a `RouteLink` element; the id and both stop
    /// references are required.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let id = el.attribute("id")?.to_string();
        let from_stop = el
            .get_element("From/StopPointRef")
            .found()
            .and_then(|e| e.text())?
            .to_string();
        let to_stop = el
            .get_element("To/StopPointRef")
            .found()
            .and_then(|e| e.text())?
            .to_string();
        Some(Self {
            id,
            from_stop,
            to_stop,
            distance: el
                .get_element("Distance")
                .found()
                .and_then(|e| e.text())
                .and_then(parse_int),
            direction: el
                .get_element("Direction")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
        })
    }
}

/// An ordered group of route links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSection {
    /// Section id attribute
    pub id: String,
    /// Links in traversal order; never empty
    pub links: Vec<RouteLink>,
}

impl RouteSection {
    /// Builds a section from a `RouteSection` element. Incomplete links
    /// are skipped; a section with no usable link does not exist.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let id = el.attribute("id")?.to_string();
        let links: Vec<_> = el
            .get_elements("RouteLink")
            .iter()
            .filter_map(RouteLink::from_element)
            .collect();
        if links.is_empty() {
            debug!(section = %id, "skipping route section without route links");
            return None;
        }
        Some(Self { id, links })
    }
}

/// A named route assembled from route sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Route id attribute
    pub id: String,
    /// Human-readable description
    pub description: Option<String>,
    /// Operator-private code
    pub private_code: Option<String>,
    /// Referenced route sections, in order; never empty
    pub section_refs: Vec<String>,
}

impl Route {
    /// Builds a route from a `Route` element; the id and at least one
    /// `RouteSectionRef` are required.
    pub fn from_element(el: &Element<'_, '_>) -> Option<Self> {
        let id = el.attribute("id")?.to_string();
        let section_refs: Vec<String> = el
            .get_elements("RouteSectionRef")
            .iter()
            .filter_map(Element::text)
            .map(str::to_string)
            .collect();
        if section_refs.is_empty() {
            debug!(route = %id, "skipping route without section refs");
            return None;
        }
        Some(Self {
            id,
            description: el
                .get_element("Description")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            private_code: el
                .get_element("PrivateCode")
                .found()
                .and_then(|e| e.text())
                .map(str::to_string),
            section_refs,
        })
    }
}
