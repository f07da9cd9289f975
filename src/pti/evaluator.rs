//! The PTI rule evaluator.
//!
//! [`DocumentView`] gives the built-in checks lazily-computed, memoised
//! access to the cross-sections most observations need (all vehicle
//! journeys, services, lines, journey patterns). Each section is mapped
//! once per document and reused for the life of the evaluation.
//!
//! [`PtiValidator`] walks the catalogue and dispatches each observation
//! to its built-in check. Observations without a built-in are skipped
//! with a warning so a newer catalogue cannot silently change meaning.

use std::cell::OnceCell;

use tracing::{debug, warn};

use crate::navigator::Element;
use crate::pti::catalogue::{Observation, RuleCatalogue};
use crate::pti::revision::{check_revision, LiveAttributes};
use crate::records::{
    JourneyPattern, Line, OperatingProfile, Service, TransportMode, TxcAttributes, VehicleJourney,
};
use crate::report::{Violation, ViolationCode};

/// A per-document evaluation context with cached cross-sections.
///
/// Accessors compute on first use and never recompute; the view holds no
/// other state, so evaluating the same document twice through two views
/// yields identical results.
pub struct DocumentView<'a, 'input> {
    root: Element<'a, 'input>,
    vehicle_journeys: OnceCell<Vec<(u64, VehicleJourney)>>,
    services: OnceCell<Vec<(u64, Service)>>,
    lines: OnceCell<Vec<Line>>,
    journey_patterns: OnceCell<Vec<JourneyPattern>>,
    attributes: OnceCell<Option<TxcAttributes>>,
}

impl<'a, 'input> DocumentView<'a, 'input> {
    /// Creates a view over a document root. Nothing is computed yet.
    pub fn new(root: Element<'a, 'input>) -> Self {
        Self {
            root,
            vehicle_journeys: OnceCell::new(),
            services: OnceCell::new(),
            lines: OnceCell::new(),
            journey_patterns: OnceCell::new(),
            attributes: OnceCell::new(),
        }
    }

    /// All vehicle journeys with the line each was declared on.
    pub fn vehicle_journeys(&self) -> &[(u64, VehicleJourney)] {
        self.vehicle_journeys.get_or_init(|| {
            self.root
                .get_elements("VehicleJourneys/VehicleJourney")
                .iter()
                .filter_map(|el| {
                    VehicleJourney::from_element(el).map(|vj| (el.line_number(), vj))
                })
                .collect()
        })
    }

    /// All services with the line each was declared on.
    pub fn services(&self) -> &[(u64, Service)] {
        self.services.get_or_init(|| {
            self.root
                .get_elements("Services/Service")
                .iter()
                .filter_map(|el| Service::from_element(el).map(|s| (el.line_number(), s)))
                .collect()
        })
    }

    /// All lines across all services.
    pub fn lines(&self) -> &[Line] {
        self.lines.get_or_init(|| {
            self.root
                .get_elements("Services/Service/Lines/Line")
                .iter()
                .filter_map(Line::from_element)
                .collect()
        })
    }

    /// All journey patterns across all services.
    pub fn journey_patterns(&self) -> &[JourneyPattern] {
        self.journey_patterns.get_or_init(|| {
            self.root
                .get_elements("Services/Service/StandardService/JourneyPattern")
                .iter()
                .filter_map(JourneyPattern::from_element)
                .collect()
        })
    }

    /// The document's revision attributes, when it declares them.
    pub fn attributes(&self) -> Option<&TxcAttributes> {
        self.attributes
            .get_or_init(|| TxcAttributes::from_element(&self.root))
            .as_ref()
    }

    /// The service a journey belongs to.
    fn service_of<'v>(&'v self, journey: &VehicleJourney) -> Option<&'v Service> {
        self.services()
            .iter()
            .map(|(_, s)| s)
            .find(|s| s.service_code == journey.service_ref)
    }

    /// A journey's operating profile, falling back to its service's.
    fn effective_profile<'v>(
        &'v self,
        journey: &'v VehicleJourney,
    ) -> Option<&'v OperatingProfile> {
        if journey.operating_profile.is_some() {
            return journey.operating_profile.as_ref();
        }
        self.service_of(journey)
            .and_then(|s| s.operating_profile.as_ref())
    }
}

/// Evaluates the observation catalogue against one document.
pub struct PtiValidator<'c> {
    catalogue: &'c RuleCatalogue,
}

impl<'c> PtiValidator<'c> {
    /// Creates a validator over a loaded catalogue.
    pub fn new(catalogue: &'c RuleCatalogue) -> Self {
        Self { catalogue }
    }

    /// Runs every observation against the document and returns the
    /// violations found. A pure function of the document, the catalogue,
    /// and the supplied live attributes.
    pub fn validate(
        &self,
        root: &Element<'_, '_>,
        filename: &str,
        live: Option<&[LiveAttributes]>,
    ) -> Vec<Violation> {
        let view = DocumentView::new(*root);
        let mut violations = Vec::new();

        for observation in &self.catalogue.observations {
            match observation.number {
                13 => self.check_journey_references(&view, filename, observation, &mut violations),
                17 => self.check_operating_period(&view, filename, observation, &mut violations),
                22 => self.check_profile_span(&view, filename, observation, &mut violations),
                28 => self.check_degenerate_profiles(&view, filename, observation, &mut violations),
                48 => self.check_revision_number(&view, filename, observation, live, &mut violations),
                number => {
                    warn!(observation = number, "no built-in check for observation, skipping");
                }
            }
        }

        debug!(
            filename,
            violations = violations.len(),
            "rule evaluation finished"
        );
        violations
    }

    /// Observation 13: a journey must reference a pattern or another
    /// journey.
    fn check_journey_references(
        &self,
        view: &DocumentView<'_, '_>,
        filename: &str,
        observation: &Observation,
        violations: &mut Vec<Violation>,
    ) {
        for (line, journey) in view.vehicle_journeys() {
            if journey.journey_pattern_ref.is_none() && journey.vehicle_journey_ref.is_none() {
                violations.push(observation_violation(observation, filename, *line));
            }
        }
    }

    /// Observation 17: a service must declare when it starts operating.
    fn check_operating_period(
        &self,
        view: &DocumentView<'_, '_>,
        filename: &str,
        observation: &Observation,
        violations: &mut Vec<Violation>,
    ) {
        for (line, service) in view.services() {
            if service.operating_period.start.is_none() {
                violations.push(observation_violation(observation, filename, *line));
            }
        }
    }

    /// Observation 22: special operating ranges are capped at two
    /// months unless inherited from the service operating period.
    fn check_profile_span(
        &self,
        view: &DocumentView<'_, '_>,
        filename: &str,
        observation: &Observation,
        violations: &mut Vec<Violation>,
    ) {
        for (line, journey) in view.vehicle_journeys() {
            let Some(profile) = view.effective_profile(journey) else {
                continue;
            };
            let service_period = view.service_of(journey).map(|s| s.operating_period);
            for range in &profile.special_days.days_of_operation {
                if !range.spans_more_than_months(2) {
                    continue;
                }
                if service_period == Some(*range) {
                    continue;
                }
                violations.push(observation_violation(observation, filename, *line));
            }
        }
    }

    /// Observation 28: journeys on non-coach services need an operating
    /// profile that could actually run.
    fn check_degenerate_profiles(
        &self,
        view: &DocumentView<'_, '_>,
        filename: &str,
        observation: &Observation,
        violations: &mut Vec<Violation>,
    ) {
        for (line, journey) in view.vehicle_journeys() {
            let mode = view
                .service_of(journey)
                .map(|s| s.mode)
                .unwrap_or_default();
            if mode == TransportMode::Coach {
                continue;
            }
            let degenerate = match view.effective_profile(journey) {
                Some(profile) => profile.is_degenerate(),
                None => true,
            };
            if degenerate {
                violations.push(observation_violation(observation, filename, *line));
            }
        }
    }

    /// Observation 48: revision numbers must increase over the live
    /// document for the same service-code and line-name set.
    fn check_revision_number(
        &self,
        view: &DocumentView<'_, '_>,
        filename: &str,
        observation: &Observation,
        live: Option<&[LiveAttributes]>,
        violations: &mut Vec<Violation>,
    ) {
        let (Some(attributes), Some(live)) = (view.attributes(), live) else {
            return;
        };
        if let Some(conflict) = check_revision(attributes, live) {
            let mut violation =
                observation_violation(observation, filename, view.root.line_number());
            violation.message = format!(
                "{} (draft revision {}, live revision {})",
                observation.details, conflict.draft_revision, conflict.live_revision
            );
            violations.push(violation);
        }
    }
}

fn observation_violation(observation: &Observation, filename: &str, line: u64) -> Violation {
    Violation {
        code: ViolationCode::PtiViolationFound,
        filename: filename.to_string(),
        line,
        category: observation.category.clone(),
        reference: observation.reference.clone(),
        context: observation.context.clone(),
        message: observation.details.clone(),
        numeric_id: observation.number,
    }
}
