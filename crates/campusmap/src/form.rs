use crate::api::RouteQuery;
use crate::directions::Itinerary;
use crate::directory::BuildingDirectory;
use crate::fetch::FetchEvent;
use crate::model::{Building, RouteSegment};
use crate::selection::{self, Action, RequestId, RequestSequencer, SelectionState};

/// The route form: building directory, selection state and request sequencing.
///
/// Network work is not done here. `submit` returns the query to dispatch and
/// results come back through `apply`.
#[derive(Debug, Default)]
pub struct RouteOverlayForm {
    directory: BuildingDirectory,
    state: SelectionState,
    sequencer: RequestSequencer,
}

impl RouteOverlayForm {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_buildings(buildings: Vec<Building>) -> Self {
        Self {
            directory: BuildingDirectory::ready(buildings),
            ..Self::default()
        }
    }

    pub fn directory(&self) -> &BuildingDirectory {
        &self.directory
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn route(&self) -> &[RouteSegment] {
        &self.state.route
    }

    /// Directions for the displayed route, titled with the buildings it was requested for.
    pub fn itinerary(&self) -> Option<Itinerary> {
        if self.state.route.is_empty() {
            return None;
        }
        let (from, to) = self.state.routed_text(&self.directory)?;
        Some(Itinerary::new(&self.state.route, from, to))
    }

    pub fn list_buildings(&self) -> &[Building] {
        self.directory.list_buildings()
    }

    pub fn dispatch(&mut self, action: Action) {
        self.state = selection::reduce(&self.state, action);
    }

    pub fn set_start(&mut self, id: impl Into<String>) {
        self.dispatch(Action::SetStart(id.into()));
    }

    pub fn set_end(&mut self, id: impl Into<String>) {
        self.dispatch(Action::SetEnd(id.into()));
    }

    pub fn reset(&mut self) {
        self.dispatch(Action::Reset);
    }

    pub fn reload_buildings(&mut self) {
        self.directory.reloading();
    }

    /// Validate the selection and, if it holds, open a new request.
    ///
    /// Returns `None` when the submit was rejected locally; the reason is in
    /// the state's notice and nothing should be sent.
    pub fn submit(&mut self) -> Option<(RequestId, RouteQuery)> {
        match self.state.validate(&self.directory) {
            Ok(query) => {
                let id = self.sequencer.next_id();
                tracing::debug!(
                    request = %id,
                    start = %query.start,
                    end = %query.end,
                    "route submitted"
                );
                self.dispatch(Action::Submitted {
                    id,
                    query: query.clone(),
                });
                Some((id, query))
            }
            Err(e) => {
                tracing::info!(reason = %e, "route submit rejected");
                self.dispatch(Action::Rejected(e.to_string()));
                None
            }
        }
    }

    pub fn apply(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Buildings(Ok(buildings)) => self.directory.loaded(buildings),
            FetchEvent::Buildings(Err(e)) => self.directory.failed(e.to_string()),
            FetchEvent::Route { id, result: Ok(segments) } => {
                tracing::info!(request = %id, segments = segments.len(), "route loaded");
                self.dispatch(Action::RouteLoaded { id, segments });
            }
            FetchEvent::Route { id, result: Err(e) } => {
                tracing::error!(request = %id, error = %e, "route request failed");
                self.dispatch(Action::RouteFailed {
                    id,
                    message: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::directory::DirectoryStatus;
    use crate::model::Point;
    use crate::selection::PLACEHOLDER;

    fn buildings() -> Vec<Building> {
        vec![
            Building::new("BAG", "Bagley Hall"),
            Building::new("CSE", "Allen Center"),
            Building::new("MGH", "Mary Gates Hall"),
        ]
    }

    #[test]
    fn test_placeholder_submit_makes_no_request() {
        let mut form = RouteOverlayForm::with_buildings(buildings());
        form.set_start(PLACEHOLDER);
        form.set_end("CSE");
        assert!(form.submit().is_none());
        assert!(!form.state().is_pending());
        assert_eq!(
            form.state().notice.as_deref(),
            Some("Unknown building: Building name")
        );
    }

    #[test]
    fn test_submit_before_buildings_load_is_rejected() {
        let mut form = RouteOverlayForm::new();
        form.set_start("BAG");
        form.set_end("CSE");
        assert!(form.submit().is_none());
    }

    #[test]
    fn test_submit_and_apply() {
        let mut form = RouteOverlayForm::with_buildings(buildings());
        form.set_start("BAG");
        form.set_end("CSE");
        let (id, query) = form.submit().unwrap();
        assert_eq!(query, RouteQuery::new("BAG", "CSE"));
        assert!(form.state().is_pending());

        let segments = vec![RouteSegment::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0))];
        form.apply(FetchEvent::Route {
            id,
            result: Ok(segments.clone()),
        });
        assert_eq!(form.route(), segments.as_slice());
    }

    #[test]
    fn test_last_issued_wins() {
        let mut form = RouteOverlayForm::with_buildings(buildings());
        form.set_start("BAG");
        form.set_end("CSE");
        let (first, _) = form.submit().unwrap();
        let (second, _) = form.submit().unwrap();

        let newer = vec![RouteSegment::new(Point::new(1.0, 1.0), Point::new(2.0, 2.0))];
        let older = vec![RouteSegment::new(Point::new(7.0, 7.0), Point::new(8.0, 8.0))];
        form.apply(FetchEvent::Route {
            id: second,
            result: Ok(newer.clone()),
        });
        form.apply(FetchEvent::Route {
            id: first,
            result: Ok(older),
        });
        assert_eq!(form.route(), newer.as_slice());
    }

    #[test]
    fn test_directory_events() {
        let mut form = RouteOverlayForm::new();
        form.apply(FetchEvent::Buildings(Err(ApiError::Status {
            url: "http://localhost:8080/getBuildings".into(),
            status: 503,
        })));
        assert!(matches!(
            form.directory().status(),
            DirectoryStatus::Failed(msg) if msg.contains("503")
        ));

        form.reload_buildings();
        form.apply(FetchEvent::Buildings(Ok(buildings())));
        assert_eq!(form.list_buildings().len(), 3);
    }

    #[test]
    fn test_itinerary_keeps_requested_buildings() {
        let mut form = RouteOverlayForm::with_buildings(buildings());
        assert!(form.itinerary().is_none());

        form.set_start("BAG");
        form.set_end("CSE");
        let (id, _) = form.submit().unwrap();
        form.apply(FetchEvent::Route {
            id,
            result: Ok(vec![RouteSegment::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0))]),
        });
        form.set_start("MGH");

        let itinerary = form.itinerary().unwrap();
        assert_eq!(itinerary.title, "Path from Bagley Hall to Allen Center:");
    }

    #[test]
    fn test_late_response_titled_with_its_own_request() {
        let mut form = RouteOverlayForm::with_buildings(buildings());
        form.set_start("BAG");
        form.set_end("CSE");
        let (id, _) = form.submit().unwrap();
        form.set_end("MGH");
        form.apply(FetchEvent::Route {
            id,
            result: Ok(vec![RouteSegment::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0))]),
        });

        let itinerary = form.itinerary().unwrap();
        assert_eq!(itinerary.title, "Path from Bagley Hall to Allen Center:");
    }
}
