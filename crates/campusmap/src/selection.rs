//! The form's selection state as an immutable value.
//!
//! Every transition is a method that returns a new `SelectionState`; `reduce`
//! dispatches an [`Action`] to the matching transition. Route responses carry
//! the [`RequestId`] they were issued under and only the latest one is applied.

use std::fmt;

use thiserror::Error;

use crate::api::RouteQuery;
use crate::directory::BuildingDirectory;
use crate::model::RouteSegment;

/// Text shown in a dropdown with nothing selected.
pub const PLACEHOLDER: &str = "Building name";

/// Identifies one issued route request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out strictly increasing request ids. Lives beside the state, not in it.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    last: u64,
}

impl RequestSequencer {
    pub fn next_id(&mut self) -> RequestId {
        self.last += 1;
        RequestId(self.last)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Choose a start building")]
    MissingStart,

    #[error("Choose an end building")]
    MissingEnd,

    #[error("Unknown building: {0}")]
    UnknownBuilding(String),

    #[error("Start and end are both {0}")]
    SameBuilding(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    pub start: Option<String>,
    pub end: Option<String>,
    /// Empty until a route has been loaded.
    pub route: Vec<RouteSegment>,
    /// The request whose response will be accepted, if any.
    pub pending: Option<RequestId>,
    /// Buildings the pending request asked for.
    pub requested: Option<RouteQuery>,
    /// Buildings the displayed route was loaded for.
    pub routed: Option<RouteQuery>,
    /// User-visible message from the last rejected submit or failed request.
    pub notice: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Action {
    SetStart(String),
    SetEnd(String),
    Submitted {
        id: RequestId,
        query: RouteQuery,
    },
    Rejected(String),
    RouteLoaded {
        id: RequestId,
        segments: Vec<RouteSegment>,
    },
    RouteFailed {
        id: RequestId,
        message: String,
    },
    Reset,
}

pub fn reduce(state: &SelectionState, action: Action) -> SelectionState {
    match action {
        Action::SetStart(id) => state.set_start(id),
        Action::SetEnd(id) => state.set_end(id),
        Action::Submitted { id, query } => state.submitted(id, query),
        Action::Rejected(message) => state.rejected(message),
        Action::RouteLoaded { id, segments } => state.route_loaded(id, segments),
        Action::RouteFailed { id, message } => state.route_failed(id, message),
        Action::Reset => state.reset(),
    }
}

impl SelectionState {
    pub fn set_start(&self, id: impl Into<String>) -> Self {
        Self {
            start: Some(id.into()),
            notice: None,
            ..self.clone()
        }
    }

    pub fn set_end(&self, id: impl Into<String>) -> Self {
        Self {
            end: Some(id.into()),
            notice: None,
            ..self.clone()
        }
    }

    /// Check that both selections name distinct, known buildings.
    pub fn validate(&self, directory: &BuildingDirectory) -> Result<RouteQuery, SelectionError> {
        let start = self.start.as_deref().ok_or(SelectionError::MissingStart)?;
        let end = self.end.as_deref().ok_or(SelectionError::MissingEnd)?;
        for id in [start, end] {
            if !directory.contains(id) {
                return Err(SelectionError::UnknownBuilding(id.to_string()));
            }
        }
        if start == end {
            return Err(SelectionError::SameBuilding(start.to_string()));
        }
        Ok(RouteQuery::new(start, end))
    }

    pub fn submitted(&self, id: RequestId, query: RouteQuery) -> Self {
        Self {
            pending: Some(id),
            requested: Some(query),
            notice: None,
            ..self.clone()
        }
    }

    pub fn rejected(&self, message: impl Into<String>) -> Self {
        Self {
            notice: Some(message.into()),
            ..self.clone()
        }
    }

    pub fn route_loaded(&self, id: RequestId, segments: Vec<RouteSegment>) -> Self {
        if self.pending != Some(id) {
            tracing::warn!(request = %id, "discarding stale route response");
            return self.clone();
        }
        Self {
            route: segments,
            pending: None,
            routed: self.requested.clone(),
            requested: None,
            notice: None,
            ..self.clone()
        }
    }

    /// The previous route stays on screen; only the notice changes.
    pub fn route_failed(&self, id: RequestId, message: impl Into<String>) -> Self {
        if self.pending != Some(id) {
            tracing::warn!(request = %id, "discarding stale route failure");
            return self.clone();
        }
        Self {
            pending: None,
            requested: None,
            notice: Some(message.into()),
            ..self.clone()
        }
    }

    pub fn reset(&self) -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Text for the start dropdown's closed state.
    pub fn start_text<'a>(&'a self, directory: &'a BuildingDirectory) -> &'a str {
        self.start
            .as_deref()
            .map_or(PLACEHOLDER, |id| directory.label_for(id))
    }

    pub fn end_text<'a>(&'a self, directory: &'a BuildingDirectory) -> &'a str {
        self.end
            .as_deref()
            .map_or(PLACEHOLDER, |id| directory.label_for(id))
    }

    /// Start and end labels of the displayed route, independent of later dropdown edits.
    pub fn routed_text<'a>(
        &'a self,
        directory: &'a BuildingDirectory,
    ) -> Option<(&'a str, &'a str)> {
        self.routed.as_ref().map(|query| {
            (
                directory.label_for(&query.start),
                directory.label_for(&query.end),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Building, Point};

    fn directory() -> BuildingDirectory {
        BuildingDirectory::ready(vec![
            Building::new("BAG", "Bagley Hall"),
            Building::new("CSE", "Allen Center"),
            Building::new("MGH", "Mary Gates Hall"),
        ])
    }

    fn segment(x0: f64, y0: f64, x1: f64, y1: f64) -> RouteSegment {
        RouteSegment::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut seq = RequestSequencer::default();
        let id = seq.next_id();
        let busy = SelectionState::default()
            .set_start("BAG")
            .set_end("CSE")
            .submitted(id, RouteQuery::new("BAG", "CSE"))
            .route_loaded(id, vec![segment(0.0, 0.0, 1.0, 1.0)])
            .rejected("something");
        assert_ne!(busy, SelectionState::default());
        assert_eq!(busy.reset(), SelectionState::default());
        assert_eq!(SelectionState::default().reset(), SelectionState::default());
    }

    #[test]
    fn test_select_then_reset_shows_placeholders() {
        let dir = directory();
        let state = reduce(&SelectionState::default(), Action::SetStart("BAG".into()));
        let state = reduce(&state, Action::SetEnd("MGH".into()));
        assert_eq!(state.start_text(&dir), "Bagley Hall");
        assert_eq!(state.end_text(&dir), "Mary Gates Hall");

        let state = reduce(&state, Action::Reset);
        assert_eq!(state.start_text(&dir), PLACEHOLDER);
        assert_eq!(state.end_text(&dir), PLACEHOLDER);
        assert!(state.route.is_empty());
    }

    #[test]
    fn test_set_is_unconditional() {
        let state = SelectionState::default().set_start("NOPE").set_end("NOPE");
        assert_eq!(state.start.as_deref(), Some("NOPE"));
        assert_eq!(state.end.as_deref(), Some("NOPE"));
    }

    #[test]
    fn test_validation() {
        let dir = directory();
        let empty = SelectionState::default();
        assert_eq!(empty.validate(&dir), Err(SelectionError::MissingStart));
        assert_eq!(
            empty.set_start("BAG").validate(&dir),
            Err(SelectionError::MissingEnd)
        );
        assert_eq!(
            empty.set_start(PLACEHOLDER).set_end("CSE").validate(&dir),
            Err(SelectionError::UnknownBuilding(PLACEHOLDER.to_string()))
        );
        assert_eq!(
            empty.set_start("CSE").set_end("CSE").validate(&dir),
            Err(SelectionError::SameBuilding("CSE".to_string()))
        );
        assert_eq!(
            empty.set_start("BAG").set_end("CSE").validate(&dir),
            Ok(RouteQuery::new("BAG", "CSE"))
        );
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut seq = RequestSequencer::default();
        let first = seq.next_id();
        let second = seq.next_id();
        assert!(second > first);

        let state = SelectionState::default()
            .set_start("BAG")
            .set_end("CSE")
            .submitted(first, RouteQuery::new("BAG", "CSE"))
            .submitted(second, RouteQuery::new("BAG", "CSE"));

        // Latest request resolves first, the older one afterwards.
        let state = state.route_loaded(second, vec![segment(1.0, 1.0, 2.0, 2.0)]);
        let state = state.route_loaded(first, vec![segment(9.0, 9.0, 8.0, 8.0)]);
        assert_eq!(state.route, vec![segment(1.0, 1.0, 2.0, 2.0)]);
        assert!(!state.is_pending());
    }

    #[test]
    fn test_response_after_reset_is_discarded() {
        let mut seq = RequestSequencer::default();
        let id = seq.next_id();
        let state = SelectionState::default()
            .set_start("BAG")
            .set_end("CSE")
            .submitted(id, RouteQuery::new("BAG", "CSE"))
            .reset();
        let state = state.route_loaded(id, vec![segment(0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(state, SelectionState::default());
    }

    #[test]
    fn test_failure_keeps_previous_route() {
        let mut seq = RequestSequencer::default();
        let first = seq.next_id();
        let route = vec![segment(0.0, 0.0, 5.0, 5.0)];
        let state = SelectionState::default()
            .submitted(first, RouteQuery::new("BAG", "CSE"))
            .route_loaded(first, route.clone());

        let second = seq.next_id();
        let state = state.submitted(second, RouteQuery::new("BAG", "MGH"));
        let state = reduce(&state, Action::RouteFailed {
            id: second,
            message: "HTTP 500".into(),
        });
        assert_eq!(state.route, route);
        assert_eq!(state.routed, Some(RouteQuery::new("BAG", "CSE")));
        assert_eq!(state.notice.as_deref(), Some("HTTP 500"));
        assert!(!state.is_pending());
    }

    #[test]
    fn test_new_selection_clears_notice() {
        let state = SelectionState::default().rejected("Choose a start building");
        assert!(state.notice.is_some());
        assert!(state.set_start("BAG").notice.is_none());
    }

    #[test]
    fn test_routed_labels_follow_request_not_dropdowns() {
        let dir = directory();
        let mut seq = RequestSequencer::default();
        let id = seq.next_id();
        let state = SelectionState::default().set_start("BAG").set_end("CSE");
        let query = state.validate(&dir).unwrap();
        let state = state
            .submitted(id, query)
            .set_start("MGH")
            .route_loaded(id, vec![segment(0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(state.routed_text(&dir), Some(("Bagley Hall", "Allen Center")));

        let state = state.set_end("BAG");
        assert_eq!(state.start_text(&dir), "Mary Gates Hall");
        assert_eq!(state.routed_text(&dir), Some(("Bagley Hall", "Allen Center")));
        assert_eq!(state.reset().routed_text(&dir), None);
    }
}
