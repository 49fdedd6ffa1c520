use serde::Serialize;

use super::route::Route;
use crate::catalog::Program;
use crate::events::Event;
use crate::progress::{Evaluation, UserProgress};
use crate::ritual::DailyRitual;

/// Everything the dashboard page shows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub program: Program,
    pub progress: UserProgress,
    pub ritual: DailyRitual,
    /// Present on the first load of a session only.
    pub evaluation: Option<Evaluation>,
    /// Set when this load rolled the current day forward.
    pub advanced: Option<Event>,
}

/// Result of loading the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardView {
    /// The guard sent the user elsewhere; nothing was fetched.
    Redirect { to: Route },
    Ready(Box<Dashboard>),
}

impl DashboardView {
    pub fn redirect(&self) -> Option<Route> {
        match self {
            DashboardView::Redirect { to } => Some(*to),
            DashboardView::Ready(_) => None,
        }
    }
}
