//! Page routes and the access guard in front of them.

use serde::{Deserialize, Serialize};

use super::store::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Home,
    Login,
    Programs,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Programs => "/programs",
            Route::Dashboard => "/dashboard",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Home),
            "/login" => Some(Route::Login),
            "/programs" => Some(Route::Programs),
            "/dashboard" => Some(Route::Dashboard),
            _ => None,
        }
    }
}

/// Where a request for `requested` actually lands given `state`.
///
/// - signed out: only Home and Login are reachable
/// - signed in on Login: sent on to Dashboard, or Programs without a program
/// - Dashboard without an active program: Programs
pub fn guard(requested: Route, state: &AppState) -> Route {
    let signed_in = state.auth.is_signed_in();
    let landing = if state.has_active_program() {
        Route::Dashboard
    } else {
        Route::Programs
    };

    match requested {
        Route::Home => Route::Home,
        Route::Login if signed_in => landing,
        Route::Login => Route::Login,
        _ if !signed_in => Route::Login,
        Route::Programs => Route::Programs,
        Route::Dashboard => landing,
    }
}
