//! Client routes, access guards, and the navigation seam.
//!
//! Unauthenticated visitors to a protected route go to `/login`; anyone who
//! is not an admin and tries an admin route goes to `/`. While the session is
//! still being restored, guarded routes wait.

use parking_lot::Mutex;

use crate::auth::session::SessionState;

/// Where unauthenticated users and ended sessions are sent.
pub const LOGIN_PATH: &str = "/login";
/// Landing view after login and for refused admin access.
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppRoute {
    Home,
    Login,
    Register,
    RoutePlanner,
    Reviews,
    Profile,
    Places,
    PlaceDetail(String),
    AdminDashboard,
    AdminPlaces,
    NotFound(String),
}

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Public,
    Authenticated,
    Admin,
}

impl AppRoute {
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => AppRoute::Home,
            ["login"] => AppRoute::Login,
            ["register"] => AppRoute::Register,
            ["route-planner"] => AppRoute::RoutePlanner,
            ["reviews"] => AppRoute::Reviews,
            ["profile"] => AppRoute::Profile,
            ["places"] => AppRoute::Places,
            ["places", id] => AppRoute::PlaceDetail((*id).to_string()),
            ["admin", "places"] => AppRoute::AdminPlaces,
            ["admin", ..] => AppRoute::AdminDashboard,
            _ => AppRoute::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            AppRoute::Home => HOME_PATH.to_string(),
            AppRoute::Login => LOGIN_PATH.to_string(),
            AppRoute::Register => "/register".to_string(),
            AppRoute::RoutePlanner => "/route-planner".to_string(),
            AppRoute::Reviews => "/reviews".to_string(),
            AppRoute::Profile => "/profile".to_string(),
            AppRoute::Places => "/places".to_string(),
            AppRoute::PlaceDetail(id) => format!("/places/{id}"),
            AppRoute::AdminDashboard => "/admin".to_string(),
            AppRoute::AdminPlaces => "/admin/places".to_string(),
            AppRoute::NotFound(path) => path.clone(),
        }
    }

    pub fn guard(&self) -> Guard {
        match self {
            AppRoute::RoutePlanner | AppRoute::Profile => Guard::Authenticated,
            AppRoute::AdminDashboard | AppRoute::AdminPlaces => Guard::Admin,
            _ => Guard::Public,
        }
    }
}

/// Outcome of checking a route against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Session restore still in progress.
    Pending,
    Redirect(&'static str),
}

/// Decides whether `route` may be shown for `session`.
///
/// Public routes are always allowed. Guarded routes wait while the session
/// is still loading, then redirect to login or home when the guard fails.
pub fn check_access(route: &AppRoute, session: &SessionState) -> Access {
    let guard = route.guard();
    if guard == Guard::Public {
        return Access::Allow;
    }
    if session.loading {
        return Access::Pending;
    }
    match guard {
        Guard::Authenticated if !session.authenticated => Access::Redirect(LOGIN_PATH),
        Guard::Admin if !session.authenticated || !session.admin => Access::Redirect(HOME_PATH),
        _ => Access::Allow,
    }
}

/// Platform navigation. The session manager uses it to move the user after
/// login and logout.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
    /// Drop any page-level in-memory state.
    fn reload(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    Navigate(String),
    Reload,
}

/// Navigator that only records what was asked of it.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavEvent>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavEvent> {
        self.events.lock().clone()
    }

    pub fn last_path(&self) -> Option<String> {
        self.events.lock().iter().rev().find_map(|e| match e {
            NavEvent::Navigate(path) => Some(path.clone()),
            NavEvent::Reload => None,
        })
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!("navigate → {}", path);
        self.events.lock().push(NavEvent::Navigate(path.to_string()));
    }

    fn reload(&self) {
        tracing::debug!("reload requested");
        self.events.lock().push(NavEvent::Reload);
    }
}
