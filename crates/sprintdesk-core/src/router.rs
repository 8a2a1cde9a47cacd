//! Route table and navigation.
//!
//! `Route` is the parsed form of a path. `Router` maps routes to screens and
//! wraps every protected one in the `Authenticated` guard. `Navigator` is the
//! handle screens use to request a route change; the front end applies it.

use std::sync::{Arc, Mutex};

use reqwest::Url;
use tracing::debug;

use crate::auth::store::lock;
use crate::auth::Authenticated;
use crate::screens::{
    HelpScreen, HomeScreen, LoginScreen, ManagementScreen, NotFoundScreen, ProjectScreen,
    ProjectsScreen, RegisterScreen, ScreenContext, SprintScreen,
};
use crate::view::Screen;

/// Base used only to lean on `Url` for path/query parsing
const APP_ORIGIN: &str = "sprintdesk://app";

/// Query key carrying the deferred navigation intent on `/login`
pub const RETURN_TO_KEY: &str = "return_to";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Help,
    Login { return_to: Option<String> },
    Register,
    Projects,
    Project { project_id: i64 },
    Sprint { project_id: i64, sprint_id: i64 },
    ProjectManagement,
    NotFound { path: String },
}

impl Route {
    /// Resolve a path (optionally with a query string) to a route.
    /// Trailing slashes are ignored; anything unknown is `NotFound`.
    pub fn parse(path: &str) -> Self {
        let normalized = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let not_found = || Route::NotFound {
            path: path.to_string(),
        };

        let Ok(url) = Url::parse(&format!("{}{}", APP_ORIGIN, normalized)) else {
            return not_found();
        };
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [] => Route::Home,
            ["help"] => Route::Help,
            ["login"] => Route::Login {
                return_to: url
                    .query_pairs()
                    .find(|(k, _)| k == RETURN_TO_KEY)
                    .map(|(_, v)| v.into_owned())
                    .filter(|v| Self::is_safe_return(v)),
            },
            ["register"] => Route::Register,
            ["projects"] => Route::Projects,
            ["projects", id] => match parse_id(id) {
                Some(project_id) => Route::Project { project_id },
                None => not_found(),
            },
            ["projects", id, "sprint", sid] => match (parse_id(id), parse_id(sid)) {
                (Some(project_id), Some(sprint_id)) => Route::Sprint {
                    project_id,
                    sprint_id,
                },
                _ => not_found(),
            },
            ["project-management"] => Route::ProjectManagement,
            _ => not_found(),
        }
    }

    /// Only in-app paths that are not themselves auth screens
    fn is_safe_return(path: &str) -> bool {
        path.starts_with('/')
            && !matches!(
                Route::parse(path),
                Route::Login { .. } | Route::Register | Route::NotFound { .. }
            )
    }

    /// Canonical path, including the `return_to` query for login
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Help => "/help".to_string(),
            Route::Login { return_to: None } => "/login".to_string(),
            Route::Login {
                return_to: Some(target),
            } => match Url::parse(&format!("{}/login", APP_ORIGIN)) {
                Ok(mut url) => {
                    url.query_pairs_mut().append_pair(RETURN_TO_KEY, target);
                    format!("{}?{}", url.path(), url.query().unwrap_or_default())
                }
                Err(_) => "/login".to_string(),
            },
            Route::Register => "/register".to_string(),
            Route::Projects => "/projects".to_string(),
            Route::Project { project_id } => format!("/projects/{}", project_id),
            Route::Sprint {
                project_id,
                sprint_id,
            } => format!("/projects/{}/sprint/{}", project_id, sprint_id),
            Route::ProjectManagement => "/project-management".to_string(),
            Route::NotFound { path } => path.clone(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Route::Projects
                | Route::Project { .. }
                | Route::Sprint { .. }
                | Route::ProjectManagement
        )
    }

    /// Where Esc leads
    pub fn parent(&self) -> Option<Route> {
        match self {
            Route::Home => None,
            Route::Project { .. } => Some(Route::Projects),
            Route::Sprint { project_id, .. } => Some(Route::Project {
                project_id: *project_id,
            }),
            _ => Some(Route::Home),
        }
    }
}

/// Path segment as a backend id: plain decimal digits only, so `-7` and
/// `+7` are not ids.
fn parse_id(segment: &str) -> Option<i64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Pending route change requested by a screen or the guard.
///
/// Only the latest request is kept; the front end takes it once per tick.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    pending: Arc<Mutex<Option<Route>>>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigate(&self, route: Route) {
        let mut pending = lock(&self.pending);
        if pending.as_ref() != Some(&route) {
            debug!(path = %route.path(), "Navigation requested");
        }
        *pending = Some(route);
    }

    pub fn take(&self) -> Option<Route> {
        lock(&self.pending).take()
    }

    pub fn pending(&self) -> Option<Route> {
        lock(&self.pending).clone()
    }
}

/// Builds the screen for a route, guarding protected ones.
pub struct Router {
    cx: ScreenContext,
}

impl Router {
    pub fn new(cx: ScreenContext) -> Self {
        Self { cx }
    }

    pub fn context(&self) -> &ScreenContext {
        &self.cx
    }

    pub fn resolve(&self, path: &str) -> (Route, Box<dyn Screen>) {
        let route = Route::parse(path);
        let screen = self.build(&route);
        (route, screen)
    }

    /// Construct (but do not mount) the screen for `route`.
    pub fn build(&self, route: &Route) -> Box<dyn Screen> {
        let cx = self.cx.clone();
        match route {
            Route::Home => Box::new(HomeScreen::new(cx)),
            Route::Help => Box::new(HelpScreen),
            Route::Login { return_to } => Box::new(LoginScreen::new(cx, return_to.clone())),
            Route::Register => Box::new(RegisterScreen::new(cx)),
            Route::Projects => self.guarded(route, ProjectsScreen::new(cx)),
            Route::Project { project_id } => self.guarded(route, ProjectScreen::new(cx, *project_id)),
            Route::Sprint {
                project_id,
                sprint_id,
            } => self.guarded(route, SprintScreen::new(cx, *project_id, *sprint_id)),
            Route::ProjectManagement => self.guarded(route, ManagementScreen::new(cx)),
            Route::NotFound { path } => Box::new(NotFoundScreen::new(path.clone())),
        }
    }

    fn guarded<S: Screen + 'static>(&self, route: &Route, screen: S) -> Box<dyn Screen> {
        Box::new(Authenticated::new(
            screen,
            self.cx.session.clone(),
            self.cx.navigator.clone(),
            route.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_public_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/help"), Route::Help);
        assert_eq!(Route::parse("/help/"), Route::Help);
        assert_eq!(Route::parse("/register"), Route::Register);
        assert_eq!(Route::parse("/login"), Route::Login { return_to: None });
    }

    #[test]
    fn test_parse_protected_routes() {
        assert_eq!(Route::parse("/projects"), Route::Projects);
        assert_eq!(Route::parse("/projects/"), Route::Projects);
        assert_eq!(Route::parse("/projects/7"), Route::Project { project_id: 7 });
        assert_eq!(
            Route::parse("/projects/7/sprint/3/"),
            Route::Sprint {
                project_id: 7,
                sprint_id: 3
            }
        );
        assert_eq!(Route::parse("/project-management"), Route::ProjectManagement);
        assert!(Route::parse("/projects/7").requires_auth());
        assert!(!Route::parse("/help").requires_auth());
    }

    #[test]
    fn test_parse_not_found() {
        for path in [
            "/nope",
            "/projects/abc",
            "/projects/-7",
            "/projects/+7",
            "/projects/7/sprint",
            "/projects/7/sprint/x",
            "/projects/7/sprint/-3",
            "/project-magement",
        ] {
            assert_eq!(
                Route::parse(path),
                Route::NotFound {
                    path: path.to_string()
                },
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_login_return_to_round_trip() {
        let login = Route::Login {
            return_to: Some("/projects/7/sprint/3".to_string()),
        };
        let path = login.path();
        assert!(path.starts_with("/login?return_to="));
        assert_eq!(Route::parse(&path), login);
    }

    #[test]
    fn test_login_return_to_rejects_unsafe_targets() {
        assert_eq!(
            Route::parse("/login?return_to=/login"),
            Route::Login { return_to: None }
        );
        assert_eq!(
            Route::parse("/login?return_to=https://evil.example"),
            Route::Login { return_to: None }
        );
        assert_eq!(
            Route::parse("/login?return_to=/missing"),
            Route::Login { return_to: None }
        );
    }

    #[test]
    fn test_parent() {
        assert_eq!(Route::Home.parent(), None);
        assert_eq!(Route::Project { project_id: 2 }.parent(), Some(Route::Projects));
        assert_eq!(
            Route::Sprint {
                project_id: 2,
                sprint_id: 5
            }
            .parent(),
            Some(Route::Project { project_id: 2 })
        );
        assert_eq!(Route::Projects.parent(), Some(Route::Home));
    }

    #[test]
    fn test_navigator_keeps_latest() {
        let navigator = Navigator::new();
        let handle = navigator.clone();
        handle.navigate(Route::Help);
        handle.navigate(Route::Projects);
        assert_eq!(navigator.pending(), Some(Route::Projects));
        assert_eq!(navigator.take(), Some(Route::Projects));
        assert_eq!(navigator.take(), None);
    }
}
