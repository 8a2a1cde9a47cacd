//! Application state for the sprintdesk terminal client.
//!
//! `App` owns the current route and its mounted screen, applies navigation
//! requests, routes keys to the screen or to the global shortcuts, and keeps
//! the session fresh in the background.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use sprintdesk_core::api::{AuthApi, ProjectApi};
use sprintdesk_core::auth::{CredentialEvent, SessionContext, Subscription};
use sprintdesk_core::config::SharedConfig;
use sprintdesk_core::router::{Navigator, Route, Router};
use sprintdesk_core::screens::ScreenContext;
use sprintdesk_core::utils::format_minutes;
use sprintdesk_core::view::{Input, InputOutcome, Screen, ScreenView};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on redirects applied in one tick (a mount may redirect again).
const MAX_REDIRECTS_PER_TICK: usize = 4;

/// Wait this long before retrying a background refresh that failed.
const REFRESH_RETRY_INTERVAL: Duration = Duration::from_secs(30);

pub struct App {
    session: SessionContext,
    router: Router,
    navigator: Navigator,
    route: Route,
    screen: Box<dyn Screen>,
    pub status_message: Option<String>,
    pub should_quit: bool,
    redraw: bool,
    /// Set by the store listener when the credential is cleared
    logged_out: Arc<AtomicBool>,
    /// Set by the store listener on any credential change
    session_changed: Arc<AtomicBool>,
    _subscription: Subscription,
    last_refresh_attempt: Option<Instant>,
    last_minutes: Option<i64>,
}

impl App {
    pub fn new(
        config: SharedConfig,
        session: SessionContext,
        auth: Arc<dyn AuthApi>,
        api: Arc<dyn ProjectApi>,
        initial: Route,
    ) -> Self {
        let navigator = Navigator::new();
        let router = Router::new(ScreenContext {
            session: session.clone(),
            auth,
            api,
            navigator: navigator.clone(),
            config,
        });

        let logged_out = Arc::new(AtomicBool::new(false));
        let session_changed = Arc::new(AtomicBool::new(false));
        let subscription = {
            let logged_out = Arc::clone(&logged_out);
            let session_changed = Arc::clone(&session_changed);
            session.subscribe(move |event| {
                session_changed.store(true, Ordering::Release);
                if event == CredentialEvent::Cleared {
                    logged_out.store(true, Ordering::Release);
                }
            })
        };

        let mut screen = router.build(&initial);
        screen.mount();

        let mut app = Self {
            session,
            router,
            navigator,
            route: initial,
            screen,
            status_message: None,
            should_quit: false,
            redraw: true,
            logged_out,
            session_changed,
            _subscription: subscription,
            last_refresh_attempt: None,
            last_minutes: None,
        };
        app.apply_navigation();
        app
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn view(&self) -> ScreenView {
        self.screen.render()
    }

    /// True once after anything visible changed
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    /// Session summary for the status bar
    pub fn session_status(&self) -> String {
        if self.session.is_refreshing() {
            return "Refreshing session".to_string();
        }
        match self.session.minutes_until_expiry() {
            Some(minutes) => format!("Signed in | expires in {}", format_minutes(minutes)),
            None if self.session.has_credential() => "Session expired".to_string(),
            None => "Not signed in".to_string(),
        }
    }

    /// Apply background results, navigation and session changes.
    pub fn tick(&mut self) {
        if self.session_changed.swap(false, Ordering::AcqRel) {
            self.redraw = true;
            if self.session.is_token_valid() {
                self.status_message = None;
            }
        }
        if self.logged_out.swap(false, Ordering::AcqRel) {
            self.status_message = Some("Logged out. Please log in again.".to_string());
        }
        if self.screen.poll() {
            self.redraw = true;
        }
        self.apply_navigation();
        self.maybe_refresh();

        let minutes = self.session.minutes_until_expiry();
        if minutes != self.last_minutes {
            self.last_minutes = minutes;
            self.redraw = true;
        }
    }

    /// Route a key to the screen first, then to the global shortcuts.
    pub fn handle_input(&mut self, input: Input) {
        self.redraw = true;

        if self.screen.captures_text() {
            if input == Input::Esc {
                self.go_back();
            } else {
                self.screen.handle_input(input);
            }
            self.apply_navigation();
            return;
        }

        if self.screen.handle_input(input) == InputOutcome::Handled {
            self.apply_navigation();
            return;
        }

        match input {
            Input::Char('q') => self.should_quit = true,
            Input::Char('?') => self.navigator.navigate(Route::Help),
            Input::Char('g') => self.navigator.navigate(Route::Home),
            Input::Char('p') => self.navigator.navigate(Route::Projects),
            Input::Char('m') => self.navigator.navigate(Route::ProjectManagement),
            Input::Char('L') => self.logout(),
            Input::Esc => self.go_back(),
            _ => {}
        }
        self.apply_navigation();
    }

    fn logout(&mut self) {
        info!("User logged out");
        self.session.logout();
        self.navigator.navigate(Route::Login { return_to: None });
    }

    fn go_back(&mut self) {
        if let Some(parent) = self.route.parent() {
            self.navigator.navigate(parent);
        }
    }

    fn apply_navigation(&mut self) {
        for _ in 0..MAX_REDIRECTS_PER_TICK {
            let Some(route) = self.navigator.take() else {
                return;
            };
            self.go(route);
        }
        if self.navigator.pending().is_some() {
            warn!("Too many redirects in one tick, continuing next tick");
        }
    }

    fn go(&mut self, route: Route) {
        debug!(from = %self.route.path(), to = %route.path(), "Navigating");
        self.screen.unmount();
        self.screen = self.router.build(&route);
        self.route = route;
        self.screen.mount();
        self.redraw = true;
    }

    /// Refresh ahead of expiry so protected screens never see a lapse.
    fn maybe_refresh(&mut self) {
        if !self.session.needs_refresh() || self.session.is_refreshing() {
            return;
        }
        if let Some(last) = self.last_refresh_attempt {
            if last.elapsed() < REFRESH_RETRY_INTERVAL {
                return;
            }
        }
        self.last_refresh_attempt = Some(Instant::now());

        let session = self.session.clone();
        tokio::spawn(async move {
            match session.refresh().await {
                Ok(_) => debug!("Background refresh complete"),
                Err(e) => warn!(error = %e, "Background refresh failed"),
            }
        });
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.screen.unmount();
    }
}
