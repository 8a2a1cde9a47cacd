use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use super::{CredentialEvent, SessionContext, Subscription};
use crate::router::{Navigator, Route};
use crate::view::{Input, InputOutcome, Screen, ScreenView};

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect { return_to: String },
}

/// Wraps a protected screen and only lets it mount, poll, render or take
/// input while the session is valid.
///
/// Validity is re-checked on every call. While the child is mounted, a
/// store subscription flags a logout immediately, so the next `poll` tears
/// the child down without waiting for the clock.
pub struct Authenticated<S> {
    child: S,
    session: SessionContext,
    navigator: Navigator,
    requested: Route,
    child_mounted: bool,
    revoked: Arc<AtomicBool>,
    subscription: Option<Subscription>,
}

impl<S: Screen> Authenticated<S> {
    pub fn new(child: S, session: SessionContext, navigator: Navigator, requested: Route) -> Self {
        Self {
            child,
            session,
            navigator,
            requested,
            child_mounted: false,
            revoked: Arc::new(AtomicBool::new(false)),
            subscription: None,
        }
    }

    pub fn evaluate(&self) -> Access {
        if self.session.is_token_valid() {
            Access::Granted
        } else {
            Access::Redirect {
                return_to: self.requested.path(),
            }
        }
    }

    pub fn child(&self) -> &S {
        &self.child
    }

    pub fn is_child_mounted(&self) -> bool {
        self.child_mounted
    }

    fn login_route(&self) -> Route {
        Route::Login {
            return_to: Some(self.requested.path()),
        }
    }

    fn redirect(&self) {
        self.navigator.navigate(self.login_route());
    }

    fn release_child(&mut self) {
        if self.child_mounted {
            self.child.unmount();
            self.child_mounted = false;
        }
        self.subscription = None;
    }
}

impl<S: Screen> Screen for Authenticated<S> {
    fn mount(&mut self) {
        if let Access::Redirect { return_to } = self.evaluate() {
            info!(path = %return_to, "Protected route requested without a valid session");
            self.redirect();
            return;
        }

        self.revoked.store(false, Ordering::Release);
        let revoked = Arc::clone(&self.revoked);
        let navigator = self.navigator.clone();
        let login = self.login_route();
        self.subscription = Some(self.session.subscribe(move |event| {
            if event == CredentialEvent::Cleared {
                revoked.store(true, Ordering::Release);
                navigator.navigate(login.clone());
            }
        }));

        self.child.mount();
        self.child_mounted = true;
    }

    fn poll(&mut self) -> bool {
        if !self.child_mounted {
            return false;
        }
        if self.revoked.load(Ordering::Acquire) || !self.session.is_token_valid() {
            info!(path = %self.requested.path(), "Session no longer valid, leaving protected screen");
            self.release_child();
            self.redirect();
            return true;
        }
        self.child.poll()
    }

    fn render(&self) -> ScreenView {
        match self.evaluate() {
            Access::Granted if self.child_mounted => self.child.render(),
            Access::Granted => ScreenView::blank(),
            Access::Redirect { .. } => {
                self.redirect();
                ScreenView::blank()
            }
        }
    }

    fn handle_input(&mut self, input: Input) -> InputOutcome {
        if self.child_mounted && self.session.is_token_valid() {
            self.child.handle_input(input)
        } else {
            InputOutcome::Ignored
        }
    }

    fn unmount(&mut self) {
        self.release_child();
    }

    fn captures_text(&self) -> bool {
        self.child_mounted && self.child.captures_text()
    }
}
