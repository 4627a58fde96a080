//! # Route Gate
//!
//! Decides what a protected surface shows for a given [`Session`]:
//!
//! | `loading` | `is_authenticated` | Outcome |
//! |-----------|--------------------|---------|
//! | `true`    | any                | loading placeholder |
//! | `false`   | `false`            | redirect to the login route |
//! | `false`   | `true`             | the protected content |
//!
//! [`evaluate`] is the pure decision. [`RouteGate`] adds the one side effect: issuing the
//! redirect through a [`Navigator`], once per entry into the unauthenticated state.
//!
//! The login surface is gated the other way round by [`GuestGate`]: a visitor who is
//! already signed in is sent on to the dashboard, keeping any pending `createNew` URL.

use crate::framework::FrameworkError;
use crate::model::LinkId;
use crate::session::{Session, SessionWatch};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Navigation targets of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    /// Login/sign-up surface. `create_new` carries a long URL to shorten after signing in.
    Auth { create_new: Option<String> },
    Dashboard { create_new: Option<String> },
    Link(LinkId),
}

impl Route {
    /// The route unauthenticated visitors are sent to.
    pub fn login() -> Self {
        Self::Auth { create_new: None }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Landing => "/".to_string(),
            Self::Auth { create_new } => with_create_new("/auth", create_new.as_deref()),
            Self::Dashboard { create_new } => with_create_new("/dashboard", create_new.as_deref()),
            Self::Link(id) => format!("/link/{}", urlencoding::encode(&id.0)),
        }
    }

    /// Parses a path produced by [`path`](Self::path). Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let create_new = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "createNew")
            .and_then(|(_, value)| urlencoding::decode(value).ok())
            .map(Cow::into_owned);

        match path.trim_end_matches('/') {
            "" => Some(Self::Landing),
            "/auth" => Some(Self::Auth { create_new }),
            "/dashboard" => Some(Self::Dashboard { create_new }),
            other => {
                let id = other.strip_prefix("/link/")?;
                let id = urlencoding::decode(id).ok()?;
                (!id.is_empty() && !id.contains('/')).then(|| Self::Link(LinkId(id.into_owned())))
            }
        }
    }
}

fn with_create_new(base: &str, create_new: Option<&str>) -> String {
    match create_new {
        Some(url) => format!("{base}?createNew={}", urlencoding::encode(url)),
        None => base.to_string(),
    }
}

/// Performs navigation on behalf of the core.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// A [`Navigator`] that records every navigation in order.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    pub fn current(&self) -> Option<Route> {
        self.history
            .lock()
            .ok()
            .and_then(|history| history.last().cloned())
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: &Route) {
        info!(path = %route.path(), "Navigate");
        if let Ok(mut history) = self.history.lock() {
            history.push(route.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Placeholder,
    Redirect(Route),
    Render,
}

/// Pure gate decision for `session`.
pub fn evaluate(session: &Session, login: &Route) -> GateDecision {
    if session.loading {
        GateDecision::Placeholder
    } else if !session.is_authenticated {
        GateDecision::Redirect(login.clone())
    } else {
        GateDecision::Render
    }
}

/// Pure decision for the guest-only login surface. The form stays visible while the
/// session loads.
pub fn evaluate_guest(session: &Session, create_new: Option<&str>) -> GateDecision {
    if !session.loading && session.is_authenticated {
        GateDecision::Redirect(Route::Dashboard {
            create_new: create_new.map(str::to_string),
        })
    } else {
        GateDecision::Render
    }
}

fn redirect_once(navigator: &dyn Navigator, redirected: &AtomicBool, route: &Route) {
    if !redirected.swap(true, Ordering::SeqCst) {
        navigator.navigate(route);
    } else {
        debug!(path = %route.path(), "Redirect already issued");
    }
}

/// What a gated surface renders.
#[derive(Debug, Clone, PartialEq)]
pub enum Gated<V> {
    Placeholder,
    Redirected(Route),
    Content(V),
}

impl<V> Gated<V> {
    pub fn content(self) -> Option<V> {
        match self {
            Self::Content(content) => Some(content),
            _ => None,
        }
    }
}

/// Wraps protected content and owns the redirect side effect.
pub struct RouteGate {
    navigator: Arc<dyn Navigator>,
    login: Route,
    redirected: AtomicBool,
}

impl RouteGate {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self::with_login(navigator, Route::login())
    }

    pub fn with_login(navigator: Arc<dyn Navigator>, login: Route) -> Self {
        Self {
            navigator,
            login,
            redirected: AtomicBool::new(false),
        }
    }

    /// Evaluates the gate for `session`. `content` is only built when the session is
    /// authenticated.
    ///
    /// Evaluating an unauthenticated session repeatedly navigates once; the next
    /// redirect is issued only after the decision has changed in between.
    pub fn render<V>(&self, session: &Session, content: impl FnOnce() -> V) -> Gated<V> {
        match evaluate(session, &self.login) {
            GateDecision::Placeholder => {
                self.redirected.store(false, Ordering::SeqCst);
                Gated::Placeholder
            }
            GateDecision::Redirect(route) => {
                redirect_once(self.navigator.as_ref(), &self.redirected, &route);
                Gated::Redirected(route)
            }
            GateDecision::Render => {
                self.redirected.store(false, Ordering::SeqCst);
                Gated::Content(content())
            }
        }
    }

    /// Follows `watch` until the gate leaves the placeholder, then renders.
    pub async fn guard<V>(
        &self,
        watch: &mut SessionWatch,
        content: impl FnOnce() -> V,
    ) -> Result<Gated<V>, FrameworkError> {
        let mut session = watch.current();
        while session.loading {
            self.redirected.store(false, Ordering::SeqCst);
            session = watch.changed().await?;
        }
        Ok(self.render(&session, content))
    }
}

/// Keeps signed-in visitors off the login surface.
pub struct GuestGate {
    navigator: Arc<dyn Navigator>,
    redirected: AtomicBool,
}

impl GuestGate {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            redirected: AtomicBool::new(false),
        }
    }

    /// Renders the login surface reached with `create_new`, or redirects an
    /// authenticated visitor to the dashboard once per entry into that state.
    pub fn render<V>(
        &self,
        session: &Session,
        create_new: Option<&str>,
        form: impl FnOnce() -> V,
    ) -> Gated<V> {
        match evaluate_guest(session, create_new) {
            GateDecision::Redirect(route) => {
                redirect_once(self.navigator.as_ref(), &self.redirected, &route);
                Gated::Redirected(route)
            }
            _ => {
                self.redirected.store(false, Ordering::SeqCst);
                Gated::Content(form())
            }
        }
    }
}
