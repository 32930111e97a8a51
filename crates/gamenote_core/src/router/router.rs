//! Fragment router with auth guards.
//!
//! # Responsibility
//! - Resolve the current location fragment against the route table.
//! - Apply guard policy against the signed-in user and settle redirects.
//! - Mount exactly one view per settled navigation and notify subscribers.
//!
//! # Invariants
//! - Unregistered paths never render; they settle on `/dashboard` (user) or
//!   `/login` (no user).
//! - Redirects loop inside `handle_route`; at most `MAX_REDIRECTS` hops are
//!   taken before the error view is mounted.
//! - A navigation requested by a render hook supersedes the pass that
//!   requested it: the superseded pass emits no route-change notification.
//! - Handler failures are caught here and nowhere else.

use super::fragment::{fragment_for, Fragment, QueryParams};
use super::route::{Markup, RenderError, RouteContext, RouteError, RouteOptions, RouteTable};
use crate::listeners::{Listeners, SubscriptionId};
use crate::model::user::UserRef;
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
/// Upper bound on redirects settled by one `handle_route` call.
pub const MAX_REDIRECTS: usize = 8;
/// Generic view mounted when a render fails. Its only action is `reload`.
pub const ERROR_VIEW: &str = "Ops! Algo deu errado ao carregar esta página.\n[Recarregar](action:reload)";

/// Output target for rendered views.
pub trait MountSink {
    /// Replaces whatever is currently mounted with `markup`.
    fn mount(&mut self, markup: &Markup);
}

/// Sink that records every mount; clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    mounted: Rc<RefCell<Vec<Markup>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently mounted view.
    pub fn current(&self) -> Option<Markup> {
        self.mounted.borrow().last().cloned()
    }

    pub fn mount_count(&self) -> usize {
        self.mounted.borrow().len()
    }
}

impl MountSink for MemorySink {
    fn mount(&mut self, markup: &Markup) {
        self.mounted.borrow_mut().push(markup.clone());
    }
}

/// Notification broadcast once per settled, successfully rendered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub path: String,
    pub user: Option<UserRef>,
}

/// How a `handle_route` call settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    Rendered,
    /// The handler failed; the error view is mounted.
    Failed(RenderError),
    /// Redirect budget exhausted; the error view is mounted.
    RedirectLoop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Path the navigation settled on.
    pub path: String,
    /// Redirect hops taken, including hook-requested navigations.
    pub redirects: usize,
    pub status: RenderStatus,
}

impl RouteOutcome {
    pub fn is_rendered(&self) -> bool {
        self.status == RenderStatus::Rendered
    }
}

enum Access {
    Render,
    Redirect(&'static str, &'static str),
}

/// Explicitly constructed router instance.
pub struct Router {
    routes: RouteTable,
    location: String,
    current_path: Option<String>,
    current_user: Option<UserRef>,
    sink: Box<dyn MountSink>,
    listeners: Listeners<RouteChange>,
}

impl Router {
    pub fn new(sink: impl MountSink + 'static) -> Self {
        Self {
            routes: RouteTable::new(),
            location: String::new(),
            current_path: None,
            current_user: None,
            sink: Box::new(sink),
            listeners: Listeners::new(),
        }
    }

    /// See [`RouteTable::register`].
    pub fn register(
        &mut self,
        path: impl Into<String>,
        handler: impl Fn(&RouteContext) -> Result<Markup, RenderError> + 'static,
        options: RouteOptions,
    ) -> Result<(), RouteError> {
        self.routes.register(path, handler, options)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Current location fragment, e.g. `#/editor?id=1`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Path of the last rendered route.
    pub fn current_path(&self) -> Option<&str> {
        self.current_path.as_deref()
    }

    pub fn current_user(&self) -> Option<&UserRef> {
        self.current_user.as_ref()
    }

    /// Query parameters of the current location.
    pub fn query_params(&self) -> QueryParams {
        Fragment::parse(&self.location).query
    }

    pub fn subscribe(&mut self, listener: impl Fn(&RouteChange) + 'static) -> SubscriptionId {
        self.listeners.add(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    /// Updates the signed-in user and re-evaluates the current location.
    pub fn set_user(&mut self, user: Option<UserRef>) -> RouteOutcome {
        info!(
            "event=route_user_change module=router status=ok signed_in={}",
            user.is_some()
        );
        self.current_user = user;
        self.handle_route()
    }

    /// Host navigation signal: the location fragment changed.
    pub fn hash_changed(&mut self, fragment: impl Into<String>) -> RouteOutcome {
        self.location = fragment.into();
        self.handle_route()
    }

    /// Navigates to `path` (may include a query string).
    pub fn navigate(&mut self, path: &str) -> RouteOutcome {
        self.hash_changed(fragment_for(path))
    }

    /// Resolves the current location and renders until it settles.
    pub fn handle_route(&mut self) -> RouteOutcome {
        let mut redirects = 0usize;
        loop {
            let fragment = Fragment::parse(&self.location);

            if let Access::Redirect(target, reason) = self.check_access(&fragment.path) {
                debug!(
                    "event=route_redirect module=router from={} to={target} reason={reason}",
                    fragment.path
                );
                match self.redirect(target, &mut redirects) {
                    Some(outcome) => return outcome,
                    None => continue,
                }
            }

            let Some(route) = self.routes.get(&fragment.path) else {
                match self.redirect(self.default_path(), &mut redirects) {
                    Some(outcome) => return outcome,
                    None => continue,
                }
            };
            self.current_path = Some(fragment.path.clone());
            let mut ctx =
                RouteContext::new(fragment.path.as_str(), fragment.query, self.current_user.clone());

            match (route.handler)(&ctx) {
                Ok(markup) => self.sink.mount(&markup),
                Err(err) => {
                    error!(
                        "event=route_render module=router status=error path={} error={err}",
                        fragment.path
                    );
                    self.sink.mount(&Markup::from(ERROR_VIEW));
                    return RouteOutcome {
                        path: fragment.path,
                        redirects,
                        status: RenderStatus::Failed(err),
                    };
                }
            }

            if let Some(hook) = route.options.on_render.as_ref() {
                hook(&mut ctx);
            }
            if let Some(next) = ctx.take_pending_navigation() {
                debug!(
                    "event=route_redirect module=router from={} to={next} reason=hook",
                    fragment.path
                );
                match self.redirect(&next, &mut redirects) {
                    Some(outcome) => return outcome,
                    None => continue,
                }
            }

            debug!(
                "event=route_render module=router status=ok path={} redirects={redirects}",
                fragment.path
            );
            self.listeners.notify(&RouteChange {
                path: fragment.path.clone(),
                user: self.current_user.clone(),
            });
            return RouteOutcome {
                path: fragment.path,
                redirects,
                status: RenderStatus::Rendered,
            };
        }
    }

    /// Where unmatched paths settle for the current auth state.
    fn default_path(&self) -> &'static str {
        if self.current_user.is_some() {
            DASHBOARD_PATH
        } else {
            LOGIN_PATH
        }
    }

    fn check_access(&self, path: &str) -> Access {
        let signed_in = self.current_user.is_some();
        let Some(route) = self.routes.get(path) else {
            return Access::Redirect(self.default_path(), "unmatched");
        };
        if route.options.requires_auth && !signed_in {
            return Access::Redirect(LOGIN_PATH, "requires_auth");
        }
        if route.options.auth_only && signed_in {
            return Access::Redirect(DASHBOARD_PATH, "auth_only");
        }
        Access::Render
    }

    /// Moves the location to `target`. Returns the final outcome when the
    /// redirect budget is exhausted.
    fn redirect(&mut self, target: &str, redirects: &mut usize) -> Option<RouteOutcome> {
        *redirects += 1;
        self.location = fragment_for(target);
        if *redirects <= MAX_REDIRECTS {
            return None;
        }

        let path = Fragment::parse(&self.location).path;
        warn!(
            "event=route_redirect_loop module=router status=error last_path={path} redirects={}",
            *redirects
        );
        self.sink.mount(&Markup::from(ERROR_VIEW));
        Some(RouteOutcome {
            path,
            redirects: *redirects,
            status: RenderStatus::RedirectLoop,
        })
    }
}
