//! Route table: exact path -> (handler, guard options, post-render hook).
//!
//! # Invariants
//! - Keys are exact path strings; there is no pattern matching.
//! - Re-registering a path replaces the previous route.
//! - A route can never be both `requires_auth` and `auth_only`.

use super::fragment::QueryParams;
use crate::model::user::UserRef;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rendered view, mounted as-is into the root sink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Markup {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Markup {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for Markup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unexpected failure while producing a view. Caught by the router, which
/// mounts the generic error view instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "render failed: {}", self.message)
    }
}

impl Error for RenderError {}

/// State handed to handlers and hooks for one render pass.
///
/// Hooks use [`RouteContext::navigate`] instead of holding the router; the
/// router applies the request once the hook returns.
#[derive(Debug, Clone)]
pub struct RouteContext {
    path: String,
    params: QueryParams,
    user: Option<UserRef>,
    pending_navigation: Option<String>,
}

impl RouteContext {
    pub fn new(path: impl Into<String>, params: QueryParams, user: Option<UserRef>) -> Self {
        Self {
            path: path.into(),
            params,
            user,
            pending_navigation: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn user(&self) -> Option<&UserRef> {
        self.user.as_ref()
    }

    /// Requests navigation to `path` (may carry a query string). The last
    /// request made during a pass wins.
    pub fn navigate(&mut self, path: impl Into<String>) {
        self.pending_navigation = Some(path.into());
    }

    pub fn pending_navigation(&self) -> Option<&str> {
        self.pending_navigation.as_deref()
    }

    pub(crate) fn take_pending_navigation(&mut self) -> Option<String> {
        self.pending_navigation.take()
    }
}

pub type Handler = Box<dyn Fn(&RouteContext) -> Result<Markup, RenderError>>;
pub type RenderHook = Box<dyn Fn(&mut RouteContext)>;

/// Access policy and post-render hook for a route.
#[derive(Default)]
pub struct RouteOptions {
    /// Accessible only with a signed-in user.
    pub requires_auth: bool,
    /// Accessible only without a signed-in user.
    pub auth_only: bool,
    /// Runs after the markup is mounted.
    pub on_render: Option<RenderHook>,
}

impl RouteOptions {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn requires_auth() -> Self {
        Self {
            requires_auth: true,
            ..Self::default()
        }
    }

    pub fn auth_only() -> Self {
        Self {
            auth_only: true,
            ..Self::default()
        }
    }

    pub fn on_render(mut self, hook: impl Fn(&mut RouteContext) + 'static) -> Self {
        self.on_render = Some(Box::new(hook));
        self
    }
}

/// Registered route.
pub struct Route {
    pub path: String,
    pub handler: Handler,
    pub options: RouteOptions,
}

/// Registration errors. These are developer mistakes, reported eagerly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Route flagged both `requires_auth` and `auth_only`; it could never
    /// render and would redirect forever.
    ConflictingGuards { path: String },
    /// Path does not start with `/` or contains a query string.
    InvalidPath(String),
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConflictingGuards { path } => write!(
                f,
                "route `{path}` cannot be both requires_auth and auth_only"
            ),
            Self::InvalidPath(path) => write!(f, "invalid route path `{path}`"),
        }
    }
}

impl Error for RouteError {}

/// Exact-match route table.
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        path: impl Into<String>,
        handler: impl Fn(&RouteContext) -> Result<Markup, RenderError> + 'static,
        options: RouteOptions,
    ) -> Result<(), RouteError> {
        let path = path.into();
        if !path.starts_with('/') || path.contains('?') {
            return Err(RouteError::InvalidPath(path));
        }
        if options.requires_auth && options.auth_only {
            return Err(RouteError::ConflictingGuards { path });
        }

        self.routes.insert(
            path.clone(),
            Route {
                path,
                handler: Box::new(handler),
                options,
            },
        );
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Markup, RouteError, RouteOptions, RouteTable};

    #[test]
    fn conflicting_guards_are_rejected_at_registration() {
        let mut table = RouteTable::new();
        let options = RouteOptions {
            requires_auth: true,
            auth_only: true,
            on_render: None,
        };
        let err = table
            .register("/broken", |_| Ok(Markup::from("x")), options)
            .expect_err("conflicting guards must be rejected");
        assert_eq!(
            err,
            RouteError::ConflictingGuards {
                path: "/broken".to_string()
            }
        );
        assert!(!table.contains("/broken"));
    }

    #[test]
    fn reregistering_overwrites_silently() {
        let mut table = RouteTable::new();
        table
            .register("/a", |_| Ok(Markup::from("first")), RouteOptions::public())
            .expect("first registration");
        table
            .register("/a", |_| Ok(Markup::from("second")), RouteOptions::auth_only())
            .expect("second registration");

        assert_eq!(table.len(), 1);
        let route = table.get("/a").expect("route exists");
        assert!(route.options.auth_only);
    }

    #[test]
    fn paths_must_be_absolute_without_query() {
        let mut table = RouteTable::new();
        assert!(matches!(
            table.register("editor", |_| Ok(Markup::default()), RouteOptions::public()),
            Err(RouteError::InvalidPath(_))
        ));
        assert!(matches!(
            table.register("/editor?id=1", |_| Ok(Markup::default()), RouteOptions::public()),
            Err(RouteError::InvalidPath(_))
        ));
    }
}
