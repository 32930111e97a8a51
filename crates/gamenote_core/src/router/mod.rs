//! Fragment-based navigation.
//!
//! # Responsibility
//! - Parse location fragments into a path and query parameters.
//! - Hold the exact-match route table with auth-guard options.
//! - Drive the render/redirect state machine for one root sink.
//!
//! # See also
//! - `crate::app` for the application's route registrations.

pub mod fragment;
pub mod route;
#[allow(clippy::module_inception)]
mod router;

pub use fragment::{fragment_for, Fragment, QueryParams};
pub use route::{Markup, RenderError, RouteContext, RouteError, RouteOptions, RouteTable};
pub use router::{
    MemorySink, MountSink, RenderStatus, RouteChange, RouteOutcome, Router, DASHBOARD_PATH,
    ERROR_VIEW, LOGIN_PATH, MAX_REDIRECTS,
};
