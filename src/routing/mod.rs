//! The router collaborator contract.
//!
//! The localization core sits on top of a generic router; this module
//! carries exactly the surface the core consumes: route representation
//! with defaults and parameter constraints, a registration table, lookup by
//! name, (method, URL) matching and URL rendering, plus the process-wide
//! route-match cache.

mod cache;
mod route;
mod table;

pub use cache::RouteMatchCache;
pub use route::{route_key, Constraint, Method, Route};
pub use table::{MatchedRoute, RouteTable};
