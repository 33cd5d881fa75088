//! Request gateway boundary.
//!
//! # Responsibility
//! - Resolve HTTP-style verbs and paths to typed survey routes.
//! - Invoke survey services and serialize their results.
//!
//! # Invariants
//! - Literal path segments (`search`, `categories`) take priority over ID
//!   captures by construction; see [`route::resolve_route`].
//! - Every service error maps to exactly one status via [`crate::ErrorKind`].

pub mod dispatch;
pub mod route;

pub use dispatch::{dispatch, ApiRequest, ApiResponse};
pub use route::{resolve_route, Method, Route, RouteError, ROUTE_PREFIX};
