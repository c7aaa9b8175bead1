//! # tollgate
//!
//! A small HTTP router with typed request binding and a composable
//! middleware pipeline, for JSON APIs that sit behind a reverse proxy.
//!
//! ## What it does
//!
//! - Routing on `/`-separated patterns with `{name}` wildcards. When two
//!   patterns match, the one with more literal segments wins, then the one
//!   declared first.
//! - Parameter collection: JSON body, then path wildcards, then query string,
//!   later sources overriding earlier ones.
//! - Typed binding through [`FromParams`], with lenient string-to-number
//!   coercion.
//! - Middleware: [`Recovery`](middleware::Recovery),
//!   [`Trace`](middleware::Trace), [`Cors`](middleware::Cors),
//!   [`Authenticate`](middleware::Authenticate) and [`Rbac`](middleware::Rbac).
//! - One JSON [`Envelope`] for every response, success or failure.
//! - Graceful shutdown on SIGTERM / Ctrl-C.
//!
//! TLS, rate limiting and body-size limits are left to the proxy.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serde::Serialize;
//! use tollgate::{ApiError, App, Context, FromParams, Method, Params, Router, Server};
//! use tollgate::middleware::{Pipeline, Recovery, Trace};
//!
//! struct GetUser { id: i64 }
//!
//! impl FromParams for GetUser {
//!     fn from_params(params: &Params) -> Result<Self, ApiError> {
//!         Ok(Self { id: params.field("id")? })
//!     }
//! }
//!
//! #[derive(Serialize)]
//! struct User { id: i64, name: String }
//!
//! async fn get_user(_ctx: Context, req: GetUser) -> Result<User, ApiError> {
//!     Ok(User { id: req.id, name: "dat".into() })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tollgate::Error> {
//!     let router = Router::new().on(Method::Get, "/users/{id}", get_user);
//!     let app = App::new(router, Pipeline::new().layer(Recovery::new()).layer(Trace::new()))?;
//!
//!     Server::bind("0.0.0.0:3000").await?.serve(app).await
//! }
//! ```

mod app;
mod auth;
mod bind;
mod error;
mod method;
mod params;
mod request;
mod response;
mod router;
mod server;
mod table;

pub mod config;
pub mod handler;
pub mod middleware;
pub mod path;
pub mod token;

pub use app::App;
pub use auth::{AuthContext, Authenticator, TokenError};
pub use bind::{FieldValue, FromParams};
pub use error::{ApiError, Error, ErrorKind};
pub use handler::{Context, Handler};
pub use method::{Method, UnknownMethod};
pub use params::Params;
pub use path::{Pattern, PatternError, Wildcards};
pub use request::{PeerAddr, Request};
pub use response::{Envelope, IntoResponse, Response};
pub use router::{MatchedRoute, RouteError, Router};
pub use server::Server;
