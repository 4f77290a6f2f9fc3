//! Client for the campus events service.
//!
//! Two pieces carry the session: [`pipeline::ApiClient`] sends every REST
//! call, forwarding the CSRF cookie and recovering from expired access tokens
//! with one shared refresh; [`realtime::RealtimeChannel`] holds the
//! notification socket open and fans pushed notifications out over a
//! [`realtime::bus::NotificationBus`]. [`api`] wraps the server's resources
//! on top of the pipeline.

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod realtime;
pub mod session;
pub mod types;

pub use config::ClientConfig;
pub use error::{ApiError, RealtimeError, RefreshError, SessionError};
pub use pipeline::{ApiClient, ApiRequest, ApiResponse};
pub use realtime::{ChannelHandle, RealtimeChannel, RealtimeOptions};
pub use session::SessionCookies;
pub use types::{Notification, NotificationCount, NotificationKind, Page};
