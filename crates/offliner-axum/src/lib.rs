//! The HTTP Edge (spec §6): the only externally-reachable surface of the
//! service. Accepts `POST /download`, streams progress over
//! `GET /stream_progress/{request_id}`, and serves the finished artifact
//! from `GET /download_file/{request_id}`. Talks to the rest of the system
//! only through the [`state::JobService`] seam — broker, progress store and
//! quota tracker are named solely by [`bootstrap`].

pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use bootstrap::{bootstrap, start_server, AxumContext, CorsConfig, ServerConfig};
pub use error::HttpError;
pub use routes::create_router;
pub use state::{AppState, JobService};
