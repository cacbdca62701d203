//! Client state and REST bindings for the HomeFit apartment marketplace.

pub mod api;
pub mod card;
pub mod config;
pub mod dialogs;
pub mod error;
pub mod filters;
pub mod guard;
pub mod listings;
pub mod matches;
pub mod models;
pub mod moderation;
pub mod session;

pub use api::{Backend, HttpBackend};
pub use config::Config;
pub use error::{ClientError, Result};
pub use matches::MatchView;
pub use session::{IdentityStore, SessionEvent, SessionState};
