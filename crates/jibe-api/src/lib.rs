pub mod convert;
pub mod error;
pub mod input;
pub mod insults;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod submitters;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
