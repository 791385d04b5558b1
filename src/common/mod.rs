mod state;

pub use state::{AppState, SessionStore};
