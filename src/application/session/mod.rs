pub mod store;

pub use store::{SessionState, SessionStore, DEFAULT_SESSION_KEY};
