pub mod manager;
pub mod session;

pub use manager::SessionManager;
pub use session::{SessionActor, SessionArguments, SessionMsg};
