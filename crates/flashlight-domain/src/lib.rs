//! Domain types and the translation logic that turns a raw upstream response
//! into them: `PlayerPit`, `Account`, `Session`, and session derivation.

mod account;
mod response;
mod session;
mod stats;

pub use account::Account;
pub use response::response_to_domain;
pub use session::{
    compare_pits, derive_sessions, derive_sessions_with_idle_threshold, Session,
    DEFAULT_IDLE_THRESHOLD,
};
pub use stats::{BedwarsModeStats, PlayerPit, DEFAULT_EXPERIENCE};
