mod account;
mod history;
mod playerdata;
mod sessions;

pub use account::{get_account_by_uuid, get_account_by_username};
pub use history::post_history;
pub use playerdata::get_playerdata;
pub use sessions::post_sessions;
