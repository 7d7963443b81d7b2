//! Rate limiting for the Hypixel and Mojang upstream clients and the HTTP
//! admission gates.
//!
//! Three pieces:
//!
//! - [`TokenBucket`]: non-blocking per-key `consume`, used at the IP and
//!   user-id gates in front of the HTTP handlers.
//! - [`WindowLimiter`]: an `N`-per-window-`W` admission limiter with forced
//!   per-call pacing, used in front of the upstream clients.
//! - [`ComposedLimiter`]: chains several `WindowLimiter`s so a call is
//!   admitted only if every layer admits it.

mod composed;
mod events;
mod keys;
mod token_bucket;
mod window;

pub use composed::ComposedLimiter;
pub use events::RateLimiterEvent;
pub use keys::{ip_key, user_id_key};
pub use token_bucket::TokenBucket;
pub use window::WindowLimiter;
