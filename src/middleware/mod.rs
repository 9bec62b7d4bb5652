pub mod auth;
pub mod rate_limit;
pub mod recover;

pub use auth::AuthCtx;
pub use rate_limit::Throttle;
pub use recover::CatchPanic;
