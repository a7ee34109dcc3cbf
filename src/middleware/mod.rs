pub mod login_limiter;

pub use login_limiter::{LoginRateLimiter, LOGIN_ATTEMPT_LIMIT, LOGIN_WINDOW};
