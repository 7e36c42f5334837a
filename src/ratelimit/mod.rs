// Rate limiting module
// Fixed-window request limiting keyed by caller identifier

mod limiter;

pub use limiter::{RateLimitDecision, RateLimiter};
