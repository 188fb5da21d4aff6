pub mod rate_limit;
pub mod request_trace;

pub use rate_limit::{
    ClientIpKeyExtractor, RateLimitState, RateLimiter, rate_limit_state, rate_limiter,
};
pub use request_trace::{RequestId, RequestTrace};
