/// Logger
pub mod logger;
/// Request pacing
pub mod rate_limit;
