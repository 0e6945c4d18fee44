//! Extension points that sit beside the OAuth flows.

pub mod rate_limit;

pub use rate_limit::*;
