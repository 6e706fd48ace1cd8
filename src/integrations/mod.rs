//! External service integrations
//!
//! Clients for the agent analytics backend and the token swap service.

pub mod cookie;
pub mod swap;

pub use cookie::{Agent, BackendClient, Tweet};
pub use swap::{SwapClient, SwapReceipt, SwapRequest};
