//! Server implementations
//!
//! One server process:
//! - link_server: code verification and account-link authority

pub mod link;
