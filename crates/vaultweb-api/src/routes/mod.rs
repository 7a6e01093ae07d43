//! Route modules for the HTTP server
//!
//! Each module follows the same structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: HTMX endpoints
//! - page.rs: HTML rendering

pub mod vault;
