//! Subcommands of the `origin` CLI, one module each.

pub mod details;
pub mod list;
pub mod request;

pub use details::run_details;
pub use list::run_list;
pub use request::run_request;
