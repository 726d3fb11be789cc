//! Request handlers.

pub mod api;
pub mod pages;
mod upload;

pub use upload::read_upload;
