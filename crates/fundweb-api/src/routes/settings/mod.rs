//! Settings routes - configuration and editor metadata

pub mod api;

pub use api::{api_editor, api_settings};
