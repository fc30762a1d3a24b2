//! Route modules for the API server
//!
//! - initiatives: initiative list, detail, creation and transaction edits
//! - settings: configuration and editor metadata

pub mod initiatives;
pub mod settings;
