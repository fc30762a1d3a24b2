//! Initiative routes
//!
//! Structure:
//! - api.rs: JSON API endpoints

pub mod api;

pub use api::{
    api_initiative_create,
    api_initiative_detail,
    api_initiative_edit,
    api_initiative_transactions,
    api_initiatives,
};
