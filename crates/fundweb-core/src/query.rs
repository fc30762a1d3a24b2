//! Lookup interfaces the editor depends on
//!
//! Both lookups are scoped to a viewer: an object the viewer cannot see is
//! indistinguishable from one that does not exist.

use crate::models::{Backer, Merchant};
use crate::types::{Capability, Phid, Viewer};

/// Loads backers visible to a viewer
pub trait BackerQuery {
    fn load_backers(&self, viewer: &Viewer, phids: &[Phid]) -> Vec<Backer>;

    fn load_backer(&self, viewer: &Viewer, phid: &Phid) -> Option<Backer> {
        self.load_backers(viewer, std::slice::from_ref(phid)).into_iter().next()
    }
}

/// Loads merchants on which a viewer holds every requested capability
pub trait MerchantQuery {
    fn load_merchants(
        &self,
        viewer: &Viewer,
        phids: &[Phid],
        capabilities: &[Capability],
    ) -> Vec<Merchant>;
}
