//! In-memory directory of backers, merchants and capability grants

use serde::{Deserialize, Serialize};

use crate::models::{Backer, Merchant};
use crate::query::{BackerQuery, MerchantQuery};
use crate::types::{Capability, Phid, Viewer};

/// Capabilities granted on one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    /// Grantee; `None` grants to every viewer
    #[serde(default)]
    pub viewer: Option<Phid>,
    pub object: Phid,
    pub capabilities: Vec<Capability>,
}

impl Grant {
    fn applies_to(&self, viewer: &Viewer, object: &Phid) -> bool {
        &self.object == object
            && self.viewer.as_ref().map_or(true, |grantee| grantee == &viewer.phid)
    }
}

/// Backers, merchants and who may do what with them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub backers: Vec<Backer>,
    #[serde(default)]
    pub merchants: Vec<Merchant>,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_backer(&mut self, backer: Backer) -> &mut Self {
        self.backers.push(backer);
        self
    }

    pub fn add_merchant(&mut self, merchant: Merchant) -> &mut Self {
        self.merchants.push(merchant);
        self
    }

    pub fn grant(&mut self, viewer: Option<Phid>, object: Phid, capabilities: &[Capability]) -> &mut Self {
        self.grants.push(Grant {
            viewer,
            object,
            capabilities: capabilities.to_vec(),
        });
        self
    }

    /// Whether `viewer` holds `capability` on `object`
    pub fn has_capability(&self, viewer: &Viewer, object: &Phid, capability: Capability) -> bool {
        viewer.omnipotent
            || self
                .grants
                .iter()
                .filter(|g| g.applies_to(viewer, object))
                .any(|g| g.capabilities.contains(&capability))
    }

    fn has_all(&self, viewer: &Viewer, object: &Phid, capabilities: &[Capability]) -> bool {
        capabilities
            .iter()
            .all(|cap| self.has_capability(viewer, object, *cap))
    }
}

impl BackerQuery for Directory {
    fn load_backers(&self, viewer: &Viewer, phids: &[Phid]) -> Vec<Backer> {
        self.backers
            .iter()
            .filter(|b| phids.contains(&b.phid))
            .filter(|b| self.has_capability(viewer, &b.phid, Capability::View))
            .cloned()
            .collect()
    }
}

impl MerchantQuery for Directory {
    fn load_merchants(
        &self,
        viewer: &Viewer,
        phids: &[Phid],
        capabilities: &[Capability],
    ) -> Vec<Merchant> {
        self.merchants
            .iter()
            .filter(|m| phids.contains(&m.phid))
            .filter(|m| self.has_capability(viewer, &m.phid, Capability::View))
            .filter(|m| self.has_all(viewer, &m.phid, capabilities))
            .cloned()
            .collect()
    }
}
