//! In-memory store of initiatives and their transaction logs
//!
//! The store is seeded from a JSON file:
//!
//! ```json
//! {
//!   "initiatives": [...],
//!   "backers": [...],
//!   "merchants": [...],
//!   "grants": [...]
//! }
//! ```
//!
//! Edits go through [`InitiativeEditor`]; an initiative and its log only
//! change when the whole batch succeeds.

use fundweb_config::Config;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::directory::Directory;
use crate::editor::InitiativeEditor;
use crate::engine::apply_transactions;
use crate::error::{CoreError, CoreResult};
use crate::models::{Initiative, Transaction};
use crate::types::{phid_type, Phid, Viewer};

/// On-disk seed layout
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FundSeed {
    #[serde(default)]
    pub initiatives: Vec<Initiative>,
    #[serde(flatten)]
    pub directory: Directory,
}

impl FundSeed {
    /// Check that every identifier carries the object type its field expects
    pub fn validate(&self) -> CoreResult<()> {
        for initiative in &self.initiatives {
            expect_type("initiative", &initiative.phid, phid_type::INITIATIVE)?;
            expect_type("initiative owner", &initiative.owner_phid, phid_type::USER)?;
            if let Some(merchant) = &initiative.merchant_phid {
                expect_type("initiative merchant", merchant, phid_type::MERCHANT)?;
            }
        }
        for backer in &self.directory.backers {
            expect_type("backer", &backer.phid, phid_type::BACKER)?;
            expect_type("backer initiative", &backer.initiative_phid, phid_type::INITIATIVE)?;
            expect_type("backer user", &backer.backer_phid, phid_type::USER)?;
        }
        for merchant in &self.directory.merchants {
            expect_type("merchant", &merchant.phid, phid_type::MERCHANT)?;
        }
        Ok(())
    }
}

fn expect_type(field: &str, phid: &Phid, expected: &str) -> CoreResult<()> {
    if phid.phid_type() == Some(expected) {
        return Ok(());
    }
    Err(CoreError::ParseError {
        message: format!("{} '{}' is not a {} identifier", field, phid, expected),
    })
}

/// Counts for the summary endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSummary {
    pub total_initiatives: usize,
    pub open_initiatives: usize,
    pub total_transactions: usize,
    pub total_backers: usize,
}

pub struct FundStore {
    default_currency: String,
    initiatives: BTreeMap<Phid, Initiative>,
    transactions: HashMap<Phid, Vec<Transaction>>,
    directory: Directory,
    source: Option<PathBuf>,
}

impl FundStore {
    pub fn new(config: &Config) -> Self {
        Self {
            default_currency: config.currency.default_currency.clone(),
            initiatives: BTreeMap::new(),
            transactions: HashMap::new(),
            directory: Directory::new(),
            source: None,
        }
    }

    /// Replace the contents of the store with a seed
    pub fn seed(&mut self, seed: FundSeed) -> CoreResult<()> {
        seed.validate()?;
        self.initiatives.clear();
        self.transactions.clear();
        for initiative in seed.initiatives {
            self.insert_initiative(initiative);
        }
        self.directory = seed.directory;
        Ok(())
    }

    /// Load the store from a JSON seed file
    pub async fn load(&mut self, path: PathBuf) -> CoreResult<()> {
        let content = tokio::fs::read_to_string(&path).await?;
        let seed: FundSeed = serde_json::from_str(&content).map_err(|e| CoreError::ParseError {
            message: format!("{}: {}", path.display(), e),
        })?;

        log::info!(
            "Loaded {} initiative(s), {} backer(s), {} merchant(s) from {}",
            seed.initiatives.len(),
            seed.directory.backers.len(),
            seed.directory.merchants.len(),
            path.display()
        );

        self.seed(seed)?;
        self.source = Some(path);
        Ok(())
    }

    /// Reload from the file last loaded; transaction logs are dropped
    pub async fn reload(&mut self) -> CoreResult<()> {
        match self.source.clone() {
            Some(path) => self.load(path).await,
            None => Err(CoreError::IoError {
                message: "store was not loaded from a file".to_string(),
            }),
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut Directory {
        &mut self.directory
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    pub fn insert_initiative(&mut self, initiative: Initiative) {
        self.initiatives.insert(initiative.phid.clone(), initiative);
    }

    pub fn initiatives(&self) -> Vec<&Initiative> {
        self.initiatives.values().collect()
    }

    pub fn initiative(&self, phid: &Phid) -> Option<&Initiative> {
        self.initiatives.get(phid)
    }

    /// Transaction log of one initiative, oldest first
    pub fn transactions(&self, phid: &Phid) -> CoreResult<&[Transaction]> {
        if !self.initiatives.contains_key(phid) {
            return Err(CoreError::InitiativeNotFound { phid: phid.clone() });
        }
        Ok(self.transactions.get(phid).map(Vec::as_slice).unwrap_or(&[]))
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            total_initiatives: self.initiatives.len(),
            open_initiatives: self.initiatives.values().filter(|i| !i.is_closed()).count(),
            total_transactions: self.transactions.values().map(Vec::len).sum(),
            total_backers: self.directory.backers.len(),
        }
    }

    /// Create an initiative by applying `xactions` to a fresh one
    pub fn create_initiative(
        &mut self,
        actor: Viewer,
        xactions: Vec<Transaction>,
    ) -> CoreResult<(Initiative, Vec<Transaction>)> {
        let mut initiative = Initiative::initialize_new(&actor, &self.default_currency);
        let editor = InitiativeEditor::new(actor, &self.directory, &self.directory, &self.default_currency);
        let recorded = apply_transactions(&editor, &mut initiative, xactions)?;

        let phid = initiative.phid.clone();
        self.transactions.insert(phid.clone(), recorded.clone());
        self.initiatives.insert(phid, initiative.clone());
        Ok((initiative, recorded))
    }

    /// Apply `xactions` to an existing initiative
    pub fn edit_initiative(
        &mut self,
        actor: Viewer,
        phid: &Phid,
        xactions: Vec<Transaction>,
    ) -> CoreResult<Vec<Transaction>> {
        let initiative = self
            .initiatives
            .get_mut(phid)
            .ok_or_else(|| CoreError::InitiativeNotFound { phid: phid.clone() })?;

        let editor = InitiativeEditor::new(actor, &self.directory, &self.directory, &self.default_currency);
        let recorded = apply_transactions(&editor, initiative, xactions)?;

        self.transactions
            .entry(phid.clone())
            .or_default()
            .extend(recorded.iter().cloned());
        Ok(recorded)
    }
}
