// src/services/store.rs
use chrono::Utc;
use log::{debug, info};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Company, Preferences, ValuationRecord};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Company with symbol {0} already exists")]
    DuplicateSymbol(String),

    #[error("Company {0} not found")]
    NotFound(Uuid),
}

/// In-memory watchlist keyed by company id.
///
/// Records are only ever replaced whole; there is no partial-field update.
pub struct CompanyStore {
    companies: RwLock<HashMap<Uuid, Company>>,
    preferences: RwLock<Preferences>,
}

impl Default for CompanyStore {
    fn default() -> Self {
        CompanyStore::new()
    }
}

impl CompanyStore {
    pub fn new() -> Self {
        CompanyStore {
            companies: RwLock::new(HashMap::new()),
            preferences: RwLock::new(Preferences {
                show_low_high: false,
                updated_at: Utc::now(),
            }),
        }
    }

    /// All companies, oldest first.
    pub async fn list(&self) -> Vec<Company> {
        let companies = self.companies.read().await;
        let mut list: Vec<Company> = companies.values().cloned().collect();
        list.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.record.symbol.cmp(&b.record.symbol))
        });
        list
    }

    pub async fn get(&self, id: Uuid) -> Option<Company> {
        self.companies.read().await.get(&id).cloned()
    }

    pub async fn find_by_symbol(&self, symbol: &str) -> Option<Company> {
        self.companies
            .read()
            .await
            .values()
            .find(|c| c.record.symbol.eq_ignore_ascii_case(symbol))
            .cloned()
    }

    pub async fn insert(&self, record: ValuationRecord, synthetic: bool) -> Result<Company, StoreError> {
        let mut companies = self.companies.write().await;
        if symbol_taken(&companies, &record.symbol, None) {
            return Err(StoreError::DuplicateSymbol(record.symbol));
        }

        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4(),
            record,
            synthetic,
            created_at: now,
            updated_at: now,
        };
        info!("Stored {} as {}", company.record.symbol, company.id);
        companies.insert(company.id, company.clone());
        Ok(company)
    }

    pub async fn replace(&self, id: Uuid, record: ValuationRecord, synthetic: bool) -> Result<Company, StoreError> {
        let mut companies = self.companies.write().await;
        if symbol_taken(&companies, &record.symbol, Some(id)) {
            return Err(StoreError::DuplicateSymbol(record.symbol));
        }
        let company = companies.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        company.record = record;
        company.synthetic = synthetic;
        company.updated_at = Utc::now();
        debug!("Replaced record for {} ({})", company.record.symbol, id);
        Ok(company.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.companies.write().await.remove(&id);
        if let Some(company) = &removed {
            info!("Removed {} ({})", company.record.symbol, id);
        }
        removed.is_some()
    }

    pub async fn preferences(&self) -> Preferences {
        self.preferences.read().await.clone()
    }

    pub async fn update_preferences(&self, show_low_high: bool) -> Preferences {
        let mut prefs = self.preferences.write().await;
        prefs.show_low_high = show_low_high;
        prefs.updated_at = Utc::now();
        prefs.clone()
    }
}

fn symbol_taken(companies: &HashMap<Uuid, Company>, symbol: &str, except: Option<Uuid>) -> bool {
    companies
        .values()
        .any(|c| Some(c.id) != except && c.record.symbol.eq_ignore_ascii_case(symbol))
}
