//! Pricing & Availability Resolver
//!
//! Read-only lookup used when an order is priced. One batch query per
//! call; the result follows the request order so callers can zip it with
//! their cart lines. [`resolve_items`] also runs inside an open transaction
//! so a checkout can confirm its snapshot after taking the write lock.

use std::collections::HashMap;

use shared::Money;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::db::repository::{RepoResult, catalog};

/// Current state of one requested item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Available {
        item_id: i64,
        name: String,
        price: Money,
    },
    Unavailable {
        item_id: i64,
        name: String,
    },
    Missing {
        item_id: i64,
    },
}

impl Resolution {
    pub fn item_id(&self) -> i64 {
        match self {
            Resolution::Available { item_id, .. }
            | Resolution::Unavailable { item_id, .. }
            | Resolution::Missing { item_id } => *item_id,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Resolution::Available { .. })
    }
}

#[derive(Clone)]
pub struct PriceResolver {
    pool: SqlitePool,
}

impl PriceResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve every requested id (duplicates allowed) in request order
    pub async fn resolve(&self, item_ids: &[i64]) -> RepoResult<Vec<Resolution>> {
        resolve_items(&self.pool, item_ids).await
    }
}

pub async fn resolve_items<'c, E>(executor: E, item_ids: &[i64]) -> RepoResult<Vec<Resolution>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let mut unique: Vec<i64> = item_ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let found: HashMap<i64, _> = catalog::find_items_by_ids(executor, &unique)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let resolutions = item_ids
        .iter()
        .map(|&item_id| match found.get(&item_id) {
            Some(item) if item.is_available => Resolution::Available {
                item_id,
                name: item.name.clone(),
                price: item.price,
            },
            Some(item) => Resolution::Unavailable {
                item_id,
                name: item.name.clone(),
            },
            None => Resolution::Missing { item_id },
        })
        .collect();

    Ok(resolutions)
}
