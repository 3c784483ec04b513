//! Compiled-schema cache keyed by data model, access scope and resolver settings
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::store::AccessScope;
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::types::RowId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    data_model_id: RowId,
    scope: AccessScope,
    config: u64,
}

impl CacheKey {
    fn new(data_model_id: RowId, scope: AccessScope, config: &ResolverConfig) -> Self {
        Self {
            data_model_id,
            scope,
            config: config.fingerprint(),
        }
    }
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Thread-safe cache of compiled schema documents
///
/// One cache may serve compilers with different [`ResolverConfig`]s; their
/// documents are stored apart. Entries are dropped wholesale by
/// [`SchemaCache::invalidate`] whenever the underlying rows change.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<CacheKey, Arc<Value>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        data_model_id: RowId,
        scope: AccessScope,
        config: &ResolverConfig,
    ) -> Option<Arc<Value>> {
        let key = CacheKey::new(data_model_id, scope, config);
        let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let found = entries.get(&key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(data_model_id, %scope, "Schema cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    pub fn insert(
        &self,
        data_model_id: RowId,
        scope: AccessScope,
        config: &ResolverConfig,
        schema: Value,
    ) -> Arc<Value> {
        let schema = Arc::new(schema);
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(CacheKey::new(data_model_id, scope, config), Arc::clone(&schema));
        schema
    }

    /// Return the cached schema or compile and store it
    pub fn get_or_try_insert_with<F>(
        &self,
        data_model_id: RowId,
        scope: AccessScope,
        config: &ResolverConfig,
        compile: F,
    ) -> Result<Arc<Value>>
    where
        F: FnOnce() -> Result<Value>,
    {
        if let Some(schema) = self.get(data_model_id, scope, config) {
            return Ok(schema);
        }
        let schema = compile()?;
        Ok(self.insert(data_model_id, scope, config, schema))
    }

    /// Drop every cached schema
    pub fn invalidate(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        debug!(dropped = entries.len(), "Invalidating schema cache");
        entries.clear();
    }

    /// Drop the cached schemas of one data model, across scopes and settings
    pub fn invalidate_model(&self, data_model_id: RowId) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|key, _| key.data_model_id != data_model_id);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_or_insert_compiles_once() {
        let cache = SchemaCache::new();
        let config = ResolverConfig::default();
        let mut compiled = 0;

        for _ in 0..3 {
            let schema = cache
                .get_or_try_insert_with(1, AccessScope::All, &config, || {
                    compiled += 1;
                    Ok(json!({"title": "LIF"}))
                })
                .unwrap();
            assert_eq!(schema["title"], "LIF");
        }

        assert_eq!(compiled, 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_scopes_are_cached_separately() {
        let cache = SchemaCache::new();
        let config = ResolverConfig::default();
        cache.insert(1, AccessScope::All, &config, json!({"v": "all"}));
        cache.insert(1, AccessScope::PublicOnly, &config, json!({"v": "public"}));

        assert_eq!(cache.get(1, AccessScope::PublicOnly, &config).unwrap()["v"], "public");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_resolver_settings_are_cached_separately() {
        let cache = SchemaCache::new();
        let person = ResolverConfig::default();
        let learner = ResolverConfig {
            root_entity_name: "Learner".to_string(),
            ..ResolverConfig::default()
        };

        cache.insert(1, AccessScope::All, &person, json!({"root": "Person"}));
        assert!(cache.get(1, AccessScope::All, &learner).is_none());

        cache.insert(1, AccessScope::All, &learner, json!({"root": "Learner"}));
        assert_eq!(cache.get(1, AccessScope::All, &person).unwrap()["root"], "Person");
        assert_eq!(cache.get(1, AccessScope::All, &learner).unwrap()["root"], "Learner");
        assert_eq!(cache.len(), 2);

        cache.invalidate_model(1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidation() {
        let cache = SchemaCache::new();
        let config = ResolverConfig::default();
        cache.insert(1, AccessScope::All, &config, json!({}));
        cache.insert(2, AccessScope::All, &config, json!({}));

        cache.invalidate_model(1);
        assert!(cache.get(1, AccessScope::All, &config).is_none());
        assert!(cache.get(2, AccessScope::All, &config).is_some());

        cache.invalidate();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failed_compile_is_not_cached() {
        let cache = SchemaCache::new();
        let config = ResolverConfig::default();
        let result = cache.get_or_try_insert_with(1, AccessScope::All, &config, || {
            Err(crate::error::Error::not_found(crate::error::RowKind::DataModel, 1))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
