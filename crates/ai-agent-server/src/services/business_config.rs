use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::backend::{BackendApi, BusinessStatus};

/// Normalized per-tenant bot persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantConfig {
    pub name: String,
    pub tone: String,
    pub language: String,
    pub specialties: String,
    pub business_hours: String,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            name: "Business".to_string(),
            tone: "professional".to_string(),
            language: "English".to_string(),
            specialties: String::new(),
            business_hours: "24/7".to_string(),
        }
    }
}

impl From<BusinessStatus> for TenantConfig {
    fn from(status: BusinessStatus) -> Self {
        let mut config = TenantConfig::default();

        if let Some(name) = status.name {
            config.name = name;
        }

        if let Some(bot) = status.bot_configs.and_then(|c| c.into_iter().next()) {
            if let Some(tone) = bot.tone {
                config.tone = tone;
            }
            if let Some(language) = bot.language {
                config.language = language;
            }
            if let Some(specialties) = bot.specialties {
                config.specialties = specialties;
            }
            if let Some(hours) = bot.business_hours {
                config.business_hours = hours;
            }
        }

        config
    }
}

/// Tenant configs fetched once per process; no expiry, failures are not cached.
pub struct BusinessConfigCache {
    backend: Arc<dyn BackendApi>,
    configs: DashMap<String, Arc<OnceCell<TenantConfig>>>,
}

impl BusinessConfigCache {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self {
            backend,
            configs: DashMap::new(),
        }
    }

    /// Returns `None` when the backend can't provide a config; callers use a
    /// generic persona instead.
    pub async fn get_config(&self, tenant_id: &str) -> Option<TenantConfig> {
        // Clone the cell out so no map shard lock is held across the fetch.
        let cell = self
            .configs
            .entry(tenant_id.to_string())
            .or_default()
            .clone();

        if let Some(config) = cell.get() {
            debug!("Business config cache hit for {}", tenant_id);
            return Some(config.clone());
        }

        let result = cell
            .get_or_try_init(|| async {
                self.backend
                    .fetch_business(tenant_id)
                    .await
                    .map(TenantConfig::from)
            })
            .await;

        match result {
            Ok(config) => {
                info!("Loaded business config for {} ({})", tenant_id, config.name);
                Some(config.clone())
            }
            Err(e) => {
                warn!("Failed to get business config for {}: {}", tenant_id, e);
                None
            }
        }
    }

    /// Number of tenants with a loaded config
    pub fn len(&self) -> usize {
        self.configs.iter().filter(|e| e.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::{BotConfig, MockBackendApi};
    use crate::utils::error::BackendError;

    fn acme() -> BusinessStatus {
        BusinessStatus {
            name: Some("Acme".to_string()),
            bot_configs: Some(vec![BotConfig {
                tone: Some("friendly".to_string()),
                language: None,
                specialties: Some("dental care".to_string()),
                business_hours: None,
            }]),
        }
    }

    #[test]
    fn test_normalization_defaults() {
        let config = TenantConfig::from(BusinessStatus::default());
        assert_eq!(config, TenantConfig::default());

        let config = TenantConfig::from(acme());
        assert_eq!(config.name, "Acme");
        assert_eq!(config.tone, "friendly");
        assert_eq!(config.language, "English");
        assert_eq!(config.specialties, "dental care");
        assert_eq!(config.business_hours, "24/7");
    }

    #[tokio::test]
    async fn test_fetches_once_per_tenant() {
        let mut backend = MockBackendApi::new();
        backend
            .expect_fetch_business()
            .withf(|id: &str| id == "t1")
            .times(1)
            .returning(|_| Ok(acme()));

        let cache = BusinessConfigCache::new(Arc::new(backend));
        for _ in 0..3 {
            let config = cache.get_config("t1").await.unwrap();
            assert_eq!(config.name, "Acme");
        }
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_share_one_fetch() {
        let mut backend = MockBackendApi::new();
        backend.expect_fetch_business().times(1).returning(|_| {
            // Keep the fetch in flight while the other callers arrive.
            std::thread::sleep(std::time::Duration::from_millis(50));
            Ok(acme())
        });

        let cache = Arc::new(BusinessConfigCache::new(Arc::new(backend)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_config("t1").await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().name, "Acme");
        }
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_retried() {
        let mut backend = MockBackendApi::new();
        let mut seq = mockall::Sequence::new();
        backend
            .expect_fetch_business()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BackendError::Status { status: 500, body: String::new() }));
        backend
            .expect_fetch_business()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(acme()));

        let cache = BusinessConfigCache::new(Arc::new(backend));
        assert!(cache.get_config("t1").await.is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.get_config("t1").await.unwrap().name, "Acme");
    }
}
