use std::sync::Arc;

use storage::config::StorageConfig;
use storage::repository::{Storage, UserRepository};
use tracker_core::model::{User, UserId};
use tracker_core::time::Clock;

use crate::analytics_service::AnalyticsService;
use crate::attempt_service::AttemptService;
use crate::backup_service::BackupService;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::settings_service::SettingsService;

const DEMO_USER_ID: UserId = UserId::new(1);
const DEMO_USERNAME: &str = "demo";
const DEMO_PASSWORD: &str = "demo123";

/// Assembles the service layer over one configured storage backend.
///
/// There is no global storage singleton; whatever serves requests holds an
/// `AppServices` and passes it down explicitly.
#[derive(Clone)]
pub struct AppServices {
    user_id: UserId,
    attempts: Arc<AttemptService>,
    progress: Arc<ProgressService>,
    analytics: Arc<AnalyticsService>,
    settings: Arc<SettingsService>,
    catalog: Arc<CatalogService>,
    backup: Arc<BackupService>,
}

impl AppServices {
    /// Open the configured backend and wire services over it.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the backend cannot be opened or the
    /// catalog/demo-user bootstrap fails.
    pub async fn bootstrap(
        config: &StorageConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::open(config).await?;
        Self::from_storage(storage, clock).await
    }

    /// Wire services over already-opened storage.
    ///
    /// Seeds the subject catalog if it is empty and ensures the demo user
    /// exists; both steps are idempotent.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if seeding or user setup fails.
    pub async fn from_storage(storage: Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.subjects)));
        catalog.ensure_seeded().await?;

        let user_id = ensure_demo_user(storage.users.as_ref(), clock).await?;

        let attempts = Arc::new(AttemptService::new(
            clock,
            Arc::clone(&storage.subjects),
            Arc::clone(&storage.attempts),
            Arc::clone(&storage.tracking),
        ));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.progress),
            Arc::clone(&storage.tracking),
        ));
        let analytics = Arc::new(AnalyticsService::new(
            clock,
            Arc::clone(&storage.subjects),
            Arc::clone(&storage.attempts),
            Arc::clone(&storage.progress),
        ));
        let settings = Arc::new(SettingsService::new(Arc::clone(&storage.settings)));
        let backup = Arc::new(BackupService::new(
            Arc::clone(&storage.attempts),
            Arc::clone(&storage.tracking),
        ));

        Ok(Self {
            user_id,
            attempts,
            progress,
            analytics,
            settings,
            catalog,
            backup,
        })
    }

    /// The single account everything runs under.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn attempts(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempts)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn analytics(&self) -> Arc<AnalyticsService> {
        Arc::clone(&self.analytics)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn backup(&self) -> Arc<BackupService> {
        Arc::clone(&self.backup)
    }
}

async fn ensure_demo_user(
    users: &dyn UserRepository,
    clock: Clock,
) -> Result<UserId, AppServicesError> {
    if let Some(existing) = users.get_user(DEMO_USER_ID).await? {
        return Ok(existing.id());
    }

    let user = User::new(DEMO_USER_ID, DEMO_USERNAME, DEMO_PASSWORD, clock.now())?;
    users.upsert_user(&user).await?;
    tracing::info!(username = DEMO_USERNAME, "created demo user");
    Ok(user.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::time::fixed_clock;

    #[tokio::test]
    async fn bootstrap_seeds_catalog_and_demo_user() {
        let services = AppServices::bootstrap(&StorageConfig::InMemory, fixed_clock())
            .await
            .unwrap();

        assert_eq!(services.user_id(), UserId::new(1));
        assert_eq!(services.catalog().subjects().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn from_storage_is_idempotent() {
        let storage = Storage::in_memory();
        let first = AppServices::from_storage(storage.clone(), fixed_clock())
            .await
            .unwrap();
        let second = AppServices::from_storage(storage, fixed_clock())
            .await
            .unwrap();

        assert_eq!(first.user_id(), second.user_id());
        assert_eq!(second.catalog().subjects().await.unwrap().len(), 8);
    }
}
