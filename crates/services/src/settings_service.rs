use std::sync::Arc;

use storage::repository::SettingsRepository;
use tracker_core::model::{SettingsDraft, UserId, UserSettings};

use crate::error::SettingsServiceError;

/// Per-user preferences with lazy initialization.
#[derive(Clone)]
pub struct SettingsService {
    settings: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsRepository>) -> Self {
        Self { settings }
    }

    /// Load the user's settings, initializing defaults on first access.
    ///
    /// "Never written" and "read failed" are distinct: a missing record
    /// gets the defaults persisted and returned, while a storage failure
    /// propagates instead of being masked by defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Storage` on storage failures.
    pub async fn load(&self, user_id: UserId) -> Result<UserSettings, SettingsServiceError> {
        if let Some(existing) = self.settings.get_settings(user_id).await? {
            return Ok(existing);
        }

        let defaults = UserSettings::default();
        self.settings.save_settings(user_id, &defaults).await?;
        tracing::debug!(user = %user_id, "initialized default settings");
        Ok(defaults)
    }

    /// Merge a partial update over the current settings (or defaults) and
    /// persist the result.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Storage` on storage failures.
    pub async fn update(
        &self,
        user_id: UserId,
        draft: SettingsDraft,
    ) -> Result<UserSettings, SettingsServiceError> {
        let current = self
            .settings
            .get_settings(user_id)
            .await?
            .unwrap_or_default();
        let merged = current.merged(draft);
        self.settings.save_settings(user_id, &merged).await?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;
    use tracker_core::model::Theme;

    fn service(repo: &Arc<InMemoryRepository>) -> SettingsService {
        SettingsService::new(Arc::clone(repo) as Arc<dyn SettingsRepository>)
    }

    #[tokio::test]
    async fn first_load_persists_defaults() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = service(&repo);

        let loaded = service.load(UserId::new(1)).await.unwrap();
        assert_eq!(loaded, UserSettings::default());

        // The defaults are now stored, not conjured per read.
        let raw = repo.get_settings(UserId::new(1)).await.unwrap();
        assert_eq!(raw, Some(UserSettings::default()));
    }

    #[tokio::test]
    async fn update_merges_over_current() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = service(&repo);

        let updated = service
            .update(
                UserId::new(1),
                SettingsDraft {
                    theme: Some(Theme::Dark),
                    ..SettingsDraft::new()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.theme(), Theme::Dark);
        assert!(updated.reminder_enabled());

        let again = service
            .update(
                UserId::new(1),
                SettingsDraft {
                    reminder_enabled: Some(false),
                    ..SettingsDraft::new()
                },
            )
            .await
            .unwrap();
        // The earlier theme change survives the second partial update.
        assert_eq!(again.theme(), Theme::Dark);
        assert!(!again.reminder_enabled());
    }
}
