use chrono::NaiveTime;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("unknown theme: {0}")]
    UnknownTheme(String),
}

//
// ─── THEME ─────────────────────────────────────────────────────────────────────
//

/// Display theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parses the persisted theme name.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::UnknownTheme` for anything other than
    /// `light` or `dark`.
    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(SettingsError::UnknownTheme(other.to_owned())),
        }
    }
}

//
// ─── USER SETTINGS ─────────────────────────────────────────────────────────────
//

/// Per-user preferences.
///
/// Created lazily on first access; defaults are theme = light with
/// reminders enabled but no reminder times set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    theme: Theme,
    morning_reminder: Option<NaiveTime>,
    evening_reminder: Option<NaiveTime>,
    reminder_enabled: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            morning_reminder: None,
            evening_reminder: None,
            reminder_enabled: true,
        }
    }
}

impl UserSettings {
    #[must_use]
    pub fn from_persisted(
        theme: Theme,
        morning_reminder: Option<NaiveTime>,
        evening_reminder: Option<NaiveTime>,
        reminder_enabled: bool,
    ) -> Self {
        Self {
            theme,
            morning_reminder,
            evening_reminder,
            reminder_enabled,
        }
    }

    /// Apply a partial update, keeping current values for unset fields.
    #[must_use]
    pub fn merged(&self, draft: SettingsDraft) -> Self {
        Self {
            theme: draft.theme.unwrap_or(self.theme),
            morning_reminder: draft.morning_reminder.unwrap_or(self.morning_reminder),
            evening_reminder: draft.evening_reminder.unwrap_or(self.evening_reminder),
            reminder_enabled: draft.reminder_enabled.unwrap_or(self.reminder_enabled),
        }
    }

    // Accessors
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub fn morning_reminder(&self) -> Option<NaiveTime> {
        self.morning_reminder
    }

    #[must_use]
    pub fn evening_reminder(&self) -> Option<NaiveTime> {
        self.evening_reminder
    }

    #[must_use]
    pub fn reminder_enabled(&self) -> bool {
        self.reminder_enabled
    }
}

/// A partial settings update.
///
/// `None` means "leave unchanged"; the reminder fields use a nested option
/// so a caller can also clear a reminder time explicitly.
#[derive(Debug, Clone, Default)]
pub struct SettingsDraft {
    pub theme: Option<Theme>,
    pub morning_reminder: Option<Option<NaiveTime>>,
    pub evening_reminder: Option<Option<NaiveTime>>,
    pub reminder_enabled: Option<bool>,
}

impl SettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
