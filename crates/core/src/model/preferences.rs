use serde::{Deserialize, Serialize};

/// Per-user exam toggles shared by every session.
///
/// Missing fields fall back to their defaults so older stored shapes still load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamPreferences {
    sound_enabled: bool,
    show_explanation: bool,
    dark_mode: bool,
}

/// Partial update applied over stored preferences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExamPreferencesDraft {
    pub sound_enabled: Option<bool>,
    pub show_explanation: Option<bool>,
    pub dark_mode: Option<bool>,
}

impl ExamPreferencesDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay the set fields onto `base`.
    #[must_use]
    pub fn apply(self, base: ExamPreferences) -> ExamPreferences {
        ExamPreferences {
            sound_enabled: self.sound_enabled.unwrap_or(base.sound_enabled),
            show_explanation: self.show_explanation.unwrap_or(base.show_explanation),
            dark_mode: self.dark_mode.unwrap_or(base.dark_mode),
        }
    }
}

impl ExamPreferences {
    #[must_use]
    pub fn new(sound_enabled: bool, show_explanation: bool, dark_mode: bool) -> Self {
        Self {
            sound_enabled,
            show_explanation,
            dark_mode,
        }
    }

    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    #[must_use]
    pub fn show_explanation(&self) -> bool {
        self.show_explanation
    }

    #[must_use]
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }
}

impl Default for ExamPreferences {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            show_explanation: true,
            dark_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let prefs: ExamPreferences = serde_json::from_str(r#"{"darkMode": true}"#).unwrap();
        assert!(prefs.sound_enabled());
        assert!(prefs.show_explanation());
        assert!(prefs.dark_mode());
    }

    #[test]
    fn draft_overrides_only_set_fields() {
        let draft = ExamPreferencesDraft {
            sound_enabled: Some(false),
            ..ExamPreferencesDraft::new()
        };
        let prefs = draft.apply(ExamPreferences::default());
        assert!(!prefs.sound_enabled());
        assert!(prefs.show_explanation());
        assert!(!prefs.dark_mode());
    }
}
