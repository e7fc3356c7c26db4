use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

/// Shared status region used by both stock forms.
pub const AUTOSAVE_RESPONSE_ID: &str = "autosave-response";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    NotAnObject,
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotAnObject => write!(f, "form options must be an object"),
            ConfigError::Parse(e) => write!(f, "invalid form options: {e}"),
            ConfigError::Invalid(e) => write!(f, "invalid form options: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for JsValue {
    fn from(e: ConfigError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

/// Element ids one form instance is wired to.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    pub editor_region_id: String,
    pub hidden_field_id: String,
    pub form_id: String,
    pub status_region_id: String,
    pub copy_button_id: String,
}

impl FormConfig {
    /// Derives `<name>-editor`, `<name>-editor-input` and `<name>-form`.
    pub fn for_form(name: &str, status_region_id: &str, copy_button_id: &str) -> Self {
        let name = name.trim();
        Self {
            editor_region_id: format!("{name}-editor"),
            hidden_field_id: format!("{name}-editor-input"),
            form_id: format!("{name}-form"),
            status_region_id: status_region_id.to_string(),
            copy_button_id: copy_button_id.to_string(),
        }
    }

    pub fn session_notes() -> Self {
        Self::for_form("session-notes", AUTOSAVE_RESPONSE_ID, "copy-notes-btn")
    }

    pub fn report() -> Self {
        Self::for_form("report-content", AUTOSAVE_RESPONSE_ID, "copy-content-btn")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("editorRegionId", &self.editor_region_id),
            ("hiddenFieldId", &self.hidden_field_id),
            ("formId", &self.form_id),
            ("statusRegionId", &self.status_region_id),
            ("copyButtonId", &self.copy_button_id),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("`{name}` must not be empty")));
            }
        }
        Ok(())
    }
}

/// Delays in milliseconds. Defaults are the values the forms shipped with.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Timings {
    pub debounce_ms: u32,
    pub success_clear_ms: u32,
    pub failure_clear_ms: u32,
    pub copied_revert_ms: u32,
    pub ready_poll_interval_ms: u32,
    pub ready_poll_max_attempts: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            debounce_ms: 2000,
            success_clear_ms: 3000,
            failure_clear_ms: 5000,
            copied_revert_ms: 2000,
            ready_poll_interval_ms: 100,
            ready_poll_max_attempts: 10,
        }
    }
}

impl Timings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::Invalid("`debounceMs` must be positive".to_string()));
        }
        if self.ready_poll_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "`readyPollMaxAttempts` must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// User-visible strings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Labels {
    pub saving: String,
    pub saved: String,
    pub save_failed: String,
    pub copied: String,
    pub nothing_to_copy: String,
    pub placeholder: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            saving: "Saving...".to_string(),
            saved: "Saved".to_string(),
            save_failed: "Error while saving".to_string(),
            copied: "Copied!".to_string(),
            nothing_to_copy: "Nothing to copy.".to_string(),
            placeholder: "Enter text...".to_string(),
        }
    }
}

impl Labels {
    pub fn german() -> Self {
        Self {
            saving: "Wird gespeichert...".to_string(),
            saved: "Gesichert".to_string(),
            save_failed: "Fehler beim Speichern".to_string(),
            copied: "Kopiert!".to_string(),
            nothing_to_copy: "Kein Inhalt zum Kopieren verfügbar.".to_string(),
            placeholder: "Text eingeben...".to_string(),
        }
    }
}

/// Everything `FormExtras::install` needs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtrasOptions {
    #[serde(flatten)]
    pub form: FormConfig,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default)]
    pub labels: Labels,
}

impl ExtrasOptions {
    pub fn new(form: FormConfig) -> Self {
        Self {
            form,
            timings: Timings::default(),
            labels: Labels::default(),
        }
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.form.validate()?;
        self.timings.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if !value.is_object() {
            return Err(ConfigError::NotAnObject);
        }
        let options: Self =
            serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Reads a plain JS options object (`{ editorRegionId, ..., timings?, labels? }`).
    pub fn from_js(value: &JsValue) -> Result<Self, ConfigError> {
        if value.is_undefined() || value.is_null() || !value.is_object() {
            return Err(ConfigError::NotAnObject);
        }
        let json = js_sys::JSON::stringify(value)
            .map_err(|_| ConfigError::Parse("options are not serializable".to_string()))?;
        Self::from_json(&String::from(json))
    }
}
