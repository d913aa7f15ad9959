//! Project-level inputs consumed by the checks: spelling variant and policies.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Localized spelling convention of identifiers in source and rewritten text.
///
/// `Primary` is the Russian spelling (`ОткрытьЗначение`), `Alternate` the
/// English one (`OpenValue`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScriptVariant {
    #[default]
    #[serde(alias = "russian", alias = "ru")]
    #[value(alias = "russian", alias = "ru")]
    Primary,
    #[serde(alias = "english", alias = "en")]
    #[value(alias = "english", alias = "en")]
    Alternate,
}

impl ScriptVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptVariant::Primary => "primary",
            ScriptVariant::Alternate => "alternate",
        }
    }

    /// Pick the spelling matching this variant.
    pub fn pick<'a>(&self, primary: &'a str, alternate: &'a str) -> &'a str {
        match self {
            ScriptVariant::Primary => primary,
            ScriptVariant::Alternate => alternate,
        }
    }
}

/// Configured handling of modal UI calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ModalityPolicy {
    /// Modal calls are allowed (covers both "use" and "use with warnings").
    #[default]
    #[serde(alias = "use", alias = "use-with-warnings")]
    #[value(alias = "use", alias = "use-with-warnings")]
    Unrestricted,
    /// Modal calls are forbidden.
    DontUse,
}

impl ModalityPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModalityPolicy::Unrestricted => "unrestricted",
            ModalityPolicy::DontUse => "dont-use",
        }
    }

    pub fn forbids_modal_calls(&self) -> bool {
        matches!(self, ModalityPolicy::DontUse)
    }
}

/// Everything the checks need to know about the project being analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default, alias = "script_variant")]
    pub variant: ScriptVariant,
    #[serde(default)]
    pub modality: ModalityPolicy,
    /// The analyzed modules belong to a configuration extension.
    #[serde(default)]
    pub extension: bool,
}

impl ProjectSettings {
    #[must_use]
    pub fn with_variant(mut self, variant: ScriptVariant) -> Self {
        self.variant = variant;
        self
    }

    #[must_use]
    pub fn with_modality(mut self, modality: ModalityPolicy) -> Self {
        self.modality = modality;
        self
    }

    #[must_use]
    pub fn as_extension(mut self) -> Self {
        self.extension = true;
        self
    }
}
