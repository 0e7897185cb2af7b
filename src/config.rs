//! Static wizard configuration — step tables, forms, and ambient settings.
//!
//! The wizard is defined by data, not control flow: steps, gating, and field
//! predicates all live here. `validate()` runs once at construction so that
//! definition bugs fail fast instead of surfacing per keystroke.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::form::{FieldKind, FieldSpec, FormSpec, SectionSpec};

/// Whether leaving a step forward requires its form to be complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingPolicy {
    #[default]
    Ungated,
    GatedOnCompleteness,
}

/// One wizard screen. Immutable once the wizard is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    /// Unique key, used in routes and logs.
    pub key: String,
    /// Human label for the progress indicator.
    pub label: String,
    #[serde(default)]
    pub gating: GatingPolicy,
    /// Field table for a multi-field step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<FormSpec>,
}

impl StepSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            gating: GatingPolicy::Ungated,
            form: None,
        }
    }

    pub fn gated(mut self) -> Self {
        self.gating = GatingPolicy::GatedOnCompleteness;
        self
    }

    pub fn with_form(mut self, form: FormSpec) -> Self {
        self.form = Some(form);
        self
    }
}

/// Full wizard definition plus the opaque terminal-action link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    pub steps: Vec<StepSpec>,
    /// External community channel opened by the terminal step's join action.
    /// The core exposes the link; it never follows it.
    pub community_url: String,
    /// How long the celebratory effect runs after the terminal step is
    /// reached, in seconds.
    #[serde(default = "default_celebration_secs")]
    pub celebration_secs: u64,
}

fn default_celebration_secs() -> u64 {
    3
}

impl WizardConfig {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Look up a step by key.
    pub fn step(&self, key: &str) -> Option<(usize, &StepSpec)> {
        self.steps
            .iter()
            .enumerate()
            .find(|(_, step)| step.key == key)
    }

    /// Load a configuration from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validate the static definition. Called once at controller
    /// construction; any error here is a bug in the wizard definition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::NoSteps);
        }

        let mut step_keys = HashSet::new();
        for step in &self.steps {
            if !step_keys.insert(step.key.as_str()) {
                return Err(ConfigError::DuplicateStepKey(step.key.clone()));
            }
            if step.gating == GatingPolicy::GatedOnCompleteness && step.form.is_none() {
                return Err(ConfigError::GatedWithoutForm {
                    step: step.key.clone(),
                });
            }
            if let Some(form) = &step.form {
                Self::validate_form(&step.key, form)?;
            }
        }
        Ok(())
    }

    fn validate_form(step_key: &str, form: &FormSpec) -> Result<(), ConfigError> {
        if form.sections.is_empty() {
            return Err(ConfigError::EmptyForm {
                step: step_key.to_string(),
            });
        }

        let mut field_keys = HashSet::new();
        for field in form.fields() {
            if !field_keys.insert(field.key.as_str()) {
                return Err(ConfigError::DuplicateFieldKey {
                    step: step_key.to_string(),
                    field: field.key.clone(),
                });
            }
            match &field.kind {
                FieldKind::SingleChoice { options, default } => {
                    if options.is_empty() {
                        return Err(ConfigError::EmptyOptionSet {
                            step: step_key.to_string(),
                            field: field.key.clone(),
                        });
                    }
                    if let Some(default) = default {
                        if !options.contains(default) {
                            return Err(ConfigError::UnknownDefaultOption {
                                field: field.key.clone(),
                                option: default.clone(),
                            });
                        }
                    }
                }
                FieldKind::MultiChoice { options } => {
                    if options.is_empty() {
                        return Err(ConfigError::EmptyOptionSet {
                            step: step_key.to_string(),
                            field: field.key.clone(),
                        });
                    }
                }
                FieldKind::FreeText | FieldKind::Numeric => {}
            }
        }
        Ok(())
    }
}

impl Default for WizardConfig {
    /// The Web Innovators onboarding flow: vision → benefits → profile →
    /// motivation → summary, with the profile step gated on its form. The
    /// landing screen sits outside the step array; retreating from step 0
    /// hands control back to it.
    fn default() -> Self {
        let profile_form = FormSpec {
            sections: vec![
                SectionSpec {
                    title: "Your Story".to_string(),
                    fields: vec![FieldSpec::new(
                        "motivation",
                        "What inspired you to start coding?",
                        FieldKind::FreeText,
                    )],
                },
                SectionSpec {
                    title: "Experience & Time".to_string(),
                    fields: vec![
                        FieldSpec::new(
                            "experience",
                            "Experience level",
                            FieldKind::SingleChoice {
                                options: choices(["beginner", "some", "intermediate"]),
                                default: Some("beginner".to_string()),
                            },
                        ),
                        FieldSpec::new("hours", "Hours per week", FieldKind::Numeric),
                    ],
                },
                SectionSpec {
                    title: "Learning Preferences".to_string(),
                    fields: vec![
                        FieldSpec::new(
                            "stack",
                            "Preferred stack",
                            FieldKind::MultiChoice {
                                options: choices(["frontend", "backend", "fullstack"]),
                            },
                        ),
                        FieldSpec::new(
                            "learning_style",
                            "Learning style",
                            FieldKind::SingleChoice {
                                options: choices(["visual", "practical", "mixed"]),
                                default: None,
                            },
                        )
                        .optional(),
                    ],
                },
                SectionSpec {
                    title: "Your Goals".to_string(),
                    fields: vec![FieldSpec::new(
                        "goals",
                        "Goals",
                        FieldKind::MultiChoice {
                            options: choices([
                                "career_change",
                                "skill_enhancement",
                                "side_projects",
                                "freelancing",
                                "personal_growth",
                            ]),
                        },
                    )],
                },
            ],
        };

        Self {
            steps: vec![
                StepSpec::new("vision", "Vision"),
                StepSpec::new("benefits", "Benefits"),
                StepSpec::new("profile", "Profile").gated().with_form(profile_form),
                StepSpec::new("motivation", "Motivation"),
                StepSpec::new("summary", "Summary"),
            ],
            community_url: "https://t.me/kumotechs".to_string(),
            celebration_secs: default_celebration_secs(),
        }
    }
}

fn choices<const N: usize>(options: [&str; N]) -> Vec<String> {
    options.into_iter().map(String::from).collect()
}
