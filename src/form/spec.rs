//! Declarative field specifications for multi-field steps.
//!
//! Completeness rules live in this table, not in per-step control flow: a new
//! step is added by declaring its fields, never by writing new conditionals.

use serde::{Deserialize, Serialize};

/// Value shape of one input field, with its non-emptiness rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free-form text. Complete when the trimmed value is non-empty.
    FreeText,
    /// Raw text that must parse as a finite non-negative number to count as
    /// complete. Malformed input is "incomplete", never a parse error.
    Numeric,
    /// Exactly one of the enumerated options, or the unset sentinel.
    /// Unset is incomplete.
    SingleChoice {
        options: Vec<String>,
        /// Pre-selected option, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    /// Any subset of the enumerated options. Complete when non-empty.
    MultiChoice { options: Vec<String> },
}

impl FieldKind {
    /// The declared option set, for choice kinds.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::SingleChoice { options, .. } | Self::MultiChoice { options } => {
                Some(options.as_slice())
            }
            Self::FreeText | Self::Numeric => None,
        }
    }
}

/// One input inside a multi-field step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Unique key within the step's form.
    pub key: String,
    /// Human label shown next to the input.
    pub label: String,
    /// Whether this field participates in the completeness AND.
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            required: true,
            kind,
        }
    }

    /// Mark this field as optional (excluded from completeness).
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A browsable sub-section of a form. Grouping and sub-navigation only; the
/// step boundary is the only gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub title: String,
    pub fields: Vec<FieldSpec>,
}

/// The full form for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSpec {
    pub sections: Vec<SectionSpec>,
}

impl FormSpec {
    /// All fields across all sections, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Look up a field by key.
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.key == key)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}
