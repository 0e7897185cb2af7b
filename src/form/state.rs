//! Per-step form values and completeness derivation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FormError;

use super::spec::{FieldKind, FieldSpec, FormSpec};

/// Current value of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Free or numeric text, stored raw as the user typed it.
    Text(String),
    /// Single choice; `None` is the unset sentinel.
    Choice(Option<String>),
    /// Multi-choice membership set.
    Selection(BTreeSet<String>),
}

impl FieldValue {
    fn shape(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Choice(_) => "choice",
            Self::Selection(_) => "selection",
        }
    }
}

/// Immutable view of a form, handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub values: BTreeMap<String, FieldValue>,
    pub current_section: usize,
    pub complete: bool,
}

/// Field values for one multi-field step.
///
/// Holds the value map and the sub-section cursor; completeness is derived,
/// never stored. The controller reads `is_complete()` and nothing else.
#[derive(Debug, Clone)]
pub struct FormState {
    spec: Arc<FormSpec>,
    values: BTreeMap<String, FieldValue>,
    current_section: usize,
}

impl FormState {
    /// Create a fresh form, seeding single-choice defaults.
    pub fn new(spec: Arc<FormSpec>) -> Self {
        let mut values = BTreeMap::new();
        for field in spec.fields() {
            if let FieldKind::SingleChoice {
                default: Some(default),
                ..
            } = &field.kind
            {
                values.insert(field.key.clone(), FieldValue::Choice(Some(default.clone())));
            }
        }
        Self {
            spec,
            values,
            current_section: 0,
        }
    }

    /// Replace the stored value for a declared field.
    ///
    /// The value shape must match the field kind, and choice values must be
    /// members of the declared option set. No side effects beyond the map.
    pub fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), FormError> {
        let field = self
            .spec
            .field(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;

        match (&field.kind, &value) {
            (FieldKind::FreeText | FieldKind::Numeric, FieldValue::Text(_)) => {}
            (FieldKind::SingleChoice { options, .. }, FieldValue::Choice(choice)) => {
                if let Some(option) = choice {
                    if !options.contains(option) {
                        return Err(FormError::InvalidOption {
                            field: key.to_string(),
                            option: option.clone(),
                        });
                    }
                }
            }
            (FieldKind::MultiChoice { options }, FieldValue::Selection(members)) => {
                if let Some(foreign) = members.iter().find(|m| !options.contains(*m)) {
                    return Err(FormError::InvalidOption {
                        field: key.to_string(),
                        option: foreign.clone(),
                    });
                }
            }
            _ => {
                return Err(FormError::TypeMismatch {
                    field: key.to_string(),
                    given: value.shape(),
                });
            }
        }

        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Toggle membership of `member` in a multi-choice field.
    ///
    /// Symmetric difference: present is removed, absent is added. Returns the
    /// new membership state.
    pub fn toggle_member(&mut self, key: &str, member: &str) -> Result<bool, FormError> {
        let field = self
            .spec
            .field(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;

        let FieldKind::MultiChoice { options } = &field.kind else {
            return Err(FormError::TypeMismatch {
                field: key.to_string(),
                given: "toggle",
            });
        };
        if !options.iter().any(|o| o == member) {
            return Err(FormError::InvalidOption {
                field: key.to_string(),
                option: member.to_string(),
            });
        }

        let entry = self
            .values
            .entry(key.to_string())
            .or_insert_with(|| FieldValue::Selection(BTreeSet::new()));
        match entry {
            FieldValue::Selection(members) => {
                if members.remove(member) {
                    Ok(false)
                } else {
                    members.insert(member.to_string());
                    Ok(true)
                }
            }
            // A declared multi-choice field can only hold a selection.
            other => Err(FormError::TypeMismatch {
                field: key.to_string(),
                given: other.shape(),
            }),
        }
    }

    /// Whether every required field satisfies its non-emptiness predicate.
    ///
    /// Pure over the current value map: a never-set field evaluates as its
    /// kind's empty value, and evaluation order never matters.
    pub fn is_complete(&self) -> bool {
        self.spec
            .fields()
            .filter(|f| f.required)
            .all(|f| self.field_complete(f))
    }

    fn field_complete(&self, field: &FieldSpec) -> bool {
        let value = self.values.get(&field.key);
        match &field.kind {
            FieldKind::FreeText => {
                matches!(value, Some(FieldValue::Text(s)) if !s.trim().is_empty())
            }
            FieldKind::Numeric => {
                matches!(value, Some(FieldValue::Text(s)) if parses_non_negative(s))
            }
            FieldKind::SingleChoice { .. } => {
                matches!(value, Some(FieldValue::Choice(Some(_))))
            }
            FieldKind::MultiChoice { .. } => {
                matches!(value, Some(FieldValue::Selection(members)) if !members.is_empty())
            }
        }
    }

    /// Current value of a field, if any has been set.
    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Sub-section cursor.
    pub fn current_section(&self) -> usize {
        self.current_section
    }

    /// Move the sub-section cursor. Sections are freely browsable; only the
    /// index bound is checked.
    pub fn jump_to_section(&mut self, index: usize) -> Result<usize, FormError> {
        let count = self.spec.section_count();
        if index >= count {
            return Err(FormError::SectionOutOfRange { index, count });
        }
        self.current_section = index;
        Ok(index)
    }

    /// Immutable snapshot for the presentation layer.
    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            values: self.values.clone(),
            current_section: self.current_section,
            complete: self.is_complete(),
        }
    }
}

/// Numeric completeness rule: trimmed input must parse as a finite,
/// non-negative number.
fn parses_non_negative(raw: &str) -> bool {
    raw.trim()
        .parse::<f64>()
        .map(|n| n.is_finite() && n >= 0.0)
        .unwrap_or(false)
}
