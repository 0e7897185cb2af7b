//! Form system — declarative field specs and per-step value state.
//!
//! A multi-field step declares its inputs as a `FieldSpec` table; `FormState`
//! holds the values and derives the single boolean the controller gates on.

pub mod spec;
pub mod state;

pub use spec::{FieldKind, FieldSpec, FormSpec, SectionSpec};
pub use state::{FieldValue, FormSnapshot, FormState};
