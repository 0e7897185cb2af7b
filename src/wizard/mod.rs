//! Wizard navigation — the step state machine and its serving surface.
//!
//! A linear sequence of configured steps with directional navigation:
//! forward movement can be gated on a step's form completeness, backward
//! movement never is, and reaching the last step fires a one-shot
//! celebratory effect. The presentation layer observes progress and invokes
//! `advance`/`retreat`; it never mutates wizard state directly.

pub mod controller;
pub mod routes;
pub mod state;

pub use controller::{WizardController, WizardStatus};
pub use routes::{WizardRouteState, wizard_routes};
pub use state::{AdvanceOutcome, RetreatOutcome, WizardState};
