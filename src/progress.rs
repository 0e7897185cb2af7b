//! Progress projection — pure mapping from wizard position to a renderable
//! model.

use serde::{Deserialize, Serialize};

/// Render status of one step in the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Done,
    Active,
    Pending,
}

/// Renderable progress model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    /// Fraction of the wizard behind the user: `current / (count - 1)`.
    /// A one-step wizard yields NaN by convention; callers render that case
    /// without a bar.
    pub ratio: f64,
    /// One status per step, in order.
    pub statuses: Vec<StepStatus>,
}

/// Project `(current_index, step_count)` onto the progress model.
///
/// Pure and infallible; `step_count >= 1` is enforced at wizard construction,
/// not here.
pub fn project(current_index: usize, step_count: usize) -> Progress {
    let statuses = (0..step_count)
        .map(|index| {
            if index < current_index {
                StepStatus::Done
            } else if index == current_index {
                StepStatus::Active
            } else {
                StepStatus::Pending
            }
        })
        .collect();

    Progress {
        ratio: current_index as f64 / (step_count - 1) as f64,
        statuses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StepStatus::*;

    #[test]
    fn midpoint_projection() {
        let progress = project(2, 5);
        assert_eq!(progress.ratio, 0.5);
        assert_eq!(progress.statuses, [Done, Done, Active, Pending, Pending]);
    }

    #[test]
    fn endpoints() {
        assert_eq!(project(0, 4).ratio, 0.0);
        assert_eq!(project(3, 4).ratio, 1.0);
        assert_eq!(project(0, 2).statuses, [Active, Pending]);
        assert_eq!(project(1, 2).statuses, [Done, Active]);
    }

    #[test]
    fn ratio_monotone_in_current_index() {
        for count in 2..=8 {
            let mut last = f64::NEG_INFINITY;
            for index in 0..count {
                let ratio = project(index, count).ratio;
                assert!(ratio >= last, "ratio regressed at {index}/{count}");
                last = ratio;
            }
        }
    }

    #[test]
    fn single_step_wizard_yields_nan_ratio() {
        let progress = project(0, 1);
        assert!(progress.ratio.is_nan());
        assert_eq!(progress.statuses, [Active]);
    }

    #[test]
    fn status_serde_is_snake_case() {
        assert_eq!(serde_json::to_string(&Done).unwrap(), "\"done\"");
        assert_eq!(serde_json::to_string(&Active).unwrap(), "\"active\"");
        assert_eq!(serde_json::to_string(&Pending).unwrap(), "\"pending\"");
    }
}
