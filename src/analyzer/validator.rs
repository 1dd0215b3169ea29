// src/analyzer/validator.rs

use anyhow::{anyhow, Result};

use crate::tasks::types::TaskBreakdown;

/// Structural checks over a parsed breakdown. Break indices the model
/// invented past the end of the step list are dropped rather than failing
/// the whole breakdown; everything else is a hard validation error.
pub fn validate_breakdown(breakdown: &mut TaskBreakdown) -> Result<()> {
    if breakdown.steps.is_empty() {
        return Err(anyhow!("breakdown has no steps"));
    }

    if !(1..=3).contains(&breakdown.energy_level_needed) {
        return Err(anyhow!(
            "energy_level_needed {} outside 1-3",
            breakdown.energy_level_needed
        ));
    }

    if breakdown.context_switches < 0 {
        return Err(anyhow!("context_switches cannot be negative"));
    }

    for step in &breakdown.steps {
        if step.description.trim().is_empty() {
            return Err(anyhow!("step description cannot be empty"));
        }
        if step.time_estimate <= 0 {
            return Err(anyhow!(
                "step time_estimate {} must be positive",
                step.time_estimate
            ));
        }
    }

    let step_count = breakdown.steps.len() as i64;
    breakdown
        .suggested_breaks
        .retain(|&idx| idx >= 0 && idx < step_count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::types::TaskStep;

    fn step(description: &str) -> TaskStep {
        TaskStep {
            description: description.into(),
            time_estimate: 10,
            initiation_tip: "tip".into(),
            completion_signal: "done".into(),
            focus_strategy: "timer".into(),
            dopamine_hook: "reward".into(),
        }
    }

    fn breakdown() -> TaskBreakdown {
        TaskBreakdown {
            steps: vec![step("one"), step("two")],
            suggested_breaks: vec![0, 1],
            adhd_supports: vec![],
            initiation_strategy: "start small".into(),
            energy_level_needed: 2,
            context_switches: 1,
            materials_needed: vec![],
            environment_setup: vec![],
        }
    }

    #[test]
    fn valid_breakdown_passes_unchanged() {
        let mut b = breakdown();
        validate_breakdown(&mut b).unwrap();
        assert_eq!(b.suggested_breaks, vec![0, 1]);
    }

    #[test]
    fn out_of_range_break_indices_are_dropped() {
        let mut b = breakdown();
        b.suggested_breaks = vec![-1, 0, 2, 7];
        validate_breakdown(&mut b).unwrap();
        assert_eq!(b.suggested_breaks, vec![0]);
    }

    #[test]
    fn empty_steps_rejected() {
        let mut b = breakdown();
        b.steps.clear();
        assert!(validate_breakdown(&mut b).is_err());
    }

    #[test]
    fn energy_out_of_range_rejected() {
        let mut b = breakdown();
        b.energy_level_needed = 4;
        assert!(validate_breakdown(&mut b).is_err());
    }

    #[test]
    fn non_positive_time_estimate_rejected() {
        let mut b = breakdown();
        b.steps[0].time_estimate = 0;
        assert!(validate_breakdown(&mut b).is_err());
    }
}
