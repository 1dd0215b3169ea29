// src/assistant/extractor.rs
// Single forward scan over the model's free text. Literal line-start
// markers open sections; inside a BREAKDOWN section, `- `-prefixed
// directives fill the accumulator or switch to a collecting sub-mode.
// Anything unrecognized is silently discarded and the scan never fails.

use crate::assistant::types::{
    CalendarSuggestion, ChatBreakdown, EfCategory, EfSupport, ExtractedSuggestions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Breakdown,
    BreakdownSteps,
    BreakdownTips,
    BreakdownHooks,
    BreakdownBreaks,
    /// A non-breakdown marker was seen; plain lines under it are ignored.
    Other,
}

impl Section {
    fn in_breakdown(self) -> bool {
        matches!(
            self,
            Section::Breakdown
                | Section::BreakdownSteps
                | Section::BreakdownTips
                | Section::BreakdownHooks
                | Section::BreakdownBreaks
        )
    }
}

/// Scan assistant output for ADHD suggestion markers and fold them into a
/// structured bundle. Marker matching is case-sensitive and anchored at the
/// start of the trimmed line.
pub fn extract_suggestions(response: &str) -> ExtractedSuggestions {
    let mut suggestions = ExtractedSuggestions::default();
    let mut section = Section::None;
    let mut breakdown: Option<ChatBreakdown> = None;

    for raw_line in response.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("BREAKDOWN:") {
            section = Section::Breakdown;
            breakdown = Some(ChatBreakdown::with_main_task(rest.trim()));
        } else if let Some(rest) = line.strip_prefix("QUICK_WIN:") {
            section = Section::Other;
            suggestions.dopamine_boosters.push(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("TIME_TIP:") {
            section = Section::Other;
            suggestions
                .calendar_events
                .push(CalendarSuggestion::time_management(rest.trim()));
        } else if let Some(rest) = line.strip_prefix("FOCUS:") {
            section = Section::Other;
            suggestions.focus_tips.push(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("EF_SUPPORT:") {
            section = Section::Other;
            let tip = rest.trim();
            suggestions.ef_supports.push(EfSupport {
                strategy: tip.to_string(),
                category: categorize_ef_support(tip),
            });
        } else if let Some(rest) = line.strip_prefix("ENVIRONMENT:") {
            section = Section::Other;
            suggestions.environment_tips.push(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("START_NOW:") {
            section = Section::Other;
            suggestions.tasks.push(rest.trim().to_string());
        } else if section.in_breakdown() {
            if let Some(data) = breakdown.as_mut() {
                section = scan_breakdown_line(line, section, data);
            }
        }
    }

    // A BREAKDOWN section without a single collected subtask is dropped.
    if let Some(data) = breakdown {
        if !data.subtasks.is_empty() {
            suggestions.task_breakdown = Some(data);
        }
    }

    suggestions
}

/// Handle one line inside a breakdown section. Directive prefixes win over
/// the active collecting sub-mode, so a `- Break at:` line ends a steps
/// list instead of being swallowed into it.
fn scan_breakdown_line(line: &str, section: Section, data: &mut ChatBreakdown) -> Section {
    if let Some(rest) = line.strip_prefix("- Time:") {
        // "45 minutes" -> 45; malformed values keep the previous estimate.
        if let Some(value) = parse_leading_int(rest) {
            data.estimated_time = value;
        }
        Section::Breakdown
    } else if let Some(rest) = line.strip_prefix("- Difficulty:") {
        if let Some(value) = parse_rating(rest) {
            data.difficulty_level = value;
        }
        Section::Breakdown
    } else if let Some(rest) = line.strip_prefix("- Energy:") {
        if let Some(value) = parse_rating(rest) {
            data.energy_level_needed = value;
        }
        Section::Breakdown
    } else if line.starts_with("- Steps:") || line.starts_with("- Subtasks:") {
        Section::BreakdownSteps
    } else if let Some(rest) = line.strip_prefix("- Break at:") {
        let rest = rest.trim();
        if rest.is_empty() {
            // Indices follow on their own line.
            Section::BreakdownBreaks
        } else {
            if let Some(points) = parse_break_points(rest) {
                data.break_points = points;
            }
            Section::Breakdown
        }
    } else if line.starts_with("- Tips:") {
        Section::BreakdownTips
    } else if line.starts_with("- Dopamine hooks:") {
        Section::BreakdownHooks
    } else {
        match section {
            Section::BreakdownSteps => {
                if let Some(rest) = line.strip_prefix('-') {
                    data.subtasks.push(rest.trim().to_string());
                }
                section
            }
            Section::BreakdownTips => {
                if let Some(rest) = line.strip_prefix('-') {
                    data.initiation_tips.push(rest.trim().to_string());
                }
                section
            }
            Section::BreakdownHooks => {
                if let Some(rest) = line.strip_prefix('-') {
                    data.dopamine_hooks.push(rest.trim().to_string());
                }
                section
            }
            Section::BreakdownBreaks => {
                let candidate = line.strip_prefix('-').unwrap_or(line);
                if let Some(points) = parse_break_points(candidate.trim()) {
                    data.break_points = points;
                }
                section
            }
            _ => section,
        }
    }
}

fn parse_leading_int(text: &str) -> Option<i64> {
    text.trim().split_whitespace().next()?.parse().ok()
}

/// "2/3" -> 2; also accepts a bare "2".
fn parse_rating(text: &str) -> Option<i64> {
    text.trim().split('/').next()?.trim().parse().ok()
}

/// All-or-nothing: one malformed element discards the whole list so a
/// previous valid assignment is retained.
fn parse_break_points(text: &str) -> Option<Vec<i64>> {
    text.split(',')
        .map(|part| part.trim().parse().ok())
        .collect()
}

/// First keyword match wins; case-insensitive substring test.
pub fn categorize_ef_support(tip: &str) -> EfCategory {
    let tip_lower = tip.to_lowercase();

    const TABLE: &[(&[&str], EfCategory)] = &[
        (&["start", "begin", "initiate"], EfCategory::TaskInitiation),
        (&["organize", "arrange", "structure"], EfCategory::Organization),
        (&["plan", "schedule", "time"], EfCategory::Planning),
        (&["focus", "attention", "concentrate"], EfCategory::Attention),
        (&["emotion", "feel", "mood"], EfCategory::EmotionalRegulation),
        (&["memory", "remember", "forget"], EfCategory::WorkingMemory),
    ];

    for (keywords, category) in TABLE {
        if keywords.iter().any(|word| tip_lower.contains(word)) {
            return *category;
        }
    }
    EfCategory::General
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmarked_text_yields_empty_bundle() {
        let suggestions = extract_suggestions(
            "Sounds like a busy day!\nRemember to drink water.\n\nYou've got this.",
        );
        assert_eq!(suggestions, ExtractedSuggestions::default());
        assert!(suggestions.task_breakdown.is_none());
    }

    #[test]
    fn simple_markers_collect_into_their_lists() {
        let text = "QUICK_WIN: Put one dish away\n\
                    FOCUS: Silence notifications\n\
                    ENVIRONMENT: Clear your desk\n\
                    START_NOW: Open the document\n\
                    TIME_TIP: Block 25 minutes";
        let s = extract_suggestions(text);

        assert_eq!(s.dopamine_boosters, vec!["Put one dish away"]);
        assert_eq!(s.focus_tips, vec!["Silence notifications"]);
        assert_eq!(s.environment_tips, vec!["Clear your desk"]);
        assert_eq!(s.tasks, vec!["Open the document"]);
        assert_eq!(
            s.calendar_events,
            vec![CalendarSuggestion::time_management("Block 25 minutes")]
        );
    }

    #[test]
    fn breakdown_with_steps_and_deferred_break_points() {
        let text = "BREAKDOWN: Clean kitchen\n- Steps:\n- Wash dishes\n- Wipe counters\n- Break at:\n1";
        let s = extract_suggestions(text);

        let b = s.task_breakdown.expect("breakdown promoted");
        assert_eq!(b.main_task, "Clean kitchen");
        assert_eq!(b.subtasks, vec!["Wash dishes", "Wipe counters"]);
        assert_eq!(b.break_points, vec![1]);
    }

    #[test]
    fn breakdown_without_subtasks_is_dropped() {
        let text = "BREAKDOWN: Clean kitchen\n- Time: 45 minutes\n- Difficulty: 3/3";
        let s = extract_suggestions(text);
        assert!(s.task_breakdown.is_none());
    }

    #[test]
    fn numeric_fields_parse_and_malformed_values_keep_defaults() {
        let text = "BREAKDOWN: Write report\n\
                    - Time: 45 minutes\n\
                    - Difficulty: 3/3\n\
                    - Energy: soon\n\
                    - Steps:\n\
                    - Draft outline";
        let b = extract_suggestions(text).task_breakdown.unwrap();

        assert_eq!(b.estimated_time, 45);
        assert_eq!(b.difficulty_level, 3);
        // "- Energy: soon" is malformed; default retained.
        assert_eq!(b.energy_level_needed, 2);
    }

    #[test]
    fn malformed_time_keeps_default_thirty() {
        let text = "BREAKDOWN: Write report\n- Time: soon\n- Steps:\n- Draft outline";
        let b = extract_suggestions(text).task_breakdown.unwrap();
        assert_eq!(b.estimated_time, 30);
    }

    #[test]
    fn inline_break_points_parse_comma_separated() {
        let text = "BREAKDOWN: Tidy room\n- Steps:\n- Pick up clothes\n- Make bed\n- Break at: 1, 2";
        let b = extract_suggestions(text).task_breakdown.unwrap();
        assert_eq!(b.break_points, vec![1, 2]);
    }

    #[test]
    fn malformed_break_points_are_discarded_wholesale() {
        let text = "BREAKDOWN: Tidy room\n- Steps:\n- Make bed\n- Break at: 1, soon";
        let b = extract_suggestions(text).task_breakdown.unwrap();
        assert!(b.break_points.is_empty());
    }

    #[test]
    fn tips_and_hooks_sub_modes_collect_dashed_lines() {
        let text = "BREAKDOWN: Pack for trip\n\
                    - Steps:\n\
                    - Lay out clothes\n\
                    - Tips:\n\
                    - Start with just one drawer\n\
                    - Dopamine hooks:\n\
                    - Cross each item off the list";
        let b = extract_suggestions(text).task_breakdown.unwrap();

        assert_eq!(b.subtasks, vec!["Lay out clothes"]);
        assert_eq!(b.initiation_tips, vec!["Start with just one drawer"]);
        assert_eq!(b.dopamine_hooks, vec!["Cross each item off the list"]);
    }

    #[test]
    fn ef_supports_are_categorized_by_keyword() {
        let text = "EF_SUPPORT: Start with a 2-minute warmup\n\
                    EF_SUPPORT: Schedule focused blocks\n\
                    EF_SUPPORT: Keep a water bottle nearby";
        let s = extract_suggestions(text);

        assert_eq!(s.ef_supports.len(), 3);
        assert_eq!(s.ef_supports[0].category, EfCategory::TaskInitiation);
        assert_eq!(s.ef_supports[1].category, EfCategory::Planning);
        assert_eq!(s.ef_supports[2].category, EfCategory::General);
    }

    #[test]
    fn first_keyword_match_wins() {
        // "plan" and "focus" both appear; planning comes first in the table.
        assert_eq!(
            categorize_ef_support("Plan your focus sessions"),
            EfCategory::Planning
        );
    }

    #[test]
    fn markers_must_be_at_line_start() {
        let s = extract_suggestions("Try this FOCUS: silence your phone");
        assert!(s.focus_tips.is_empty());
    }

    #[test]
    fn marker_matching_is_case_sensitive() {
        let s = extract_suggestions("focus: lowercase marker is prose");
        assert!(s.focus_tips.is_empty());
    }

    #[test]
    fn plain_lines_after_non_breakdown_marker_are_ignored() {
        let text = "QUICK_WIN: File one paper\n- This dashed line belongs to nothing";
        let s = extract_suggestions(text);
        assert_eq!(s.dopamine_boosters, vec!["File one paper"]);
        assert!(s.task_breakdown.is_none());
    }

    #[test]
    fn second_breakdown_resets_the_accumulator() {
        let text = "BREAKDOWN: First task\n- Steps:\n- Do a thing\n\
                    BREAKDOWN: Second task\n- Time: 10 minutes";
        let s = extract_suggestions(text);
        // The second section has no subtasks, so nothing is promoted.
        assert!(s.task_breakdown.is_none());
    }

    #[test]
    fn indented_markers_are_recognized_after_trim() {
        let s = extract_suggestions("   FOCUS: Noise-cancelling headphones");
        assert_eq!(s.focus_tips, vec!["Noise-cancelling headphones"]);
    }
}
