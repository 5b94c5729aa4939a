//! Rule evaluation: angle set + mode to a single-frame verdict.

use crate::angles::AngleSet;
use crate::mode::AnalysisMode;
use crate::rules::rule_table;
use crate::verdict::{FrameVerdict, Issue, ScoringConfig, ISSUE_NO_JOINTS};

/// Apply the rule table for `mode` to `angles`.
///
/// Rules are walked in table order. A rule whose joint was not measured (or
/// was measured invalid) is skipped and reports the joint as not visible at
/// that position. If no rule could be checked at all, the frame is an
/// "Analysis Error" with a null score.
pub fn evaluate(mode: AnalysisMode, angles: &AngleSet, scoring: &ScoringConfig) -> FrameVerdict {
    let rules = rule_table(mode);
    let mut issues = Vec::with_capacity(rules.len());
    let mut missing = Vec::new();
    let mut checked = 0usize;

    for rule in rules {
        match angles.degrees(rule.joint) {
            Some(degrees) => {
                checked += 1;
                if !rule.range.contains(degrees) {
                    issues.push(Issue::violation(rule.joint, rule.issue, degrees));
                }
            }
            None => {
                if !missing.contains(&rule.joint) {
                    missing.push(rule.joint);
                    issues.push(Issue::missing_joint(rule.joint));
                }
            }
        }
    }

    if checked == 0 {
        return FrameVerdict::analysis_error(Issue::frame(ISSUE_NO_JOINTS));
    }

    FrameVerdict::scored(issues, scoring)
}
