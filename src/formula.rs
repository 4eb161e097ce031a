//! Derived-column formulas.
//!
//! A formula spec is a block of text with one `target = expression` per
//! line. Lines without `=` are ignored. Expressions reference column values
//! through `[ColumnName]` tokens and are otherwise plain arithmetic handled
//! by [`crate::expr`].
//!
//! Evaluation is per-record: each record gets a working copy, formula lines
//! run in file order, and every `[ColumnName]` read comes from that working
//! copy. A later line therefore sees the writes of earlier lines on the same
//! record, never values from other records. A failing line writes `0` for
//! its target and the pass continues.

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    data::{Record, Value, format_number},
    expr,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FormulaLine {
    pub target: String,
    pub expression: String,
}

fn column_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\]]*)\]").expect("valid column-ref pattern"))
}

/// Splits a formula spec into ordered `(target, expression)` pairs. Only
/// lines containing `=` count; the line is split on its first `=` and both
/// sides are trimmed. An empty side is kept as-is: an empty expression fails
/// evaluation and zeroes its target like any other malformed line.
pub fn parse_formulas(spec: &str) -> Vec<FormulaLine> {
    spec.lines()
        .filter_map(|line| {
            let (target, expression) = line.split_once('=')?;
            Some(FormulaLine {
                target: target.trim().to_string(),
                expression: expression.trim().to_string(),
            })
        })
        .collect()
}

/// Target column names a spec introduces, in file order, deduplicated.
pub fn formula_targets(spec: &str) -> Vec<String> {
    use itertools::Itertools;
    parse_formulas(spec)
        .into_iter()
        .map(|line| line.target)
        .unique()
        .collect()
}

/// Applies a formula spec to every record independently. Identity when the
/// spec is blank.
pub fn apply_formulas(rows: &[Record], spec: &str) -> Vec<Record> {
    if spec.trim().is_empty() {
        return rows.to_vec();
    }
    let lines = parse_formulas(spec);
    if lines.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .map(|row| {
            let mut working = row.clone();
            for line in &lines {
                let result = evaluate_line(line, &working);
                working.insert(line.target.clone(), Value::Number(result));
            }
            working
        })
        .collect()
}

fn evaluate_line(line: &FormulaLine, working: &Record) -> f64 {
    let substituted = substitute_refs(&line.expression, working);
    match expr::evaluate(&substituted) {
        // Malformed expressions and non-finite results both zero the target;
        // the remaining lines and records still evaluate. Finiteness is
        // checked after rounding, which can itself overflow near f64::MAX.
        Ok(value) => {
            let rounded = round2(value);
            if rounded.is_finite() { rounded } else { 0.0 }
        }
        Err(_) => 0.0,
    }
}

/// Replaces every `[ColumnName]` token with the numeric value of that column
/// read from the working record, defaulting to 0 when absent or non-numeric.
fn substitute_refs(expression: &str, working: &Record) -> String {
    column_ref_pattern()
        .replace_all(expression, |caps: &regex::Captures<'_>| {
            let value = working
                .get(&caps[1])
                .map(Value::numeric_or_zero)
                .unwrap_or(0.0);
            format_number(value)
        })
        .into_owned()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, f64)]) -> Record {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), Value::Number(*value)))
            .collect()
    }

    #[test]
    fn parse_keeps_only_assignment_lines() {
        let spec = "Profit = [Revenue] - [Cost]\njust a note\n  Margin=[Profit]/[Revenue]  \n";
        let lines = parse_formulas(spec);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].target, "Profit");
        assert_eq!(lines[1].expression, "[Profit]/[Revenue]");
    }

    #[test]
    fn splits_on_first_equals_only() {
        let lines = parse_formulas("X = [A] = 2");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].expression, "[A] = 2");
    }

    #[test]
    fn later_lines_see_earlier_writes() {
        let rows = vec![record(&[("A", 10.0)])];
        let out = apply_formulas(&rows, "B = [A] * 2\nC = [B] + 1");
        assert_eq!(out[0].get("B"), Some(&Value::Number(20.0)));
        assert_eq!(out[0].get("C"), Some(&Value::Number(21.0)));
    }

    #[test]
    fn missing_reference_defaults_to_zero() {
        let rows = vec![record(&[("A", 5.0)])];
        let out = apply_formulas(&rows, "B = [Nope] + [A]");
        assert_eq!(out[0].get("B"), Some(&Value::Number(5.0)));
    }

    #[test]
    fn results_round_to_two_decimals() {
        let rows = vec![record(&[("A", 10.0)])];
        let out = apply_formulas(&rows, "B = [A] / 3");
        assert_eq!(out[0].get("B"), Some(&Value::Number(3.33)));
    }

    #[test]
    fn empty_expression_zeroes_the_target_on_every_record() {
        let rows = vec![record(&[("A", 4.0)]), record(&[("A", 9.0)])];
        let out = apply_formulas(&rows, "X =\nY = [A] + 1");
        assert_eq!(out[0].get("X"), Some(&Value::Number(0.0)));
        assert_eq!(out[1].get("X"), Some(&Value::Number(0.0)));
        assert_eq!(out[0].get("Y"), Some(&Value::Number(5.0)));
        assert_eq!(formula_targets("X =\nY = [A] + 1"), vec!["X", "Y"]);
    }

    #[test]
    fn rounding_overflow_zeroes_the_target() {
        // 1e308 is finite, but scaling by 100 during rounding is not.
        let rows = vec![record(&[("A", 1.0e308)])];
        let out = apply_formulas(&rows, "B = [A]");
        assert_eq!(out[0].get("B"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn blank_spec_is_identity() {
        let rows = vec![record(&[("A", 1.0)])];
        let out = apply_formulas(&rows, "   \n  ");
        assert_eq!(out, rows);
    }
}
