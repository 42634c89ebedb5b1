//! FILENAME: core/rule-engine/src/catalog.rs
//! PURPOSE: The built-in library of named rule templates.
//! CONTEXT: Static data built once on first use and never mutated. A
//! configuration front-end lists these by category, lets users search them,
//! and offers the `customizable` ones as starting points for editing.
//! Every template carries examples that its own expression must satisfy.

use crate::builtins;
use crate::dates;
use crate::types::BatchTestCase;
use crate::value::{parse_number, RuleValue};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;

/// Template grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleCategory {
    Text,
    Number,
    Date,
    Logic,
    Business,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 5] = [
        RuleCategory::Text,
        RuleCategory::Number,
        RuleCategory::Date,
        RuleCategory::Logic,
        RuleCategory::Business,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            RuleCategory::Text => "text",
            RuleCategory::Number => "number",
            RuleCategory::Date => "date",
            RuleCategory::Logic => "logic",
            RuleCategory::Business => "business",
        }
    }

    /// Display name for category pickers.
    pub fn label(&self) -> &'static str {
        match self {
            RuleCategory::Text => "Text",
            RuleCategory::Number => "Numbers",
            RuleCategory::Date => "Dates & Times",
            RuleCategory::Logic => "Logic",
            RuleCategory::Business => "Business",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        RuleCategory::ALL.into_iter().find(|category| category.id() == id)
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExample {
    pub value1: &'static str,
    pub value2: &'static str,
    pub expected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: RuleCategory,
    pub expression: &'static str,
    /// Contains constants a user is expected to tune.
    pub customizable: bool,
    pub examples: Vec<TemplateExample>,
}

impl RuleTemplate {
    /// The examples as batch test cases.
    pub fn test_cases(&self) -> Vec<BatchTestCase> {
        self.examples
            .iter()
            .map(|example| BatchTestCase::new(example.value1, example.value2, example.expected))
            .collect()
    }
}

fn template(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: RuleCategory,
    expression: &'static str,
    customizable: bool,
    examples: &[(&'static str, &'static str, bool)],
) -> RuleTemplate {
    RuleTemplate {
        id,
        name,
        description,
        category,
        expression,
        customizable,
        examples: examples
            .iter()
            .map(|&(value1, value2, expected)| TemplateExample {
                value1,
                value2,
                expected,
            })
            .collect(),
    }
}

static TEMPLATES: Lazy<Vec<RuleTemplate>> = Lazy::new(|| {
    use RuleCategory::*;

    vec![
        // ========================================
        // TEXT
        // ========================================
        template(
            "ignore-case",
            "Equal ignoring case",
            "Compares two text values without regard to letter case",
            Text,
            "String(value1).toLowerCase() === String(value2).toLowerCase()",
            false,
            &[("Hello", "HELLO", true), ("World", "word", false)],
        ),
        template(
            "contains",
            "Containment",
            "Either value contains the other",
            Text,
            "String(value1).includes(String(value2)) || String(value2).includes(String(value1))",
            false,
            &[("JavaScript", "Script", true), ("Hello", "World", false)],
        ),
        template(
            "starts-with",
            "Common prefix",
            "Either value starts with the other",
            Text,
            "String(value1).startsWith(String(value2)) || String(value2).startsWith(String(value1))",
            false,
            &[("Invoice-2024", "Invoice", true), ("Invoice", "Receipt", false)],
        ),
        template(
            "ends-with",
            "Common suffix",
            "Either value ends with the other",
            Text,
            "String(value1).endsWith(String(value2)) || String(value2).endsWith(String(value1))",
            false,
            &[("report.pdf", ".pdf", true), ("report.pdf", "report.doc", false)],
        ),
        template(
            "regex-match",
            "Pattern match",
            "Both values match a regular expression (ISO dates by default)",
            Text,
            r#"matches(value1, "^\\d{4}-\\d{2}-\\d{2}$") && matches(value2, "^\\d{4}-\\d{2}-\\d{2}$")"#,
            true,
            &[("2024-01-05", "2024-12-31", true), ("2024-01-05", "05/01/2024", false)],
        ),
        template(
            "trim-equal",
            "Equal after trimming",
            "Ignores leading and trailing whitespace",
            Text,
            "String(value1).trim() === String(value2).trim()",
            false,
            &[(" Alice ", "Alice", true), ("Alice", "Alicia", false)],
        ),
        template(
            "length-equal",
            "Same length",
            "Compares the number of characters",
            Text,
            "String(value1).length === String(value2).length",
            false,
            &[("abc", "xyz", true), ("ab", "abc", false)],
        ),
        template(
            "fuzzy-match",
            "Similar text",
            "Edit-distance similarity at or above a threshold",
            Text,
            "fuzzyMatch(value1, value2, 0.8)",
            true,
            &[("Jonathan", "Jonathon", true), ("apple", "orange", false)],
        ),
        template(
            "same-words",
            "Same words",
            "Equal once punctuation and case are ignored",
            Text,
            r#"extractWords(value1).join(" ").toLowerCase() === extractWords(value2).join(" ").toLowerCase()"#,
            false,
            &[("Hello, World!", "hello world", true), ("Hello World", "Hello there", false)],
        ),
        // ========================================
        // NUMBER
        // ========================================
        template(
            "number-equal",
            "Numerically equal",
            "Converts both values to numbers before comparing",
            Number,
            "Number(value1) === Number(value2)",
            false,
            &[("1.0", "1", true), ("1", "2", false)],
        ),
        template(
            "number-range",
            "Within a distance",
            "The absolute difference is at most a fixed amount",
            Number,
            "Math.abs(Number(value1) - Number(value2)) <= 100",
            true,
            &[("1000", "1050", true), ("1000", "1200", false)],
        ),
        template(
            "percentage-diff",
            "Within a percentage",
            "The relative difference is at most a fraction of the larger value",
            Number,
            "withinPercent(value1, value2, 0.1)",
            true,
            &[("100", "95", true), ("100", "80", false)],
        ),
        template(
            "round-equal",
            "Equal when rounded",
            "Rounds both values to a number of decimals before comparing",
            Number,
            "roundTo(value1, 2) === roundTo(value2, 2)",
            true,
            &[("3.14159", "3.1400", true), ("3.14", "3.15", false)],
        ),
        template(
            "same-sign",
            "Same sign",
            "Both values are negative, or both are not",
            Number,
            "(Number(value1) >= 0) === (Number(value2) >= 0)",
            false,
            &[("5", "12", true), ("-3", "4", false)],
        ),
        template(
            "same-magnitude",
            "Same order of magnitude",
            "Both values have the same number of integer digits",
            Number,
            "Math.floor(Math.log10(Math.abs(Number(value1)))) === Math.floor(Math.log10(Math.abs(Number(value2))))",
            false,
            &[("120", "950", true), ("12", "1200", false)],
        ),
        template(
            "in-same-range",
            "Both in range",
            "Both values fall inside the same closed interval",
            Number,
            "isInRange(value1, 0, 100) && isInRange(value2, 0, 100)",
            true,
            &[("10", "99", true), ("10", "101", false)],
        ),
        // ========================================
        // DATE
        // ========================================
        template(
            "same-date",
            "Same day",
            "Both timestamps fall on the same calendar day",
            Date,
            r#"sameDate(value1, value2, "day")"#,
            false,
            &[("2024-03-01 09:00", "2024-03-01T17:30:00", true), ("2024-03-01", "2024-03-02", false)],
        ),
        template(
            "same-month",
            "Same month",
            "Both dates fall in the same month of the same year",
            Date,
            r#"sameDate(value1, value2, "month")"#,
            false,
            &[("2024-03-01", "2024-03-31", true), ("2024-03-31", "2024-04-01", false)],
        ),
        template(
            "same-year",
            "Same year",
            "Both dates fall in the same year",
            Date,
            r#"sameDate(value1, value2, "year")"#,
            false,
            &[("2024-01-01", "2024-12-31", true), ("2023-12-31", "2024-01-01", false)],
        ),
        template(
            "same-quarter",
            "Same quarter",
            "Both dates fall in the same quarter of the same year",
            Date,
            r#"sameDate(value1, value2, "quarter")"#,
            false,
            &[("2024-01-15", "2024-03-20", true), ("2024-03-31", "2024-04-01", false)],
        ),
        template(
            "same-week",
            "Same week",
            "Both dates fall in the same ISO week",
            Date,
            "isSameWeek(value1, value2)",
            false,
            &[("2024-03-04", "2024-03-10", true), ("2024-03-10", "2024-03-11", false)],
        ),
        template(
            "date-range",
            "Within some days",
            "The dates are at most a number of days apart",
            Date,
            "dateDiffDays(value1, value2) <= 7",
            true,
            &[("2024-03-01", "2024-03-08", true), ("2024-03-01", "2024-03-09", false)],
        ),
        // ========================================
        // LOGIC
        // ========================================
        template(
            "and-condition",
            "AND condition",
            "Equal and not empty",
            Logic,
            "value1 === value2 && String(value1).length > 0",
            true,
            &[("A", "A", true), ("", "", false)],
        ),
        template(
            "or-condition",
            "OR condition",
            "Exactly equal or equal ignoring case",
            Logic,
            "value1 === value2 || String(value1).toLowerCase() === String(value2).toLowerCase()",
            true,
            &[("Yes", "YES", true), ("Yes", "No", false)],
        ),
        template(
            "complex-condition",
            "Compound condition",
            "Equal, or both positive and less than 10 apart",
            Logic,
            "value1 === value2 || (Number(value1) > 0 && Number(value2) > 0 && Math.abs(Number(value1) - Number(value2)) < 10)",
            true,
            &[("15", "20", true), ("15", "30", false), ("-5", "-5", true)],
        ),
        template(
            "blank-joins",
            "Blanks join neighbours",
            "Empty cells merge with whatever is next to them",
            Logic,
            "isEmpty(value1) || isEmpty(value2) || value1 === value2",
            false,
            &[("", "x", true), ("a", "a", true), ("a", "b", false)],
        ),
        // ========================================
        // BUSINESS
        // ========================================
        template(
            "same-category",
            "Same category code",
            "Codes share the part before the first dash",
            Business,
            r#"String(value1).split("-")[0] === String(value2).split("-")[0]"#,
            false,
            &[("A-001", "A-002", true), ("A-001", "B-001", false)],
        ),
        template(
            "same-department",
            "Same department",
            "Both values name the same department",
            Business,
            r#"String(value1).includes("Engineering") && String(value2).includes("Engineering")"#,
            true,
            &[
                ("Engineering - Backend", "Engineering - Frontend", true),
                ("Engineering", "Sales", false),
            ],
        ),
        template(
            "same-status",
            "Same status group",
            "Statuses that mean the same thing merge",
            Business,
            r#"["Done", "Completed"].includes(value1) && ["Done", "Completed"].includes(value2)"#,
            true,
            &[("Done", "Completed", true), ("Done", "Pending", false)],
        ),
        template(
            "same-priority",
            "Same priority band",
            "Groups priorities into high, medium and low bands",
            Business,
            r#"(["High", "Urgent"].includes(value1) && ["High", "Urgent"].includes(value2)) || (["Medium", "Normal"].includes(value1) && ["Medium", "Normal"].includes(value2)) || (["Low"].includes(value1) && ["Low"].includes(value2))"#,
            false,
            &[("High", "Urgent", true), ("Normal", "Medium", true), ("High", "Low", false)],
        ),
        template(
            "amount-range",
            "Same amount band",
            "Amounts below 1,000, below 10,000 or above merge within their band",
            Business,
            "(Number(value1) < 1000 && Number(value2) < 1000) || (Number(value1) >= 1000 && Number(value1) < 10000 && Number(value2) >= 1000 && Number(value2) < 10000) || (Number(value1) >= 10000 && Number(value2) >= 10000)",
            false,
            &[
                ("250", "999", true),
                ("1500", "9999", true),
                ("999", "1000", false),
                ("12000", "50000", true),
            ],
        ),
        template(
            "shared-tags",
            "Shared tag",
            "Comma-separated tag lists with at least one tag in common",
            Business,
            "hasCommonElement(value1, value2)",
            false,
            &[("red,green", "green, blue", true), ("red", "blue", false)],
        ),
    ]
});

// ========================================
// LOOKUP
// ========================================

pub fn all_templates() -> &'static [RuleTemplate] {
    &TEMPLATES
}

pub fn templates_by_category(category: RuleCategory) -> Vec<&'static RuleTemplate> {
    TEMPLATES.iter().filter(|t| t.category == category).collect()
}

pub fn find_template(id: &str) -> Option<&'static RuleTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Case-insensitive substring search over name, description and category.
pub fn search_templates(keyword: &str) -> Vec<&'static RuleTemplate> {
    let keyword = keyword.to_lowercase();
    TEMPLATES
        .iter()
        .filter(|t| {
            t.name.to_lowercase().contains(&keyword)
                || t.description.to_lowercase().contains(&keyword)
                || t.category.id().contains(&keyword)
        })
        .collect()
}

/// Categories with their display labels, in catalog order.
pub fn categories() -> Vec<(RuleCategory, &'static str)> {
    RuleCategory::ALL
        .iter()
        .map(|category| (*category, category.label()))
        .collect()
}

// ========================================
// SUGGESTIONS
// ========================================

/// Samples inspected by `suggest_templates`.
pub const SUGGESTION_SAMPLE_SIZE: usize = 10;

/// Picks templates that suit the shape of some sample values: numbers get
/// number templates, non-numeric text gets text templates, parseable dates
/// get date templates. Fewer than two samples yields nothing.
pub fn suggest_templates<S: AsRef<str>>(samples: &[S]) -> Vec<&'static RuleTemplate> {
    if samples.len() < 2 {
        return Vec::new();
    }

    let sample: Vec<&str> = samples
        .iter()
        .take(SUGGESTION_SAMPLE_SIZE)
        .map(|s| s.as_ref())
        .collect();

    let has_numbers = sample
        .iter()
        .any(|s| builtins::is_numeric(&RuleValue::from(*s)));
    let has_text = sample.iter().any(|s| parse_number(s).is_nan());
    let has_dates = sample.iter().any(|s| dates::parse_date(s).is_some());

    let mut suggestions: Vec<&'static RuleTemplate> = Vec::new();
    let mut add = |category: RuleCategory, count: usize| {
        for template in templates_by_category(category).into_iter().take(count) {
            if !suggestions.iter().any(|existing| existing.id == template.id) {
                suggestions.push(template);
            }
        }
    };

    if has_numbers {
        add(RuleCategory::Number, 3);
    }
    if has_text {
        add(RuleCategory::Text, 3);
    }
    if has_dates {
        add(RuleCategory::Date, 2);
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(templates: &[&RuleTemplate]) -> Vec<&'static str> {
        templates.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for template in all_templates() {
            assert!(seen.insert(template.id), "duplicate id {}", template.id);
        }
    }

    #[test]
    fn test_every_template_has_examples() {
        for template in all_templates() {
            assert!(!template.examples.is_empty(), "{} has no examples", template.id);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(find_template("ignore-case").unwrap().category, RuleCategory::Text);
        assert!(find_template("nope").is_none());
        assert_eq!(templates_by_category(RuleCategory::Date).len(), 6);
        assert_eq!(categories().len(), 5);
        assert_eq!(RuleCategory::from_id("logic"), Some(RuleCategory::Logic));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let found = ids(&search_templates("PERCENT"));
        assert_eq!(found, vec!["percentage-diff"]);

        // Category ids match too
        assert_eq!(search_templates("business").len(), templates_by_category(RuleCategory::Business).len());
        assert_eq!(search_templates("").len(), all_templates().len());
    }

    #[test]
    fn test_suggestions_by_sample_shape() {
        assert!(suggest_templates(&["42"]).is_empty());

        assert_eq!(
            ids(&suggest_templates(&["100", "250.5"])),
            vec!["number-equal", "number-range", "percentage-diff"]
        );
        assert_eq!(
            ids(&suggest_templates(&["Alice", "Bob"])),
            vec!["ignore-case", "contains", "starts-with"]
        );
        assert_eq!(
            ids(&suggest_templates(&["2024-03-01", "2024-04-01"])),
            vec!["ignore-case", "contains", "starts-with", "same-date", "same-month"]
        );
    }

    #[test]
    fn test_suggestions_only_inspect_first_samples() {
        let mut samples = vec!["text"; SUGGESTION_SAMPLE_SIZE];
        samples.push("42");
        let suggested = ids(&suggest_templates(&samples));
        assert!(!suggested.contains(&"number-equal"));
    }

    #[test]
    fn test_serializes_for_front_end() {
        let json = serde_json::to_value(find_template("same-status").unwrap()).unwrap();
        assert_eq!(json["category"], "business");
        assert_eq!(json["customizable"], true);
        assert_eq!(json["examples"][0]["value1"], "Done");
    }
}
