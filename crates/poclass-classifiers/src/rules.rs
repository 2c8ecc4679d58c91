//! Keyword rule engine
//!
//! An ordered list of keyword rules. A rule fires when any of its keywords is
//! a substring of the lowercased description; the earliest declared rule that
//! fires wins, regardless of where in the text its keyword occurs.

use aho_corasick::AhoCorasick;
use poclass_core::{Error, Result, Triple, NOT_SURE};
use serde::{Deserialize, Serialize};

/// A single keyword rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Keywords, any of which fires the rule
    pub keywords: Vec<String>,

    /// Category assigned when the rule fires
    pub result: Triple,

    /// Confidence reported for this rule (0.0-1.0)
    pub confidence: f64,

    /// Rationale reported for this rule
    pub reason: String,
}

impl Rule {
    /// Create a new rule
    pub fn new<K, S>(keywords: K, result: Triple, confidence: f64, reason: impl Into<String>) -> Self
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            result,
            confidence,
            reason: reason.into(),
        }
    }
}

/// Result of a firing rule
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub triple: Triple,
    pub confidence: f64,
    pub reason: String,
}

/// First-match-wins keyword rule engine
pub struct RuleEngine {
    rules: Vec<Rule>,
    matcher: Option<AhoCorasick>,
    /// Rule index for each pattern in `matcher`
    pattern_rules: Vec<usize>,
}

impl RuleEngine {
    /// Create a rule engine; rules are evaluated in the given order
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        let mut patterns = Vec::new();
        let mut pattern_rules = Vec::new();

        for (index, rule) in rules.iter().enumerate() {
            if !(0.0..=1.0).contains(&rule.confidence) {
                return Err(Error::config(format!(
                    "rule '{}' has confidence {} outside [0, 1]",
                    rule.reason, rule.confidence
                )));
            }
            if rule.keywords.is_empty() {
                return Err(Error::config(format!("rule '{}' has no keywords", rule.reason)));
            }
            for keyword in &rule.keywords {
                if keyword.trim().is_empty() {
                    return Err(Error::config(format!(
                        "rule '{}' has an empty keyword",
                        rule.reason
                    )));
                }
                patterns.push(keyword.to_lowercase());
                pattern_rules.push(index);
            }
        }

        let matcher = if patterns.is_empty() {
            None
        } else {
            Some(AhoCorasick::new(&patterns).map_err(|e| {
                Error::config(format!("Failed to build rule matcher: {}", e))
            })?)
        };

        Ok(Self {
            rules,
            matcher,
            pattern_rules,
        })
    }

    /// Evaluate the rules against a description
    pub fn apply_rules(&self, description: &str) -> Option<RuleMatch> {
        let matcher = self.matcher.as_ref()?;
        let text = description.to_lowercase();

        let index = matcher
            .find_overlapping_iter(&text)
            .map(|m| self.pattern_rules[m.pattern().as_usize()])
            .min()?;

        let rule = &self.rules[index];
        Some(RuleMatch {
            triple: rule.result.clone(),
            confidence: rule.confidence,
            reason: rule.reason.clone(),
        })
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(default_rules()).expect("built-in rules are valid")
    }
}

/// Built-in rule set
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            ["flight", "air ticket", "airfare"],
            Triple::new("T&E", "Air", NOT_SURE),
            0.95,
            "Flight-related keywords detected",
        ),
        Rule::new(
            ["hotel", "accommodation", "stay"],
            Triple::new("T&E", "Hotel", NOT_SURE),
            0.9,
            "Hotel-related expense detected",
        ),
        Rule::new(
            ["insurance", "policy premium"],
            Triple::new("Banking & Financial", "Insurance", NOT_SURE),
            0.95,
            "Insurance-related keywords detected",
        ),
        Rule::new(
            ["laptop", "notebook", "macbook"],
            Triple::new("IT", "Hardware", "Laptop"),
            0.9,
            "Hardware purchase keywords detected",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_fires() {
        let engine = RuleEngine::default();

        let m = engine.apply_rules("Purchase laptop for new hire").unwrap();
        assert_eq!(m.triple, Triple::new("IT", "Hardware", "Laptop"));
        assert_eq!(m.confidence, 0.9);
        assert_eq!(m.reason, "Hardware purchase keywords detected");
    }

    #[test]
    fn test_case_insensitive() {
        let engine = RuleEngine::default();
        let m = engine.apply_rules("FLIGHT to Mumbai").unwrap();
        assert_eq!(m.triple.l2, "Air");
    }

    #[test]
    fn test_declaration_order_wins_over_text_position() {
        let engine = RuleEngine::default();

        // "laptop" appears first in the text but the hotel rule is declared first
        let m = engine.apply_rules("laptop bag left at hotel").unwrap();
        assert_eq!(m.triple.l2, "Hotel");
    }

    #[test]
    fn test_substring_match() {
        let engine = RuleEngine::default();

        // "stay" inside "overstayed" still fires
        let m = engine.apply_rules("overstayed booking").unwrap();
        assert_eq!(m.triple.l2, "Hotel");
    }

    #[test]
    fn test_no_match() {
        let engine = RuleEngine::default();
        assert!(engine.apply_rules("Monthly cloud hosting").is_none());
        assert!(engine.apply_rules("").is_none());
    }

    #[test]
    fn test_empty_engine_never_fires() {
        let engine = RuleEngine::new(Vec::new()).unwrap();
        assert!(engine.apply_rules("laptop").is_none());
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let bad_confidence = Rule::new(["x"], Triple::not_sure(), 1.5, "bad");
        assert!(RuleEngine::new(vec![bad_confidence]).is_err());

        let empty_keyword = Rule::new([" "], Triple::not_sure(), 0.5, "bad");
        assert!(RuleEngine::new(vec![empty_keyword]).is_err());

        let no_keywords = Rule::new(Vec::<String>::new(), Triple::not_sure(), 0.5, "bad");
        assert!(RuleEngine::new(vec![no_keywords]).is_err());
    }

    #[test]
    fn test_mixed_case_keywords_are_normalized() {
        let rule = Rule::new(["MacBook Pro"], Triple::new("IT", "Hardware", "Laptop"), 0.95, "r");
        let engine = RuleEngine::new(vec![rule]).unwrap();
        assert!(engine.apply_rules("two macbook pro units").is_some());
    }

    #[test]
    fn test_rules_deserialize_from_yaml() {
        let yaml = r#"
- keywords: [printer, toner]
  result: { l1: IT, l2: Hardware, l3: Printer }
  confidence: 0.92
  reason: Printer supplies detected
"#;
        let rules: Vec<Rule> = serde_yaml::from_str(yaml).unwrap();
        let engine = RuleEngine::new(rules).unwrap();
        let m = engine.apply_rules("20 toner cartridges").unwrap();
        assert_eq!(m.triple.l3, "Printer");
    }
}
