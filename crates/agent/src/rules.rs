//! Declarative intent rule table
//!
//! Each classifier is one row: an intent plus its keyword set, evaluated
//! in a fixed order against the normalized text. Classifiers are
//! independent and may all fire on the same message; precedence belongs to
//! the reply-selection chain, not here.

use zap_agent_config::KeywordRules;
use zap_agent_core::{DetectedIntents, Intent};

use crate::normalize::contains_any;

/// Compiled rule table built once from config
#[derive(Debug, Clone)]
pub struct RuleSet {
    rows: Vec<(Intent, Vec<String>)>,
    objection_keys: Vec<String>,
}

impl RuleSet {
    /// Build the table from the configured keyword sets.
    ///
    /// `objection_keys` are the canned-answer keys tried by the reply
    /// chain before falling back to the model.
    pub fn new(keywords: &KeywordRules, objection_keys: Vec<String>) -> Self {
        let rows = vec![
            (Intent::PriceQuestion, keywords.price.clone()),
            (Intent::CheckoutIntent, keywords.checkout.clone()),
            (Intent::PriceObjection, keywords.objection.clone()),
            (Intent::Confusion, keywords.confusion.clone()),
            (Intent::Interest, keywords.interest.clone()),
        ];
        Self {
            rows,
            objection_keys,
        }
    }

    /// Run every classifier over one normalized message
    pub fn detect(&self, normalized: &str) -> DetectedIntents {
        let mut detected = DetectedIntents::default();
        for (intent, keywords) in &self.rows {
            if contains_any(normalized, keywords) {
                detected.set(*intent);
            }
        }
        detected
    }

    /// First canned-answer key contained in the normalized text
    pub fn objection_key(&self, normalized: &str) -> Option<&str> {
        self.objection_keys
            .iter()
            .find(|k| normalized.contains(k.as_str()))
            .map(|k| k.as_str())
    }
}
