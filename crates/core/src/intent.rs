//! Intent types produced by the keyword classifiers

use serde::{Deserialize, Serialize};

/// A single classifiable intent.
///
/// Classifiers are independent predicates; several may fire on the same
/// message. Precedence is decided by the reply-selection chain, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Asking for the price ("quanto custa", "valor", ...)
    PriceQuestion,
    /// Ready to buy / asking for the payment link
    CheckoutIntent,
    /// "too expensive" signal
    PriceObjection,
    /// Did not understand the last message
    Confusion,
    /// Generic interest ("como funciona", "garantia", ...)
    Interest,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::PriceQuestion => "price_question",
            Intent::CheckoutIntent => "checkout_intent",
            Intent::PriceObjection => "price_objection",
            Intent::Confusion => "confusion",
            Intent::Interest => "interest",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of running every classifier over one normalized message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectedIntents {
    pub price_question: bool,
    pub checkout: bool,
    pub objection: bool,
    pub confusion: bool,
    pub interest: bool,
}

impl DetectedIntents {
    /// Set the flag for one intent
    pub fn set(&mut self, intent: Intent) {
        match intent {
            Intent::PriceQuestion => self.price_question = true,
            Intent::CheckoutIntent => self.checkout = true,
            Intent::PriceObjection => self.objection = true,
            Intent::Confusion => self.confusion = true,
            Intent::Interest => self.interest = true,
        }
    }

    /// Intents that fired, in classifier table order
    pub fn fired(&self) -> Vec<Intent> {
        let mut out = Vec::new();
        if self.price_question {
            out.push(Intent::PriceQuestion);
        }
        if self.checkout {
            out.push(Intent::CheckoutIntent);
        }
        if self.objection {
            out.push(Intent::PriceObjection);
        }
        if self.confusion {
            out.push(Intent::Confusion);
        }
        if self.interest {
            out.push(Intent::Interest);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_intents_set_and_fired() {
        let mut detected = DetectedIntents::default();
        assert!(detected.fired().is_empty());

        detected.set(Intent::PriceQuestion);
        detected.set(Intent::PriceObjection);
        assert_eq!(
            detected.fired(),
            vec![Intent::PriceQuestion, Intent::PriceObjection]
        );
    }
}
