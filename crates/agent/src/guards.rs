//! Post-processing guards
//!
//! Applied only to model-generated replies, as one pure composed pass:
//! URL stripping, currency-amount stripping, special-price substitution,
//! length cap and the empty-reply fallback. Canned replies skip this
//! entirely; they are trusted by construction.

use once_cell::sync::Lazy;
use regex::Regex;

use zap_agent_config::SalesConfig;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://\S+").expect("valid url regex"));

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"R\$\s*\d+(?:[.,]\d+)?").expect("valid price regex"));

/// Per-turn facts the guards depend on
#[derive(Debug, Clone, Copy)]
pub struct GuardContext {
    /// Checkout intent detected in the triggering message
    pub checkout_intent: bool,
    /// Price question detected in the triggering message
    pub price_question: bool,
    /// Session already had the price explained
    pub price_explained: bool,
    /// Session objection counter
    pub expensive_count: u32,
}

/// Compiled guard set, built once from the sales config
#[derive(Debug, Clone)]
pub struct GuardSet {
    special_re: Regex,
    offer_price: u32,
    special_threshold: u32,
    max_chars: usize,
    min_chars: usize,
    clarify_reply: String,
}

impl GuardSet {
    pub fn new(sales: &SalesConfig) -> Self {
        // Whole-number match so e.g. "1250" is left alone
        let special_re = Regex::new(&format!(r"\b{}\b", sales.price_special))
            .expect("valid special price regex");
        Self {
            special_re,
            offer_price: sales.price_offer,
            special_threshold: sales.special_price_threshold,
            max_chars: sales.reply_max_chars,
            min_chars: 2,
            clarify_reply: sales.clarify_reply.clone(),
        }
    }

    /// Apply all guards to one model reply
    pub fn apply(&self, reply: &str, ctx: GuardContext) -> String {
        let mut text = reply.trim().to_string();

        if !ctx.checkout_intent {
            text = URL_RE.replace_all(&text, "[link]").into_owned();
        }

        if !ctx.price_explained && !ctx.price_question {
            text = PRICE_RE.replace_all(&text, "").into_owned();
        }

        if ctx.expensive_count < self.special_threshold {
            text = self
                .special_re
                .replace_all(&text, self.offer_price.to_string().as_str())
                .into_owned();
        }

        text = truncate_chars(text.trim(), self.max_chars);

        if text.chars().count() < self.min_chars {
            return self.clarify_reply.clone();
        }
        text
    }
}

/// Truncate to a character budget, appending an ellipsis marker
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", keep)
}
