//! Sales playbook configuration
//!
//! Everything the reply chain and the output guards need: prices, payment
//! links, keyword rule tables, canned replies, objection answers and the
//! typing-delay tiers. All fields have serde defaults matching the live
//! playbook so the agent runs with an empty config file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sales playbook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesConfig {
    /// Product display name
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Agent persona name used in the system prompt
    #[serde(default = "default_persona_name")]
    pub persona_name: String,

    /// Official price (BRL, whole units)
    #[serde(default = "default_price_full")]
    pub price_full: u32,

    /// Discounted offer price
    #[serde(default = "default_price_offer")]
    pub price_offer: u32,

    /// Deepest discount, only released after repeated objections
    #[serde(default = "default_price_special")]
    pub price_special: u32,

    /// Checkout link for the offer price
    #[serde(default = "default_offer_link")]
    pub offer_link: String,

    /// Minimum seconds between two link sends for the same session
    #[serde(default = "default_link_cooldown")]
    pub link_cooldown_seconds: u64,

    /// Objection count required before the special price may surface
    #[serde(default = "default_special_threshold")]
    pub special_price_threshold: u32,

    /// Maximum characters of a dispatched reply (guard truncation)
    #[serde(default = "default_reply_max_chars")]
    pub reply_max_chars: usize,

    /// Inbound messages shorter than this get the clarifying question
    #[serde(default = "default_min_inbound_chars")]
    pub min_inbound_chars: usize,

    /// Number of recent history turns fed to the model
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Hard cap on retained history turns per session
    #[serde(default = "default_history_max_turns")]
    pub history_max_turns: usize,

    /// Keyword rule tables for the intent classifiers
    #[serde(default)]
    pub keywords: KeywordRules,

    /// Canned answers for known objection keys, tried before the model
    #[serde(default = "default_objection_answers")]
    pub objection_answers: BTreeMap<String, String>,

    /// Canned clarifying question (too short / confused / empty model reply)
    #[serde(default = "default_clarify_reply")]
    pub clarify_reply: String,

    /// Canned fallback when the model call fails
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,

    /// Canned reply for image/video/document messages
    #[serde(default = "default_non_text_reply")]
    pub non_text_reply: String,

    /// Simulated human-typing delay tiers
    #[serde(default)]
    pub typing_delay: TypingDelayConfig,
}

fn default_product_name() -> String {
    "Mapa Diamond".to_string()
}
fn default_persona_name() -> String {
    "Sarah".to_string()
}
fn default_price_full() -> u32 {
    299
}
fn default_price_offer() -> u32 {
    195
}
fn default_price_special() -> u32 {
    125
}
fn default_offer_link() -> String {
    "https://pay.kiwify.com.br/raiY3qd".to_string()
}
fn default_link_cooldown() -> u64 {
    120
}
fn default_special_threshold() -> u32 {
    2
}
fn default_reply_max_chars() -> usize {
    700
}
fn default_min_inbound_chars() -> usize {
    4
}
fn default_history_window() -> usize {
    8
}
fn default_history_max_turns() -> usize {
    50
}

fn default_objection_answers() -> BTreeMap<String, String> {
    let mut answers = BTreeMap::new();
    answers.insert(
        "funciona".to_string(),
        "Funciona sim 🙂 O metodo e passo a passo, pensado pra quem esta comecando do zero.\n\
         Voce ja tentou algo parecido antes?"
            .to_string(),
    );
    answers.insert(
        "suporte".to_string(),
        "Tem suporte direto comigo por aqui, todos os dias 🙂\n\
         Quer que eu te explique como funciona o acompanhamento?"
            .to_string(),
    );
    answers.insert(
        "garantia".to_string(),
        "Tem garantia de 7 dias: se nao fizer sentido pra voce, devolvemos tudo 🙂\n\
         O que mais te deixaria segura pra comecar?"
            .to_string(),
    );
    answers.insert(
        "parcelamento".to_string(),
        "Da pra parcelar no cartao sim 🙂\n\
         Prefere a vista ou parcelado?"
            .to_string(),
    );
    answers
}

fn default_clarify_reply() -> String {
    "Perfeito, vou explicar melhor 🙂\nVocê quer entender como funciona o método ou o valor?"
        .to_string()
}
fn default_fallback_reply() -> String {
    "Entendi 🙂\nVocê busca renda extra ou algo mais consistente?".to_string()
}
fn default_non_text_reply() -> String {
    "Recebi sua mensagem 🙂\nVocê pode me explicar em texto o que precisa?".to_string()
}

impl Default for SalesConfig {
    fn default() -> Self {
        Self {
            product_name: default_product_name(),
            persona_name: default_persona_name(),
            price_full: default_price_full(),
            price_offer: default_price_offer(),
            price_special: default_price_special(),
            offer_link: default_offer_link(),
            link_cooldown_seconds: default_link_cooldown(),
            special_price_threshold: default_special_threshold(),
            reply_max_chars: default_reply_max_chars(),
            min_inbound_chars: default_min_inbound_chars(),
            history_window: default_history_window(),
            history_max_turns: default_history_max_turns(),
            keywords: KeywordRules::default(),
            objection_answers: default_objection_answers(),
            clarify_reply: default_clarify_reply(),
            fallback_reply: default_fallback_reply(),
            non_text_reply: default_non_text_reply(),
            typing_delay: TypingDelayConfig::default(),
        }
    }
}

/// Keyword rule tables for the intent classifiers.
///
/// Keywords are matched against normalized text (lowercase, diacritics
/// stripped), so entries must be diacritic-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRules {
    #[serde(default = "default_price_keywords")]
    pub price: Vec<String>,

    #[serde(default = "default_checkout_keywords")]
    pub checkout: Vec<String>,

    #[serde(default = "default_objection_keywords")]
    pub objection: Vec<String>,

    #[serde(default = "default_confusion_keywords")]
    pub confusion: Vec<String>,

    #[serde(default = "default_interest_keywords")]
    pub interest: Vec<String>,
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn default_price_keywords() -> Vec<String> {
    strings(&["preco", "valor", "quanto", "custa"])
}
fn default_checkout_keywords() -> Vec<String> {
    strings(&[
        "quero comprar",
        "comprar",
        "pagar",
        "manda o link",
        "link de pagamento",
        "pix",
        "cartao",
        "boleto",
        "finalizar",
    ])
}
fn default_objection_keywords() -> Vec<String> {
    strings(&["caro", "muito caro", "ta caro"])
}
fn default_confusion_keywords() -> Vec<String> {
    strings(&["como assim", "nao entendi", "ha", "hein", "?"])
}
fn default_interest_keywords() -> Vec<String> {
    strings(&["funciona", "como funciona", "suporte", "garantia"])
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self {
            price: default_price_keywords(),
            checkout: default_checkout_keywords(),
            objection: default_objection_keywords(),
            confusion: default_confusion_keywords(),
            interest: default_interest_keywords(),
        }
    }
}

/// Simulated human-typing delay before each outbound send.
///
/// The delay blocks only the worker of the sender it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingDelayConfig {
    /// Disable entirely (tests, load tooling)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Delay for replies longer than `long_len` chars
    #[serde(default = "default_long_ms")]
    pub long_ms: u64,

    /// Delay for replies longer than `medium_len` chars
    #[serde(default = "default_medium_ms")]
    pub medium_ms: u64,

    /// Delay for everything else
    #[serde(default = "default_short_ms")]
    pub short_ms: u64,

    /// Absolute minimum delay
    #[serde(default = "default_floor_ms")]
    pub floor_ms: u64,

    #[serde(default = "default_long_len")]
    pub long_len: usize,

    #[serde(default = "default_medium_len")]
    pub medium_len: usize,
}

fn default_true() -> bool {
    true
}
fn default_long_ms() -> u64 {
    15000
}
fn default_medium_ms() -> u64 {
    8000
}
fn default_short_ms() -> u64 {
    3000
}
fn default_floor_ms() -> u64 {
    1500
}
fn default_long_len() -> usize {
    240
}
fn default_medium_len() -> usize {
    80
}

impl Default for TypingDelayConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            long_ms: default_long_ms(),
            medium_ms: default_medium_ms(),
            short_ms: default_short_ms(),
            floor_ms: default_floor_ms(),
            long_len: default_long_len(),
            medium_len: default_medium_len(),
        }
    }
}

impl TypingDelayConfig {
    /// Delay in milliseconds for a reply of the given length
    pub fn delay_ms(&self, reply_len: usize) -> u64 {
        if !self.enabled {
            return 0;
        }
        let ms = if reply_len > self.long_len {
            self.long_ms
        } else if reply_len > self.medium_len {
            self.medium_ms
        } else {
            self.short_ms
        };
        ms.max(self.floor_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_playbook_values() {
        let sales = SalesConfig::default();
        assert_eq!(sales.price_full, 299);
        assert_eq!(sales.price_offer, 195);
        assert_eq!(sales.price_special, 125);
        assert_eq!(sales.special_price_threshold, 2);
        assert!(sales.objection_answers.contains_key("garantia"));
    }

    #[test]
    fn test_typing_delay_tiers() {
        let delay = TypingDelayConfig::default();
        assert_eq!(delay.delay_ms(10), 3000);
        assert_eq!(delay.delay_ms(100), 8000);
        assert_eq!(delay.delay_ms(300), 15000);
    }

    #[test]
    fn test_typing_delay_floor_and_disable() {
        let mut delay = TypingDelayConfig::default();
        delay.short_ms = 100;
        assert_eq!(delay.delay_ms(10), 1500);

        delay.enabled = false;
        assert_eq!(delay.delay_ms(10), 0);
    }
}
