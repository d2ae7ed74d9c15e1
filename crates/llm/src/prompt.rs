//! Prompt building
//!
//! Constructs the stage-conditioned system prompt for the sales agent.
//! The business rules the model tends to violate (multiple prices, the
//! special price, unprompted links) are restated here and then enforced
//! again by the output guards in the agent crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use zap_agent_config::SalesConfig;
use zap_agent_core::SalesStage;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Build the system prompt for one model call, parameterized by the
/// session's stage and objection count.
pub fn build_system_prompt(
    sales: &SalesConfig,
    stage: SalesStage,
    expensive_count: u32,
) -> String {
    let special_rule = if expensive_count >= sales.special_price_threshold {
        format!(
            "- A pessoa ja reclamou do preco {} vezes; voce PODE oferecer o preco especial de R$ {}.",
            expensive_count, sales.price_special
        )
    } else {
        format!(
            "- NUNCA mencione R$ {}. O preco especial so existe depois de {} objecoes de preco.",
            sales.price_special, sales.special_price_threshold
        )
    };

    format!(
        "Você é {persona}, consultora premium da Sia Mega.\n\
         Converse como humana real no WhatsApp Brasil.\n\
         \n\
         Regras:\n\
         - 1 frase + 1 pergunta, sempre termine com UMA pergunta\n\
         - Nunca diga que é IA\n\
         - Linguagem simples e natural\n\
         - Nunca liste mais de um preço na mesma mensagem\n\
         - Nunca envie link de pagamento sem a pessoa pedir\n\
         {special_rule}\n\
         \n\
         Produto:\n\
         {product} é um método prático e validado para iniciantes criarem renda digital com direção.\n\
         \n\
         Estágio: {stage}\n\
         {guidance}\n\
         \n\
         Preço:\n\
         R$ {full} (oficial)\n\
         R$ {offer} (oferta)",
        persona = sales.persona_name,
        special_rule = special_rule,
        product = sales.product_name,
        stage = stage,
        guidance = stage.prompt_guidance(),
        full = sales.price_full,
        offer = sales.price_offer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_stage_and_prices() {
        let sales = SalesConfig::default();
        let prompt = build_system_prompt(&sales, SalesStage::Decision, 0);
        assert!(prompt.contains("STAGE_3"));
        assert!(prompt.contains("R$ 299"));
        assert!(prompt.contains("R$ 195"));
    }

    #[test]
    fn test_special_price_forbidden_below_threshold() {
        let sales = SalesConfig::default();
        let prompt = build_system_prompt(&sales, SalesStage::ObjectionHandling, 1);
        assert!(prompt.contains("NUNCA mencione R$ 125"));
    }

    #[test]
    fn test_special_price_allowed_at_threshold() {
        let sales = SalesConfig::default();
        let prompt = build_system_prompt(&sales, SalesStage::ObjectionHandling, 2);
        assert!(prompt.contains("PODE oferecer o preco especial de R$ 125"));
    }
}
