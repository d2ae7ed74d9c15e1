//! Conversation types including sales stages and turns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sales funnel stage.
///
/// The stage is a classification aid for prompt construction and guard
/// thresholds, not a hard workflow gate: a user can jump straight to
/// `Decision` or `ObjectionHandling` on their first message. Stages only
/// ever move forward (see [`SalesStage::ratchet`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum SalesStage {
    /// First contact, no prior turns
    #[default]
    ColdOpen,
    /// At least one exchange happened, understanding the lead
    Diagnosing,
    /// Interest signal detected, building value
    ValueBuilding,
    /// Price or checkout signal detected
    Decision,
    /// Price objection raised
    ObjectionHandling,
}

impl SalesStage {
    /// Numeric index (0-4) used in prompts and logs
    pub fn index(&self) -> u8 {
        match self {
            SalesStage::ColdOpen => 0,
            SalesStage::Diagnosing => 1,
            SalesStage::ValueBuilding => 2,
            SalesStage::Decision => 3,
            SalesStage::ObjectionHandling => 4,
        }
    }

    /// Monotone update: returns the later of the two stages.
    ///
    /// Every stage assignment in the transition rules goes through this,
    /// so no rule can regress the funnel.
    pub fn ratchet(self, target: SalesStage) -> SalesStage {
        self.max(target)
    }

    /// Whether the session is considered sales-ready (hand-off eligible)
    pub fn is_sales_ready(&self) -> bool {
        *self >= SalesStage::Decision
    }

    /// Stage-specific guidance injected into the system prompt
    pub fn prompt_guidance(&self) -> &'static str {
        match self {
            SalesStage::ColdOpen => {
                "Primeiro contato. Seja acolhedora e descubra o que a pessoa procura."
            },
            SalesStage::Diagnosing => {
                "Entenda a situacao atual da pessoa antes de falar de produto."
            },
            SalesStage::ValueBuilding => {
                "A pessoa demonstrou interesse. Mostre valor pratico, sem citar precos."
            },
            SalesStage::Decision => {
                "A pessoa perguntou preco ou quer comprar. Conduza para a decisao com seguranca."
            },
            SalesStage::ObjectionHandling => {
                "A pessoa achou caro. Valide a preocupacao e reforce o retorno, sem pressionar."
            },
        }
    }
}

impl std::fmt::Display for SalesStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "STAGE_{}", self.index())
    }
}

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// Inbound message from the lead
    User,
    /// Outbound message from the agent
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single turn in the conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Role of the speaker
    pub role: TurnRole,
    /// Content of the turn
    pub content: String,
    /// When the turn occurred
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new turn
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}
