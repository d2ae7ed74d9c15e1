//! Stage/guard state machine
//!
//! Transition rules are evaluated per inbound text in a fixed order; a
//! later rule may raise the stage further within the same turn. Every
//! assignment goes through `SalesStage::ratchet`, so the stage never
//! regresses (see DESIGN.md for the ratchet decision).

use zap_agent_core::{DetectedIntents, SalesStage};

/// Result of one transition evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageUpdate {
    pub stage: SalesStage,
    /// True when a price objection was detected this turn
    /// (the caller increments `expensive_count` exactly once)
    pub objection_detected: bool,
}

/// Evaluate the transition rules for one inbound message.
///
/// Rule order:
/// 1. ColdOpen with prior history -> Diagnosing
/// 2. Interest -> ValueBuilding
/// 3. PriceQuestion or CheckoutIntent -> Decision
/// 4. PriceObjection -> ObjectionHandling (+ objection counter)
pub fn evaluate_transitions(
    current: SalesStage,
    history_turns: usize,
    intents: DetectedIntents,
) -> StageUpdate {
    let mut stage = current;

    if stage == SalesStage::ColdOpen && history_turns > 0 {
        stage = stage.ratchet(SalesStage::Diagnosing);
    }
    if intents.interest {
        stage = stage.ratchet(SalesStage::ValueBuilding);
    }
    if intents.price_question || intents.checkout {
        stage = stage.ratchet(SalesStage::Decision);
    }
    if intents.objection {
        stage = stage.ratchet(SalesStage::ObjectionHandling);
    }

    StageUpdate {
        stage,
        objection_detected: intents.objection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intents() -> DetectedIntents {
        DetectedIntents::default()
    }

    #[test]
    fn test_first_followup_turn_moves_to_diagnosing() {
        let update = evaluate_transitions(SalesStage::ColdOpen, 2, intents());
        assert_eq!(update.stage, SalesStage::Diagnosing);

        // No history yet: stays cold
        let update = evaluate_transitions(SalesStage::ColdOpen, 0, intents());
        assert_eq!(update.stage, SalesStage::ColdOpen);
    }

    #[test]
    fn test_interest_builds_value() {
        let mut i = intents();
        i.interest = true;
        let update = evaluate_transitions(SalesStage::ColdOpen, 0, i);
        assert_eq!(update.stage, SalesStage::ValueBuilding);
    }

    #[test]
    fn test_user_can_jump_straight_to_decision() {
        let mut i = intents();
        i.price_question = true;
        let update = evaluate_transitions(SalesStage::ColdOpen, 0, i);
        assert_eq!(update.stage, SalesStage::Decision);
    }

    #[test]
    fn test_objection_wins_within_same_turn() {
        // "quanto custa, tá caro" fires price + objection; rule 4 runs last
        let mut i = intents();
        i.price_question = true;
        i.objection = true;
        let update = evaluate_transitions(SalesStage::Diagnosing, 4, i);
        assert_eq!(update.stage, SalesStage::ObjectionHandling);
        assert!(update.objection_detected);
    }

    #[test]
    fn test_stage_never_regresses() {
        // A price question after an objection does not pull the stage back
        let mut i = intents();
        i.price_question = true;
        let update = evaluate_transitions(SalesStage::ObjectionHandling, 6, i);
        assert_eq!(update.stage, SalesStage::ObjectionHandling);

        // Small talk after decision keeps the stage
        let update = evaluate_transitions(SalesStage::Decision, 6, intents());
        assert_eq!(update.stage, SalesStage::Decision);
    }
}
