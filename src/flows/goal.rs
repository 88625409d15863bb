//! Add-goal flow: type → name → target amount → commit.

use crate::domain::{fmt_money, points};
use crate::parse;
use crate::state_machine::registry::{register_step, StepHandler};
use crate::state_machine::state::GoalStep as S;
use crate::state_machine::{
    ButtonPayload, CommitAction, Effect, FieldKey, FieldValue, FlowState, InputKind, Outgoing,
    PendingFields, StepInput, StepOutcome,
};
use std::collections::HashMap;

pub fn entry() -> (FlowState, Outgoing) {
    (
        FlowState::AddGoal(S::ChooseKind),
        Outgoing::with_buttons("🎯 Pick a goal type:", super::goal_kind_keyboard()),
    )
}

pub(crate) fn register(table: &mut HashMap<FlowState, StepHandler>) {
    register_step(table, FlowState::AddGoal(S::ChooseKind), InputKind::Button, on_kind);
    register_step(table, FlowState::AddGoal(S::AskName), InputKind::Text, on_name);
    register_step(table, FlowState::AddGoal(S::AskTarget), InputKind::Text, on_target);
}

fn on_kind(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Button(ButtonPayload::GoalKind(kind)) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::AddGoal(S::AskName),
        fields: vec![(FieldKey::GoalKind, FieldValue::GoalKind(*kind))],
        effects: vec![Effect::send(Outgoing::text(
            "Give the goal a name (e.g. Three-month cushion):",
        ))],
    }
}

fn on_name(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(name) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::AddGoal(S::AskTarget),
        fields: vec![(FieldKey::GoalName, FieldValue::Text(name.to_string()))],
        effects: vec![Effect::send(Outgoing::text(
            "What is the target amount? (numbers only)",
        ))],
    }
}

fn on_target(fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(target) = parse::parse_amount(raw) else {
        return StepOutcome::retry("Please enter a valid target amount");
    };
    let (Some(kind), Some(name)) = (fields.goal_kind(), fields.text(FieldKey::GoalName)) else {
        return StepOutcome::Abort;
    };
    let confirmation = format!(
        "✅ Goal created: {} — target {}\n\nTrack it with /goals\n\n+{} XP!",
        name,
        fmt_money(target),
        points::GOAL_ADDED
    );
    StepOutcome::Terminate {
        effects: vec![Effect::commit(
            CommitAction::CreateGoal {
                kind,
                name: name.to_string(),
                target,
            },
            confirmation,
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GoalKind;
    use rust_decimal::Decimal;

    #[test]
    fn full_path_commits_a_goal() {
        let mut fields = PendingFields::default();
        let StepOutcome::Continue { fields: f, .. } = on_kind(
            &fields,
            StepInput::Button(&ButtonPayload::GoalKind(GoalKind::SafetyCushion)),
        ) else {
            panic!("expected Continue");
        };
        for (k, v) in f {
            fields.insert(k, v);
        }
        let StepOutcome::Continue { fields: f, .. } =
            on_name(&fields, StepInput::Text("Three-month cushion"))
        else {
            panic!("expected Continue");
        };
        for (k, v) in f {
            fields.insert(k, v);
        }

        let outcome = on_target(&fields, StepInput::Text("300 000"));
        let StepOutcome::Terminate { effects } = outcome else {
            panic!("expected Terminate");
        };
        assert!(matches!(
            &effects[0],
            Effect::Commit {
                action: CommitAction::CreateGoal {
                    kind: GoalKind::SafetyCushion,
                    target,
                    ..
                },
                ..
            } if *target == Decimal::from(300_000)
        ));
    }

    #[test]
    fn target_rejects_negative() {
        let mut fields = PendingFields::default();
        fields.insert(FieldKey::GoalKind, FieldValue::GoalKind(GoalKind::Savings));
        fields.insert(FieldKey::GoalName, FieldValue::Text("Nest egg".into()));
        assert!(matches!(
            on_target(&fields, StepInput::Text("-100")),
            StepOutcome::Retry { .. }
        ));
    }
}
