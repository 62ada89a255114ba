//! Handlers for `finny goal`.

use crate::args::{ContributeArgs, GoalAddArgs};
use crate::commands::Out;
use crate::model::{SavingsGoal, SavingsProgress};
use crate::{Config, Result};
use serde::Serialize;

pub async fn goal_add(config: Config, args: &GoalAddArgs) -> Result<Out<SavingsGoal>> {
    let goal = config
        .db()
        .insert_goal(
            args.title(),
            args.description().map(String::from),
            args.target().value(),
            args.deadline().map(String::from),
        )
        .await?;
    Ok(Out::new(
        format!(
            "Added savings goal '{}' with a target of {}",
            goal.title(),
            goal.target()
        ),
        goal,
    ))
}

/// Every goal plus the combined progress.
#[derive(Debug, Clone, Serialize)]
pub struct GoalList {
    pub goals: Vec<SavingsGoal>,
    pub progress: SavingsProgress,
}

pub async fn goal_list(config: Config) -> Result<Out<GoalList>> {
    let goals = config.db().list_goals().await?;
    let progress = SavingsProgress::from_goals(&goals);
    let mut message = String::new();
    if goals.is_empty() {
        message.push_str("No savings goals yet");
    }
    for goal in &goals {
        message.push_str(&format!(
            "{}: {} of {} ({}%)",
            goal.title(),
            goal.current(),
            goal.target(),
            goal.progress()
        ));
        if let Some(deadline) = goal.deadline() {
            message.push_str(&format!(", due {deadline}"));
        }
        message.push('\n');
    }
    if !goals.is_empty() {
        message.push_str(&format!(
            "Total saved: {} of {} ({}%)",
            progress.current, progress.target, progress.percent
        ));
    }
    Ok(Out::new(message, GoalList { goals, progress }))
}

pub async fn goal_contribute(config: Config, args: &ContributeArgs) -> Result<Out<SavingsGoal>> {
    let goal = config
        .db()
        .contribute_to_goal(args.goal(), args.amount().value())
        .await?;
    Ok(Out::new(
        format!(
            "'{}' is at {} of {} ({}%), {} to go",
            goal.title(),
            goal.current(),
            goal.target(),
            goal.progress(),
            goal.remaining()
        ),
        goal,
    ))
}
