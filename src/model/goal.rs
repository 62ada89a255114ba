use crate::model::Amount;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A row from the savings_goals table.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SavingsGoal {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) current: Decimal,
    pub(crate) target: Decimal,
    /// Free text such as "December 2023".
    pub(crate) deadline: Option<String>,
}

impl SavingsGoal {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn current(&self) -> Amount {
        Amount::new(self.current)
    }

    pub fn target(&self) -> Amount {
        Amount::new(self.target)
    }

    pub fn deadline(&self) -> Option<&str> {
        self.deadline.as_deref()
    }

    /// Whole percent of the target that has been saved.
    pub fn progress(&self) -> u8 {
        percent(self.current, self.target)
    }

    /// How much is left to save. Never negative.
    pub fn remaining(&self) -> Amount {
        Amount::new((self.target - self.current).max(Decimal::ZERO))
    }
}

/// Combined progress across every savings goal.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
pub struct SavingsProgress {
    pub current: Amount,
    pub target: Amount,
    pub percent: u8,
    pub goals: usize,
}

impl SavingsProgress {
    pub fn from_goals<'a>(goals: impl IntoIterator<Item = &'a SavingsGoal>) -> Self {
        let mut current = Decimal::ZERO;
        let mut target = Decimal::ZERO;
        let mut count = 0;
        for goal in goals {
            current = current.saturating_add(goal.current);
            target = target.saturating_add(goal.target);
            count += 1;
        }
        Self {
            current: Amount::new(current),
            target: Amount::new(target),
            percent: percent(current, target),
            goals: count,
        }
    }
}

/// `floor(current / target * 100)` clamped to `0..=100`. A target that is not positive gives 0.
fn percent(current: Decimal, target: Decimal) -> u8 {
    if target <= Decimal::ZERO || current <= Decimal::ZERO {
        return 0;
    }
    // Only a ratio far beyond 100% can overflow here.
    let ratio = current
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(target))
        .or_else(|| {
            current
                .checked_div(target)
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        })
        .unwrap_or(Decimal::MAX)
        .floor();
    ratio.min(Decimal::ONE_HUNDRED).to_u8().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(title: &str, current: i64, target: i64) -> SavingsGoal {
        SavingsGoal {
            id: title.to_lowercase(),
            title: title.to_string(),
            description: None,
            current: Decimal::from(current),
            target: Decimal::from(target),
            deadline: None,
        }
    }

    #[test]
    fn test_progress_floors() {
        assert_eq!(goal("Emergency Fund", 1240, 5000).progress(), 24);
        assert_eq!(goal("New Laptop", 540, 1200).progress(), 45);
        assert_eq!(goal("Vacation", 250, 2000).progress(), 12);
    }

    #[test]
    fn test_progress_edges() {
        assert_eq!(goal("Done", 3000, 2000).progress(), 100);
        assert_eq!(goal("No target", 10, 0).progress(), 0);
        assert_eq!(goal("Nothing yet", 0, 100).progress(), 0);
    }

    #[test]
    fn test_huge_amounts_saturate() {
        let mut huge = goal("Moon", 0, 1);
        huge.current = Decimal::MAX;
        huge.target = Decimal::MAX;
        assert_eq!(huge.progress(), 100);

        let mut tiny_target = goal("Penny", 0, 1);
        tiny_target.current = Decimal::MAX;
        tiny_target.target = Decimal::new(1, 2);
        assert_eq!(tiny_target.progress(), 100);

        let progress = SavingsProgress::from_goals(&vec![huge.clone(), huge]);
        assert_eq!(progress.current.value(), Decimal::MAX);
        assert_eq!(progress.target.value(), Decimal::MAX);
        assert_eq!(progress.percent, 100);
        assert_eq!(progress.goals, 2);
    }

    #[test]
    fn test_remaining() {
        assert_eq!(
            goal("Vacation", 250, 2000).remaining().value(),
            Decimal::from(1750)
        );
        assert_eq!(goal("Done", 3000, 2000).remaining().value(), Decimal::ZERO);
    }

    #[test]
    fn test_combined_progress() {
        let goals = vec![
            goal("Emergency Fund", 1240, 5000),
            goal("New Laptop", 540, 1200),
            goal("Vacation", 250, 2000),
        ];
        let progress = SavingsProgress::from_goals(&goals);
        assert_eq!(progress.current.value(), Decimal::from(2030));
        assert_eq!(progress.target.value(), Decimal::from(8200));
        assert_eq!(progress.percent, 24);
        assert_eq!(progress.goals, 3);
    }

    #[test]
    fn test_combined_progress_empty() {
        let progress = SavingsProgress::from_goals(&Vec::<SavingsGoal>::new());
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.goals, 0);
    }
}
