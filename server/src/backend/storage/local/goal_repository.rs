use anyhow::Result;
use serde::{Deserialize, Serialize};
use shared::SavingsGoal;
use std::fs;
use tracing::{debug, warn};

use super::connection::{write_atomically, LocalConnection};
use crate::backend::domain::models::{parse_amount, parse_goal_month};

/// YAML shape of the goal file; the amount is kept as text to stay exact
#[derive(Debug, Serialize, Deserialize)]
struct GoalRecord {
    amount: String,
    month: String,
}

impl From<&SavingsGoal> for GoalRecord {
    fn from(goal: &SavingsGoal) -> Self {
        GoalRecord {
            amount: goal.amount.to_string(),
            month: goal.month.to_string(),
        }
    }
}

impl TryFrom<GoalRecord> for SavingsGoal {
    type Error = anyhow::Error;

    fn try_from(record: GoalRecord) -> Result<Self> {
        Ok(SavingsGoal {
            amount: parse_amount(&record.amount)?,
            month: parse_goal_month(&record.month)?,
        })
    }
}

/// YAML-backed single savings goal per user
#[derive(Clone)]
pub struct GoalRepository {
    connection: LocalConnection,
}

impl GoalRepository {
    pub fn new(connection: LocalConnection) -> Self {
        Self { connection }
    }

    /// Read the stored goal; unreadable content is treated as no goal
    pub fn read_goal(&self, user_id: &str) -> Result<Option<SavingsGoal>> {
        let goal_path = self.connection.goal_file_path(user_id)?;
        if !goal_path.exists() {
            return Ok(None);
        }

        let yaml_content = fs::read_to_string(&goal_path)?;
        let parsed = serde_yaml::from_str::<GoalRecord>(&yaml_content)
            .map_err(anyhow::Error::from)
            .and_then(SavingsGoal::try_from);
        match parsed {
            Ok(goal) => Ok(Some(goal)),
            Err(e) => {
                warn!("Ignoring invalid savings goal in {}: {}", goal_path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn write_goal(&self, user_id: &str, goal: &SavingsGoal) -> Result<()> {
        self.connection.ensure_user_directory(user_id)?;
        let goal_path = self.connection.goal_file_path(user_id)?;
        let yaml_content = serde_yaml::to_string(&GoalRecord::from(goal))?;
        write_atomically(&goal_path, yaml_content.as_bytes())?;
        debug!("Saved savings goal for {} to {}", goal.month, goal_path.display());
        Ok(())
    }
}
