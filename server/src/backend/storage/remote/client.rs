//! HTTP client for the hosted expense tables.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use shared::{Expense, NewExpense, SavingsGoal};
use std::time::Duration;
use tracing::{debug, warn};

use super::records::{
    active_status_filter, ExpenseRow, NewExpenseRow, SavingsGoalPayload, SavingsGoalRow,
    EXPENSES_TABLE, SAVINGS_GOALS_TABLE,
};
use crate::backend::domain::{BudgetError, CalendarTimezone};
use crate::backend::storage::traits::ExpenseStore;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const PREFER: HeaderName = HeaderName::from_static("prefer");
const API_KEY: HeaderName = HeaderName::from_static("apikey");

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    #[serde(default)]
    id: Value,
}

/// [`ExpenseStore`] backed by a PostgREST endpoint.
///
/// `base_url` is the REST root, e.g. `https://<project>.supabase.co/rest/v1`.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    timezone: CalendarTimezone,
}

impl RestStore {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        timezone: CalendarTimezone,
    ) -> Result<Self, BudgetError> {
        if base_url.trim().is_empty() {
            return Err(BudgetError::Config("remote base_url must not be empty".to_string()));
        }
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| BudgetError::Config(format!("Invalid API key format: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| BudgetError::Config(format!("Invalid API key format: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY, key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BudgetError::Config(format!("Failed to initialize HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
            timezone,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        to_error: fn(String) -> BudgetError,
    ) -> Result<String, BudgetError> {
        let response = request
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| to_error(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| to_error(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                if let Some(msg) = err.message.or(err.error) {
                    return Err(to_error(format!("API error {}: {}", status, msg)));
                }
            }
            return Err(to_error(format!(
                "API error {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(body)
    }

    fn parse<T: DeserializeOwned>(body: &str, to_error: fn(String) -> BudgetError) -> Result<T, BudgetError> {
        serde_json::from_str(body).map_err(|e| to_error(format!("Failed to parse response: {}", e)))
    }

    async fn active_goal_rows(&self, user_id: &str, select: &str) -> Result<String, BudgetError> {
        let url = self.table_url(SAVINGS_GOALS_TABLE);
        debug!("[RestStore] GET {} (active goal for {})", url, user_id);
        let request = self.client.get(&url).query(&[
            ("select", select.to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("status", active_status_filter()),
            ("order", "created_at.desc".to_string()),
            ("limit", "1".to_string()),
        ]);
        self.send(request, BudgetError::RemoteRead).await
    }
}

#[async_trait]
impl ExpenseStore for RestStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn list_expenses(&self, user_id: &str) -> Result<Vec<Expense>, BudgetError> {
        let url = self.table_url(EXPENSES_TABLE);
        debug!("[RestStore] GET {} for {}", url, user_id);
        let request = self.client.get(&url).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "date.desc".to_string()),
        ]);
        let body = self.send(request, BudgetError::RemoteRead).await?;
        let rows: Vec<ExpenseRow> = Self::parse(&body, BudgetError::RemoteRead)?;

        let mut expenses = Vec::with_capacity(rows.len());
        for row in rows {
            match Expense::try_from(row) {
                Ok(expense) => expenses.push(expense),
                Err(e) => warn!("Dropping invalid expense row: {}", e),
            }
        }
        Ok(expenses)
    }

    async fn create_expense(&self, user_id: &str, expense: &NewExpense) -> Result<Expense, BudgetError> {
        let url = self.table_url(EXPENSES_TABLE);
        debug!("[RestStore] POST {}", url);
        let request = self
            .client
            .post(&url)
            .header(PREFER, "return=representation")
            .json(&[NewExpenseRow::new(user_id, expense)]);
        let body = self.send(request, BudgetError::RemoteWrite).await?;
        let rows: Vec<ExpenseRow> = Self::parse(&body, BudgetError::RemoteWrite)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| BudgetError::RemoteWrite("Insert returned no row".to_string()))?;
        Ok(Expense::try_from(row)?)
    }

    async fn delete_expense(&self, user_id: &str, expense_id: &str) -> Result<(), BudgetError> {
        let url = self.table_url(EXPENSES_TABLE);
        debug!("[RestStore] DELETE {} id={}", url, expense_id);
        let request = self.client.delete(&url).query(&[
            ("id", format!("eq.{}", expense_id)),
            ("user_id", format!("eq.{}", user_id)),
        ]);
        self.send(request, BudgetError::RemoteWrite).await?;
        Ok(())
    }

    async fn get_active_goal(&self, user_id: &str) -> Result<Option<SavingsGoal>, BudgetError> {
        let body = self.active_goal_rows(user_id, "*").await?;
        let rows: Vec<SavingsGoalRow> = Self::parse(&body, BudgetError::RemoteRead)?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        match row.into_goal(self.timezone.today()) {
            Ok(goal) => Ok(Some(goal)),
            Err(e) => {
                warn!("Ignoring invalid savings goal row: {}", e);
                Ok(None)
            }
        }
    }

    async fn upsert_goal(&self, user_id: &str, goal: &SavingsGoal) -> Result<SavingsGoal, BudgetError> {
        let body = self
            .active_goal_rows(user_id, "id")
            .await
            .map_err(|e| BudgetError::RemoteWrite(e.to_string()))?;
        let existing: Vec<IdRow> = Self::parse(&body, BudgetError::RemoteWrite)?;
        let existing_id = existing.into_iter().find_map(|row| match row.id {
            Value::String(id) if !id.is_empty() => Some(id),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        });

        let url = self.table_url(SAVINGS_GOALS_TABLE);
        let payload = SavingsGoalPayload::new(user_id, goal);
        let request = match existing_id {
            Some(id) => {
                debug!("[RestStore] PATCH {} id={}", url, id);
                self.client.patch(&url).query(&[("id", format!("eq.{}", id))]).json(&payload)
            }
            None => {
                debug!("[RestStore] POST {}", url);
                self.client.post(&url).json(&[payload])
            }
        };
        self.send(request.header(PREFER, "return=minimal"), BudgetError::RemoteWrite)
            .await?;
        Ok(goal.clone())
    }
}
