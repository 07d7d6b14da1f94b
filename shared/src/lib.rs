use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed set of spending categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Food,
    Transport,
    Entertainment,
    Shopping,
    Health,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::Food,
        ExpenseCategory::Transport,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Shopping,
        ExpenseCategory::Health,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Transport => "Transport",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::Shopping => "Shopping",
            ExpenseCategory::Health => "Health",
            ExpenseCategory::Other => "Other",
        }
    }

    /// Chart color used by the analytics views
    pub fn color(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "#f97316",
            ExpenseCategory::Transport => "#3b82f6",
            ExpenseCategory::Entertainment => "#8b5cf6",
            ExpenseCategory::Shopping => "#ec4899",
            ExpenseCategory::Health => "#10b981",
            ExpenseCategory::Other => "#6b7280",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpenseCategory::ALL
            .iter()
            .find(|category| category.as_str() == s.trim())
            .copied()
            .ok_or_else(|| CategoryParseError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryParseError(pub String);

impl fmt::Display for CategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown expense category: {}", self.0)
    }
}

impl std::error::Error for CategoryParseError {}

/// A single logged expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Assigned by the store on creation
    pub id: String,
    /// Always positive
    pub amount: Decimal,
    pub category: ExpenseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Calendar date, serialized as YYYY-MM-DD
    pub date: NaiveDate,
}

/// An expense as submitted by the user, before the store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: Decimal,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
}

impl NewExpense {
    pub fn into_expense(self, id: String) -> Expense {
        Expense {
            id,
            amount: self.amount,
            category: self.category,
            description: self.description,
            date: self.date,
        }
    }
}

/// Year-month identifier, serialized as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BudgetMonth {
    year: i32,
    month: u32,
}

impl BudgetMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, BudgetMonthError> {
        if !(1..=12).contains(&month) {
            return Err(BudgetMonthError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // month is range-checked on construction, day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn days_in_month(&self) -> u32 {
        (self.next().first_day() - self.first_day()).num_days() as u32
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }
}

impl fmt::Display for BudgetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BudgetMonth {
    type Err = BudgetMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| BudgetMonthError::InvalidFormat(s.to_string()))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(BudgetMonthError::InvalidFormat(s.to_string()));
        }
        let year = year
            .parse::<i32>()
            .map_err(|_| BudgetMonthError::InvalidFormat(s.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| BudgetMonthError::InvalidFormat(s.to_string()))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for BudgetMonth {
    type Error = BudgetMonthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BudgetMonth> for String {
    fn from(month: BudgetMonth) -> Self {
        month.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BudgetMonthError {
    InvalidFormat(String),
    MonthOutOfRange(u32),
}

impl fmt::Display for BudgetMonthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetMonthError::InvalidFormat(s) => write!(f, "Invalid month '{}', expected YYYY-MM", s),
            BudgetMonthError::MonthOutOfRange(m) => write!(f, "Month {} is out of range", m),
        }
    }
}

impl std::error::Error for BudgetMonthError {}

/// Monthly savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub amount: Decimal,
    pub month: BudgetMonth,
}

/// Sum of expense amounts for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub color: String,
}

/// Sum of expense amounts for one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Progress towards the current month's savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    /// Goal amount minus spending, never negative
    pub saved: Decimal,
    /// Share of the goal still unspent, capped at 100
    pub progress_percent: Decimal,
    /// Share of the goal already spent, capped at 100
    pub budget_used_percent: Decimal,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeKind {
    Warning,
    Success,
    Info,
}

/// Encouragement message shown next to the goal progress bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalNudge {
    pub message: String,
    pub kind: NudgeKind,
}

/// Filter on expense date relative to today
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyFilter {
    #[default]
    All,
    LastWeek,
    ThisMonth,
}

/// Filter on expense category; `all` keeps everything
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(ExpenseCategory),
}

impl TryFrom<String> for CategoryFilter {
    type Error = CategoryParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            value.parse().map(CategoryFilter::Only)
        }
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        match filter {
            CategoryFilter::All => "all".to_string(),
            CategoryFilter::Only(category) => category.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseSort {
    #[default]
    #[serde(alias = "newest")]
    NewestFirst,
    #[serde(alias = "amount")]
    HighestAmount,
}

/// Query parameters for the expense list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpenseListQuery {
    pub category: Option<CategoryFilter>,
    pub recency: Option<RecencyFilter>,
    pub sort: Option<ExpenseSort>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<Expense>,
    pub loading: bool,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateExpenseResponse {
    pub expense: Expense,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteExpenseResponse {
    pub deleted_id: String,
    pub success_message: String,
}

/// Set the goal for the current month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGoalRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGoalResponse {
    pub goal: SavingsGoal,
    pub success_message: String,
}

/// Goal state for the current month; `goal` is None when no goal applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalStatusResponse {
    pub month: BudgetMonth,
    pub goal: Option<SavingsGoal>,
    pub total_spent_this_month: Decimal,
    pub progress: Option<GoalProgress>,
    pub nudge: Option<GoalNudge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsScope {
    #[default]
    Month,
    All,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    pub scope: Option<AnalyticsScope>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub scope: AnalyticsScope,
    pub category_totals: Vec<CategoryTotal>,
    pub daily_totals: Vec<DailyTotal>,
    pub total: Decimal,
}

/// Type of calendar cell for explicit rendering logic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CalendarDayType {
    /// Empty padding cell before the first day of the month
    PaddingBefore,
    /// Actual day within the month
    MonthDay,
}

/// Month grid with each day's expenses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarMonth {
    pub month: u32,
    pub year: i32,
    pub month_name: String,
    pub first_day_of_week: u32, // 0 = Sunday, 1 = Monday, etc.
    pub days: Vec<CalendarDay>,
    pub total: Decimal,
    pub previous: BudgetMonth,
    pub next: BudgetMonth,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarDay {
    /// 0 for padding cells
    pub day: u32,
    pub date: Option<NaiveDate>,
    pub total: Decimal,
    pub expenses: Vec<Expense>,
    pub day_type: CalendarDayType,
    pub has_expenses: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarMonthRequest {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayDetailRequest {
    pub date: NaiveDate,
}

/// Expenses for a single selected calendar day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayDetail {
    pub date: NaiveDate,
    pub formatted_date: String, // e.g., "Tuesday, March 5, 2024"
    pub expenses: Vec<Expense>,
    pub total: Decimal,
}

/// Lifecycle of the per-session expense state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub status: SyncStatus,
    pub user_id: Option<String>,
    pub expense_count: usize,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Retrying the same request may succeed
    #[serde(default)]
    pub retryable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_category_parse() {
        assert_eq!("Food".parse::<ExpenseCategory>().unwrap(), ExpenseCategory::Food);
        assert_eq!(" Health ".parse::<ExpenseCategory>().unwrap(), ExpenseCategory::Health);
        assert!("Groceries".parse::<ExpenseCategory>().is_err());
        assert!("food".parse::<ExpenseCategory>().is_err());
    }

    #[test]
    fn test_budget_month_parse_and_display() {
        let month: BudgetMonth = "2024-03".parse().unwrap();
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 3);
        assert_eq!(month.to_string(), "2024-03");

        assert!("2024-13".parse::<BudgetMonth>().is_err());
        assert!("2024-3".parse::<BudgetMonth>().is_err());
        assert!("March 2024".parse::<BudgetMonth>().is_err());
    }

    #[test]
    fn test_budget_month_navigation_wraps_year() {
        let january: BudgetMonth = "2024-01".parse().unwrap();
        assert_eq!(january.previous().to_string(), "2023-12");
        let december: BudgetMonth = "2024-12".parse().unwrap();
        assert_eq!(december.next().to_string(), "2025-01");
    }

    #[test]
    fn test_budget_month_contains() {
        let month: BudgetMonth = "2024-02".parse().unwrap();
        assert!(month.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()));
        assert_eq!(month.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_savings_goal_json_shape() {
        let goal = SavingsGoal {
            amount: dec!(500),
            month: "2024-03".parse().unwrap(),
        };
        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["month"], "2024-03");
        assert_eq!(json["amount"], 500.0);

        let parsed: SavingsGoal = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, goal);
    }

    #[test]
    fn test_expense_date_serializes_as_plain_date() {
        let expense = Expense {
            id: "exp-1".to_string(),
            amount: dec!(42.50),
            category: ExpenseCategory::Food,
            description: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        };
        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["date"], "2024-03-05");
        assert_eq!(json["category"], "Food");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_category_filter_from_string() {
        let all: CategoryFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, CategoryFilter::All);
        let food: CategoryFilter = serde_json::from_str("\"Food\"").unwrap();
        assert_eq!(food, CategoryFilter::Only(ExpenseCategory::Food));
        assert!(serde_json::from_str::<CategoryFilter>("\"Rent\"").is_err());
    }

    #[test]
    fn test_sort_accepts_short_aliases() {
        let newest: ExpenseSort = serde_json::from_str("\"newest\"").unwrap();
        assert_eq!(newest, ExpenseSort::NewestFirst);
        let amount: ExpenseSort = serde_json::from_str("\"amount\"").unwrap();
        assert_eq!(amount, ExpenseSort::HighestAmount);
    }
}
