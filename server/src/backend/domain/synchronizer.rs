//! Client state synchronizer.
//!
//! Owns the signed-in user's expenses and savings goal and mediates every
//! read and write between the REST layer and the configured [`ExpenseStore`].
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --sign_in--> Loading --fetch done--> Ready
//!                               ^                      |
//!                               +--sign_in / refetch---+
//! any state --sign_out--> Ready (no user, no data)
//! ```
//!
//! ## Rules
//!
//! - A command only touches local state after the store accepted it; on
//!   failure the in-memory data is left exactly as it was.
//! - Every identity change bumps an epoch and every fetch bumps a sequence
//!   number. Results carrying an outdated stamp are dropped, so a late fetch
//!   for a previous user can never leak into the current session.
//! - Commands are not serialized against each other. Each one reconciles
//!   only the record it touched. A delete racing a refetch is not guarded:
//!   whichever lands last wins.

use shared::{Expense, NewExpense, SavingsGoal, SyncStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::errors::BudgetError;
use super::models::{validate_expense, validate_goal, validate_new_expense};
use crate::backend::storage::ExpenseStore;

/// Point-in-time copy of the session state handed to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    pub user_id: Option<String>,
    pub status: SyncStatus,
    /// Newest first by date
    pub expenses: Vec<Expense>,
    pub goal: Option<SavingsGoal>,
    pub last_error: Option<String>,
}

impl SyncSnapshot {
    pub fn loading(&self) -> bool {
        self.status == SyncStatus::Loading
    }
}

#[derive(Debug)]
struct SessionState {
    identity_epoch: u64,
    fetch_seq: u64,
    user_id: Option<String>,
    status: SyncStatus,
    expenses: Vec<Expense>,
    goal: Option<SavingsGoal>,
    last_error: Option<String>,
}

impl SessionState {
    fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            user_id: self.user_id.clone(),
            status: self.status,
            expenses: self.expenses.clone(),
            goal: self.goal.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Identity stamp taken when a command starts
struct Ticket {
    user_id: String,
    epoch: u64,
}

#[derive(Clone)]
pub struct ExpenseSynchronizer {
    store: Arc<dyn ExpenseStore>,
    state: Arc<Mutex<SessionState>>,
    updates: Arc<watch::Sender<SyncSnapshot>>,
}

impl ExpenseSynchronizer {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        let state = SessionState {
            identity_epoch: 0,
            fetch_seq: 0,
            user_id: None,
            status: SyncStatus::Uninitialized,
            expenses: Vec::new(),
            goal: None,
            last_error: None,
        };
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            store,
            state: Arc::new(Mutex::new(state)),
            updates: Arc::new(updates),
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.lock_state().snapshot()
    }

    /// Receive a fresh snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.updates.subscribe()
    }

    pub fn current_user(&self) -> Option<String> {
        self.lock_state().user_id.clone()
    }

    /// Sign in (or switch to) `user_id` and load their data.
    ///
    /// Previous state is discarded before the fetch starts. Returns
    /// `Superseded` if another identity change happened while loading. A
    /// refetch overtaking this load is not an error: its result wins.
    pub async fn sign_in(&self, user_id: impl Into<String>) -> Result<(), BudgetError> {
        let user_id = user_id.into();
        let (epoch, seq) = {
            let mut state = self.lock_state();
            state.identity_epoch += 1;
            state.fetch_seq += 1;
            state.user_id = Some(user_id.clone());
            state.status = SyncStatus::Loading;
            state.expenses.clear();
            state.goal = None;
            state.last_error = None;
            self.publish(&state);
            (state.identity_epoch, state.fetch_seq)
        };
        info!("Signed in as {}, loading data from {} store", user_id, self.store.name());
        self.load(user_id, epoch, seq).await
    }

    /// Drop all session data; the synchronizer becomes an empty `Ready`
    pub fn sign_out(&self) {
        let mut state = self.lock_state();
        if let Some(user_id) = state.user_id.take() {
            info!("Signed out {}", user_id);
        }
        state.identity_epoch += 1;
        state.fetch_seq += 1;
        state.status = SyncStatus::Ready;
        state.expenses.clear();
        state.goal = None;
        state.last_error = None;
        self.publish(&state);
    }

    /// Reload the current user's data, superseding any fetch in flight
    pub async fn refetch(&self) -> Result<(), BudgetError> {
        let (user_id, epoch, seq) = {
            let mut state = self.lock_state();
            let user_id = state.user_id.clone().ok_or(BudgetError::NotSignedIn)?;
            state.fetch_seq += 1;
            state.status = SyncStatus::Loading;
            self.publish(&state);
            (user_id, state.identity_epoch, state.fetch_seq)
        };
        debug!("Refetching data for {}", user_id);
        self.load(user_id, epoch, seq).await
    }

    async fn load(&self, user_id: String, epoch: u64, seq: u64) -> Result<(), BudgetError> {
        let (expenses, goal) = tokio::join!(
            self.store.list_expenses(&user_id),
            self.store.get_active_goal(&user_id)
        );

        let mut state = self.lock_state();
        if state.identity_epoch != epoch {
            warn!("Discarding fetch result for {}: identity changed", user_id);
            return Err(BudgetError::Superseded);
        }
        if state.fetch_seq != seq {
            // A newer fetch for the same user owns the state now
            debug!("Discarding outdated fetch result for {}", user_id);
            return Ok(());
        }

        let mut failures = Vec::new();
        state.expenses = match expenses {
            Ok(mut expenses) => {
                expenses.sort_by(|a, b| b.date.cmp(&a.date));
                expenses
            }
            Err(e) => {
                error!("Failed to load expenses for {}: {}", user_id, e);
                failures.push(e);
                Vec::new()
            }
        };
        state.goal = match goal {
            Ok(goal) => goal,
            Err(e) => {
                error!("Failed to load savings goal for {}: {}", user_id, e);
                failures.push(e);
                None
            }
        };
        state.status = SyncStatus::Ready;
        state.last_error = failures.first().map(|e| e.to_string());
        self.publish(&state);

        match failures.into_iter().next() {
            Some(e) => Err(e),
            None => {
                info!("Loaded {} expenses for {}", state.expenses.len(), user_id);
                Ok(())
            }
        }
    }

    /// Persist a new expense, then add it to the local list
    pub async fn add_expense(&self, expense: NewExpense) -> Result<Expense, BudgetError> {
        let expense = validate_new_expense(expense)?;
        let ticket = self.ticket()?;

        let created = self
            .store
            .create_expense(&ticket.user_id, &expense)
            .await
            .inspect_err(|e| error!("Failed to add expense for {}: {}", ticket.user_id, e))?;
        let created = validate_expense(created)?;

        self.apply(&ticket, |state| {
            if state.expenses.iter().any(|e| e.id == created.id) {
                return;
            }
            // Newest first; a new record goes ahead of others on the same date
            let position = state.expenses.partition_point(|e| e.date > created.date);
            state.expenses.insert(position, created.clone());
        })?;

        info!("Added expense {} ({} {})", created.id, created.amount, created.category);
        Ok(created)
    }

    /// Delete remotely first; the local record goes only once the store agreed
    pub async fn delete_expense(&self, expense_id: &str) -> Result<(), BudgetError> {
        let ticket = self.ticket()?;

        self.store
            .delete_expense(&ticket.user_id, expense_id)
            .await
            .inspect_err(|e| error!("Failed to delete expense {}: {}", expense_id, e))?;

        self.apply(&ticket, |state| state.expenses.retain(|e| e.id != expense_id))?;
        info!("Deleted expense {}", expense_id);
        Ok(())
    }

    /// Set the savings goal; a later call for the same month overwrites it
    pub async fn update_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal, BudgetError> {
        let goal = validate_goal(goal)?;
        let ticket = self.ticket()?;

        let stored = self
            .store
            .upsert_goal(&ticket.user_id, &goal)
            .await
            .inspect_err(|e| error!("Failed to update savings goal: {}", e))?;
        let stored = validate_goal(stored)?;

        self.apply(&ticket, |state| state.goal = Some(stored.clone()))?;
        info!("Savings goal for {} set to {}", stored.month, stored.amount);
        Ok(stored)
    }

    fn ticket(&self) -> Result<Ticket, BudgetError> {
        let state = self.lock_state();
        let user_id = state.user_id.clone().ok_or(BudgetError::NotSignedIn)?;
        Ok(Ticket {
            user_id,
            epoch: state.identity_epoch,
        })
    }

    /// Mutate state for a finished command unless the identity moved on meanwhile
    fn apply(&self, ticket: &Ticket, mutate: impl FnOnce(&mut SessionState)) -> Result<(), BudgetError> {
        let mut state = self.lock_state();
        if state.identity_epoch != ticket.epoch {
            warn!("Ignoring completed command for {}: identity changed", ticket.user_id);
            return Err(BudgetError::Superseded);
        }
        mutate(&mut state);
        self.publish(&state);
        Ok(())
    }

    fn publish(&self, state: &SessionState) {
        self.updates.send_replace(state.snapshot());
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::aggregation::category_totals;
    use crate::backend::storage::test_utils::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use shared::ExpenseCategory;
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stored(id: &str, amount: Decimal, on: NaiveDate) -> Expense {
        Expense {
            id: id.to_string(),
            amount,
            category: ExpenseCategory::Transport,
            description: None,
            date: on,
        }
    }

    fn new_expense(amount: Decimal, category: ExpenseCategory, on: NaiveDate, description: &str) -> NewExpense {
        NewExpense {
            amount,
            category,
            description: Some(description.to_string()),
            date: on,
        }
    }

    fn setup() -> (ExpenseSynchronizer, Arc<MemoryStore>) {
        let store = MemoryStore::new();
        let sync = ExpenseSynchronizer::new(store.clone());
        (sync, store)
    }

    async fn wait_for_state(sync: &ExpenseSynchronizer, check: impl FnMut(&SyncSnapshot) -> bool) {
        let mut rx = sync.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(check))
            .await
            .expect("timed out waiting for state")
            .expect("synchronizer dropped");
    }

    #[tokio::test]
    async fn test_starts_uninitialized() {
        let (sync, _store) = setup();
        let snapshot = sync.snapshot();
        assert_eq!(snapshot.status, SyncStatus::Uninitialized);
        assert!(snapshot.user_id.is_none());
        assert!(snapshot.expenses.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_loads_newest_first() {
        let (sync, store) = setup();
        store.seed(
            "alice",
            vec![
                stored("old", dec!(5), date(2024, 1, 1)),
                stored("new", dec!(7), date(2024, 3, 1)),
                stored("mid", dec!(6), date(2024, 2, 1)),
            ],
        );
        store.seed_goal("alice", SavingsGoal { amount: dec!(500), month: "2024-03".parse().unwrap() });

        sync.sign_in("alice").await.unwrap();

        let snapshot = sync.snapshot();
        assert_eq!(snapshot.status, SyncStatus::Ready);
        assert_eq!(snapshot.user_id.as_deref(), Some("alice"));
        let ids: Vec<&str> = snapshot.expenses.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert_eq!(snapshot.goal.unwrap().amount, dec!(500));
    }

    #[tokio::test]
    async fn test_failed_load_yields_empty_ready_state_and_refetch_recovers() {
        let (sync, store) = setup();
        store.seed("alice", vec![stored("a", dec!(5), date(2024, 1, 1))]);
        store.set_fail_reads(true);

        let result = sync.sign_in("alice").await;
        assert!(matches!(result, Err(BudgetError::RemoteRead(_))));
        let snapshot = sync.snapshot();
        assert_eq!(snapshot.status, SyncStatus::Ready);
        assert!(snapshot.expenses.is_empty());
        assert!(snapshot.last_error.is_some());

        store.set_fail_reads(false);
        sync.refetch().await.unwrap();
        let snapshot = sync.snapshot();
        assert_eq!(snapshot.expenses.len(), 1);
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_add_then_delete_updates_category_totals() {
        let (sync, store) = setup();
        sync.sign_in("alice").await.unwrap();

        let created = sync
            .add_expense(new_expense(dec!(42.50), ExpenseCategory::Food, date(2024, 3, 5), "lunch"))
            .await
            .unwrap();
        assert_eq!(store.stored_expenses("alice").len(), 1);

        let totals = category_totals(&sync.snapshot().expenses);
        let food = totals.iter().find(|t| t.category == ExpenseCategory::Food).unwrap();
        assert_eq!(food.amount, dec!(42.50));

        sync.delete_expense(&created.id).await.unwrap();
        let totals = category_totals(&sync.snapshot().expenses);
        assert!(totals.iter().all(|t| t.category != ExpenseCategory::Food));
        assert!(store.stored_expenses("alice").is_empty());
    }

    #[tokio::test]
    async fn test_failed_add_leaves_state_untouched() {
        let (sync, store) = setup();
        store.seed("alice", vec![stored("a", dec!(5), date(2024, 1, 1))]);
        sync.sign_in("alice").await.unwrap();
        let before = sync.snapshot();

        store.set_fail_writes(true);
        let result = sync
            .add_expense(new_expense(dec!(3), ExpenseCategory::Food, date(2024, 1, 2), "coffee"))
            .await;

        assert!(matches!(result, Err(BudgetError::RemoteWrite(_))));
        assert_eq!(sync.snapshot(), before);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_local_record() {
        let (sync, store) = setup();
        store.seed("alice", vec![stored("a", dec!(5), date(2024, 1, 1))]);
        sync.sign_in("alice").await.unwrap();

        store.set_fail_writes(true);
        assert!(matches!(sync.delete_expense("a").await, Err(BudgetError::RemoteWrite(_))));
        assert_eq!(sync.snapshot().expenses.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_expense_never_reaches_store() {
        let (sync, store) = setup();
        sync.sign_in("alice").await.unwrap();

        let result = sync
            .add_expense(new_expense(dec!(0), ExpenseCategory::Food, date(2024, 1, 2), "free"))
            .await;
        assert!(matches!(result, Err(BudgetError::Validation(_))));
        assert!(store.stored_expenses("alice").is_empty());
    }

    #[tokio::test]
    async fn test_commands_require_signed_in_user() {
        let (sync, _store) = setup();
        let result = sync
            .add_expense(new_expense(dec!(1), ExpenseCategory::Food, date(2024, 1, 2), "x"))
            .await;
        assert_eq!(result, Err(BudgetError::NotSignedIn));
        assert_eq!(sync.delete_expense("x").await, Err(BudgetError::NotSignedIn));
        assert_eq!(sync.refetch().await, Err(BudgetError::NotSignedIn));
    }

    #[tokio::test]
    async fn test_concurrent_adds_both_land_regardless_of_completion_order() {
        let (sync, store) = setup();
        sync.sign_in("alice").await.unwrap();
        let first_gate = store.hold_create("first");

        let slow = {
            let sync = sync.clone();
            tokio::spawn(async move {
                sync.add_expense(new_expense(dec!(10), ExpenseCategory::Food, date(2024, 3, 1), "first"))
                    .await
            })
        };
        let fast = sync
            .add_expense(new_expense(dec!(20), ExpenseCategory::Health, date(2024, 3, 2), "second"))
            .await
            .unwrap();
        first_gate.notify_one();
        let slow = slow.await.unwrap().unwrap();

        let snapshot = sync.snapshot();
        let ids: Vec<&str> = snapshot.expenses.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![fast.id.as_str(), slow.id.as_str()]);
    }

    #[tokio::test]
    async fn test_identity_change_discards_late_fetch_of_previous_user() {
        let (sync, store) = setup();
        store.seed(
            "alice",
            vec![
                stored("a1", dec!(1), date(2024, 3, 1)),
                stored("a2", dec!(2), date(2024, 3, 2)),
                stored("a3", dec!(3), date(2024, 3, 3)),
            ],
        );
        sync.sign_in("alice").await.unwrap();
        assert_eq!(sync.snapshot().expenses.len(), 3);

        // Alice's refetch stalls in the store
        let alice_gate = store.hold_list("alice");
        let alice_fetch = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.refetch().await })
        };
        wait_for_state(&sync, |s| s.status == SyncStatus::Loading).await;

        // Bob signs in while Alice's fetch is still pending
        let bob_gate = store.hold_list("bob");
        let bob_sign_in = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.sign_in("bob").await })
        };
        wait_for_state(&sync, |s| s.user_id.as_deref() == Some("bob")).await;

        let snapshot = sync.snapshot();
        assert!(snapshot.expenses.is_empty());
        assert_eq!(snapshot.status, SyncStatus::Loading);

        alice_gate.notify_one();
        assert_eq!(alice_fetch.await.unwrap(), Err(BudgetError::Superseded));
        assert!(sync.snapshot().expenses.is_empty());
        assert_eq!(sync.snapshot().user_id.as_deref(), Some("bob"));

        bob_gate.notify_one();
        bob_sign_in.await.unwrap().unwrap();
        let snapshot = sync.snapshot();
        assert_eq!(snapshot.status, SyncStatus::Ready);
        assert!(snapshot.expenses.is_empty());
    }

    async fn wait_for_list_calls(store: &MemoryStore, calls: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while store.list_calls() < calls {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("timed out waiting for list calls");
    }

    #[tokio::test]
    async fn test_refetch_during_sign_in_does_not_fail_the_sign_in() {
        let (sync, store) = setup();
        store.seed("alice", vec![stored("a1", dec!(4), date(2024, 3, 1))]);
        let gate = store.hold_list("alice");

        let sign_in = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.sign_in("alice").await })
        };
        wait_for_list_calls(&store, 1).await;

        let refetch = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.refetch().await })
        };
        wait_for_list_calls(&store, 2).await;

        gate.notify_waiters();
        assert_eq!(sign_in.await.unwrap(), Ok(()));
        assert_eq!(refetch.await.unwrap(), Ok(()));

        let snapshot = sync.snapshot();
        assert_eq!(snapshot.status, SyncStatus::Ready);
        assert_eq!(snapshot.user_id.as_deref(), Some("alice"));
        assert_eq!(snapshot.expenses.len(), 1);
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_command_finishing_after_identity_change_is_not_applied() {
        let (sync, store) = setup();
        sync.sign_in("alice").await.unwrap();
        let gate = store.hold_create("late");

        let pending = {
            let sync = sync.clone();
            tokio::spawn(async move {
                sync.add_expense(new_expense(dec!(5), ExpenseCategory::Other, date(2024, 3, 1), "late"))
                    .await
            })
        };
        tokio::task::yield_now().await;
        sync.sign_in("bob").await.unwrap();

        gate.notify_one();
        assert_eq!(pending.await.unwrap(), Err(BudgetError::Superseded));
        assert!(sync.snapshot().expenses.is_empty());
    }

    #[tokio::test]
    async fn test_update_goal_overwrites_previous_goal() {
        let (sync, store) = setup();
        sync.sign_in("alice").await.unwrap();
        let month = "2024-03".parse().unwrap();

        sync.update_goal(SavingsGoal { amount: dec!(400), month }).await.unwrap();
        sync.update_goal(SavingsGoal { amount: dec!(450), month }).await.unwrap();

        assert_eq!(sync.snapshot().goal.unwrap().amount, dec!(450));
        assert_eq!(store.stored_goal("alice").unwrap().amount, dec!(450));
    }

    #[tokio::test]
    async fn test_failed_goal_update_keeps_previous_goal() {
        let (sync, store) = setup();
        let month = "2024-03".parse().unwrap();
        store.seed_goal("alice", SavingsGoal { amount: dec!(300), month });
        sync.sign_in("alice").await.unwrap();

        store.set_fail_writes(true);
        let result = sync.update_goal(SavingsGoal { amount: dec!(900), month }).await;
        assert!(matches!(result, Err(BudgetError::RemoteWrite(_))));
        assert_eq!(sync.snapshot().goal.unwrap().amount, dec!(300));
    }

    #[tokio::test]
    async fn test_sign_out_clears_everything() {
        let (sync, store) = setup();
        store.seed("alice", vec![stored("a", dec!(5), date(2024, 1, 1))]);
        sync.sign_in("alice").await.unwrap();

        sync.sign_out();
        let snapshot = sync.snapshot();
        assert_eq!(snapshot.status, SyncStatus::Ready);
        assert!(snapshot.user_id.is_none());
        assert!(snapshot.expenses.is_empty());
        assert!(snapshot.goal.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let (sync, _store) = setup();
        let mut rx = sync.subscribe();
        sync.sign_in("alice").await.unwrap();
        sync.add_expense(new_expense(dec!(1), ExpenseCategory::Food, date(2024, 1, 2), "tea"))
            .await
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().expenses.len(), 1);
    }
}
