//! Test utilities: an in-memory store that can fail on demand and hold
//! responses until a test releases them.
//!
//! Holding a response is how the synchronizer tests recreate races (a late
//! fetch for a previous user, adds completing out of order) deterministically.

use async_trait::async_trait;
use shared::{Expense, NewExpense, SavingsGoal};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::traits::ExpenseStore;
use crate::backend::domain::BudgetError;

#[derive(Default)]
pub struct MemoryStore {
    expenses: Mutex<HashMap<String, Vec<Expense>>>,
    goals: Mutex<HashMap<String, SavingsGoal>>,
    list_gates: Mutex<HashMap<String, Arc<Notify>>>,
    create_gates: Mutex<HashMap<String, Arc<Notify>>>,
    next_id: AtomicU64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    list_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, user_id: &str, expenses: Vec<Expense>) {
        self.expenses.lock().unwrap().insert(user_id.to_string(), expenses);
    }

    pub fn seed_goal(&self, user_id: &str, goal: SavingsGoal) {
        self.goals.lock().unwrap().insert(user_id.to_string(), goal);
    }

    pub fn stored_expenses(&self, user_id: &str) -> Vec<Expense> {
        self.expenses.lock().unwrap().get(user_id).cloned().unwrap_or_default()
    }

    pub fn stored_goal(&self, user_id: &str) -> Option<SavingsGoal> {
        self.goals.lock().unwrap().get(user_id).cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Hold the next list responses for `user_id` until the returned gate is notified
    pub fn hold_list(&self, user_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.list_gates.lock().unwrap().insert(user_id.to_string(), gate.clone());
        gate
    }

    /// Hold creation of expenses with this description until the gate is notified
    pub fn hold_create(&self, description: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.create_gates.lock().unwrap().insert(description.to_string(), gate.clone());
        gate
    }

    fn check_writes(&self) -> Result<(), BudgetError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BudgetError::RemoteWrite("injected write failure".to_string()));
        }
        Ok(())
    }

    fn check_reads(&self) -> Result<(), BudgetError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BudgetError::RemoteRead("injected read failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_expenses(&self, user_id: &str) -> Result<Vec<Expense>, BudgetError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.list_gates.lock().unwrap().get(user_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_reads()?;
        let mut expenses = self.stored_expenses(user_id);
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }

    async fn create_expense(&self, user_id: &str, expense: &NewExpense) -> Result<Expense, BudgetError> {
        let key = expense.description.clone().unwrap_or_default();
        let gate = self.create_gates.lock().unwrap().get(&key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_writes()?;
        let id = format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let created = expense.clone().into_expense(id);
        self.expenses
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn delete_expense(&self, user_id: &str, expense_id: &str) -> Result<(), BudgetError> {
        self.check_writes()?;
        if let Some(expenses) = self.expenses.lock().unwrap().get_mut(user_id) {
            expenses.retain(|e| e.id != expense_id);
        }
        Ok(())
    }

    async fn get_active_goal(&self, user_id: &str) -> Result<Option<SavingsGoal>, BudgetError> {
        self.check_reads()?;
        Ok(self.stored_goal(user_id))
    }

    async fn upsert_goal(&self, user_id: &str, goal: &SavingsGoal) -> Result<SavingsGoal, BudgetError> {
        self.check_writes()?;
        self.goals.lock().unwrap().insert(user_id.to_string(), goal.clone());
        Ok(goal.clone())
    }
}
