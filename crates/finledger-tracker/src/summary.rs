//! Totals and breakdowns behind the expense table and the two charts
//! (spending per category, income vs expenses vs net).

use finledger_core::config::CurrencyConfig;
use finledger_core::{Expense, Income};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceOverview {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

pub fn total_expenses(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

pub fn total_income(income: &[Income]) -> f64 {
    income.iter().map(|i| i.amount).sum()
}

/// Per-category spending, in the order each category was first recorded.
pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for expense in expenses {
        match totals.iter_mut().find(|t| t.category == expense.category) {
            Some(total) => total.amount += expense.amount,
            None => totals.push(CategoryTotal {
                category: expense.category.clone(),
                amount: expense.amount,
            }),
        }
    }
    totals
}

pub fn balance(expenses: &[Expense], income: &[Income]) -> BalanceOverview {
    let income = total_income(income);
    let expenses = total_expenses(expenses);
    BalanceOverview {
        income,
        expenses,
        net: income - expenses,
    }
}

/// Format an amount the way `en-NG` currency formatting does:
/// `₦1,234,567.50`, `-₦12.00`.
pub fn format_currency(amount: f64, currency: &CurrencyConfig) -> String {
    if !amount.is_finite() {
        return format!("{}{}", currency.symbol, amount);
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{}{grouped}.{frac:02}", currency.symbol)
}
