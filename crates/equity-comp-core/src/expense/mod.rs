pub mod amortization;

pub use amortization::{
    company_monthly_expense, grant_monthly_expense, total_fair_value, CompanyExpenseOutput,
    FairValue, GrantExpenseOutput, MonthlyExpense,
};
