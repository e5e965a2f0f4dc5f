pub mod financial_calculator;

pub use financial_calculator::FinancialCalculator;
