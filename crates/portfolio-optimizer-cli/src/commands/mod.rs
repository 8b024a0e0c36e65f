pub mod portfolio_optimization;
