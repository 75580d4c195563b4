pub mod portfolio_manager;
