//! Terminal front end for the simulator

pub mod churn;
pub mod forecast;
pub mod history;
pub mod pricing;
pub mod setup;
pub mod ui;
pub mod watch;
