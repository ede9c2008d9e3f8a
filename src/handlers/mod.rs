pub mod accounts;
pub mod health;
pub mod intuit_oauth;
