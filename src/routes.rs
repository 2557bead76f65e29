pub mod capture;
pub mod error;
pub mod health;
