pub mod ack;
pub mod capture;
pub mod health;
pub mod lenient;
pub mod location;
pub mod notification;
