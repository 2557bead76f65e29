pub mod capture;
pub mod email;
pub mod geolocation;
pub mod notification;
