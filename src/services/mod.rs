pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod descriptions;
pub mod materials;
pub mod orders;
