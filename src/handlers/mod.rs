//! HTTP handlers.

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod invoices;
pub mod items;
pub mod reminders;
