//! Retail management backend for a single jewelry shop: customer ledger,
//! inventory catalog, GST and non-GST invoicing, repayments and
//! payment-promise reminders over a REST API.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;
