pub mod database;
pub mod jwt;
pub mod ledger;
pub mod metrics;
pub mod numbering;

pub use database::Database;
pub use jwt::{Claims, JwtService};
pub use metrics::{get_metrics, init_metrics};
