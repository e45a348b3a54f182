pub mod config;
pub mod config_loader;
pub mod table;

pub use config::{AppConfig, DashboardConfig, DataConfig, SimulationDefaults};
pub use config_loader::ConfigLoader;
pub use table::{pct_change, PriceTable, TableError};
