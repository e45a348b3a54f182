pub mod client;
pub mod csv_storage;
pub mod models;
pub mod table_builder;

pub use client::{coin_id_for_symbol, MarketDataClient};
pub use csv_storage::CsvStorage;
pub use models::PriceRecord;
pub use table_builder::build_price_table;
