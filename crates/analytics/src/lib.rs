pub mod correlation;
pub mod frontier;
pub mod returns;

pub use correlation::{correlation_matrix, log_covariance_matrix, pearson_correlation};
pub use frontier::{search, FrontierConfig, FrontierPoint, FrontierResult};
pub use returns::{
    cumulative_returns, log_returns, normalized, rolling_mean, sample_mean, sample_std,
    sharpe_ratio, TRADING_DAYS_PER_YEAR,
};
