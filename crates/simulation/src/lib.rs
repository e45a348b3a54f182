pub mod ensemble;
pub mod error;
pub mod monte_carlo;

pub use ensemble::{
    ConfidenceInterval, FinalDistribution, PathEnsemble, PathStats, ReturnSummary,
};
pub use error::{Result, SimulationError};
pub use monte_carlo::{AssetReturnStats, MonteCarloSimulator, SimulationConfig};
