pub mod engine;
pub mod error;
pub mod export;
pub mod impact;
pub mod metrics;
pub mod montecarlo;
pub mod parameters;
pub mod sampling;
pub mod sweep;
