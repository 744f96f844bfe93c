pub mod audit;
pub mod clock;
pub mod error;
pub mod factors;
pub mod overrides;
pub mod quote;
pub mod rules;
pub mod spatial;
pub mod supply;
pub mod surge;
pub mod sweep;
