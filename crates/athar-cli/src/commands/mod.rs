pub mod dca;
pub mod growth;
pub mod housing;
pub mod income;
pub mod monte_carlo;
pub mod mortgage;
pub mod portfolio;
