pub mod grid;
pub mod sampler;
pub mod treasure;
