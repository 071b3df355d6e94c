pub mod advection;
pub mod diffusion;
pub mod field;
pub mod navier;
pub mod numeric;
pub mod obstacle;
pub mod poisson;
pub mod sources;
pub mod task;
