pub mod event;
pub mod schedule;
pub mod step;
pub mod world;
