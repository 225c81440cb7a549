//! Search strategy resolution over localities

pub mod localities;

pub use localities::LocalitiesRepository;
