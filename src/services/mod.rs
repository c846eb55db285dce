// Farmer registry
pub mod farmers;

pub use farmers::FarmerService;
