pub mod extraction;
pub mod analysis;
