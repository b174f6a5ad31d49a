pub mod material;
pub mod outline;
