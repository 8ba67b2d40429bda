pub mod consign;
pub mod health;
