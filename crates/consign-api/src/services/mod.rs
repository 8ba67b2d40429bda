pub mod email;
pub mod intake;
