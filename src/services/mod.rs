pub mod generator;
pub mod mailer;

pub use generator::*;
pub use mailer::*;
