pub mod search;
pub mod system;
