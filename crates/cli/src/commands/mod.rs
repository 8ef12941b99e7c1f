pub mod filter;
pub mod groups;
