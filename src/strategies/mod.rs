pub mod formula;
pub mod history;
pub mod types;
