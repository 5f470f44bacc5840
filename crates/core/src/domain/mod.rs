pub mod classification;
pub mod context;
pub mod knowledge;
