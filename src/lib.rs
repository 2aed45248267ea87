pub mod errors;
pub mod export;
pub mod extraction;
pub mod matching;
pub mod models;
pub mod standardization;
pub mod utils;
