pub mod audit;
pub mod config;
pub mod detect;
pub mod errors;
pub mod install;
pub mod item;
pub mod logging;
pub mod validate;
