#![allow(async_fn_in_trait)]
pub mod acquisition;
pub mod config;
pub mod date_resolver;
pub mod download_plan;
pub mod epic;
pub mod error;
pub mod fakes;
pub mod imagery;
pub mod logging;
pub mod prompt;
pub mod staging;
