pub mod config;
pub mod run;

pub use config::Config;
pub use run::RunContext;
