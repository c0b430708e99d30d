//! Command handlers, kept out of main.rs so they can be tested directly.

pub mod aim;
pub mod config;
pub mod plan;
pub mod run;

pub use aim::{execute_aim, render_rotation};
pub use config::execute_config;
pub use plan::{load_plan, render_plan};
pub use run::{check_outcome, execute_run, resolve_config};
