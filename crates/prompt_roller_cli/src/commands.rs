//! Command modules for the PromptRoller CLI.
//!
//! - `check_cmd`: single-value name and path validation
//! - `generate_cmd`: prompt generation from a template file
//! - `variables_cmd`: template placeholder inspection

pub mod check_cmd;
pub mod generate_cmd;
pub mod variables_cmd;
