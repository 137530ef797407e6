//! Security policy for install commands.
//!
//! Commands are checked against a deny-list of dangerous pattern classes and
//! then tokenised: the program must be an approved package manager and the
//! subcommand must be on that manager's allow-list. Anything else is refused.

pub mod policy;
pub mod tokenize;

pub use policy::{CommandValidator, DEFAULT_MAX_NAME_LENGTH, Validation, allowed_verbs};
pub use tokenize::split_command;
