//! CLI command implementations.
//!
//! | Module     | Commands handled      |
//! |------------|-----------------------|
//! | `detect`   | `Detect`              |
//! | `validate` | `Validate`            |
//! | `install`  | `Install`             |
//! | `audit`    | `History`, `Prune`    |
//! | `config`   | `Config`              |

pub mod audit;
pub mod config;
pub mod detect;
pub mod install;
pub mod validate;

pub use audit::{cmd_history, cmd_prune};
pub use config::cmd_config;
pub use detect::cmd_detect;
pub use install::cmd_install;
pub use validate::cmd_validate;
