//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module          | Commands handled |
//! |-----------------|------------------|
//! | `serve`         | `Serve`          |
//! | `board`         | `Board`          |
//! | `move_inquiry`  | `Move`           |

pub mod board;
pub mod move_inquiry;
pub mod serve;

pub use board::{BoardQuery, cmd_board};
pub use move_inquiry::cmd_move;
pub use serve::cmd_serve;
