//! Application services for message board orchestration.

mod board;

pub use board::{BoardError, BoardResult, MessageBoardService};
