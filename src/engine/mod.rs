//! Chess engine components
//!
//! - Attack tables: leaper lookups and magic bitboards
//! - Move generation with a legality filter
//! - Perft node counting

pub mod attacks;
pub mod movegen;
pub mod perft;

pub use attacks::AttackTables;
pub use movegen::MoveGen;
pub use perft::{divide, perft};
