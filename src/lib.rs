pub mod bytecode;
pub mod config;
pub mod error;
pub mod frontend;
pub mod ir;
pub mod optimizations;
pub mod semantics;
pub mod utils;
