pub mod cpu;
pub mod dependency;
pub mod instruction;
pub mod loader;
pub mod run_wrapper;
pub mod scheduler;

pub mod pipelined;

pub mod flags;
pub mod prompt;
pub mod report;
pub mod stats;

pub mod error;
