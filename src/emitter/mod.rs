mod format;
mod runner;
mod sink;

pub use runner::Runner;
pub use sink::Sink;
