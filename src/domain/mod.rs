// Domain layer - Core types with no I/O
pub mod error;
pub mod tag;
pub mod telemetry;
pub mod time_range;
pub mod view;
