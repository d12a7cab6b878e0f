pub mod batch;
pub mod config;
pub mod error;
pub mod io;
pub mod metrics;
pub mod signal;
pub mod table;

pub use batch::*;
pub use config::*;
pub use error::*;
pub use signal::*;
pub use table::*;
