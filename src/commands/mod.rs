//! CLI commands implementation

pub mod audit;
pub mod company;
pub mod history;
pub mod init;
pub mod status;

pub use audit::*;
pub use company::*;
pub use history::*;
pub use init::*;
pub use status::*;
