//! Command implementations for the userdir CLI.

pub mod browse;
pub mod list;
pub mod show;

pub use browse::run_browse;
pub use list::run_list;
pub use show::run_show;
