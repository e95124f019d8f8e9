pub(crate) mod handler;
pub(crate) mod navigation;
pub(crate) mod state;
pub(crate) mod units;

pub use handler::CLEAN_AND_REBUILD_COMMAND;
pub use state::ClangNavigatorServer;
