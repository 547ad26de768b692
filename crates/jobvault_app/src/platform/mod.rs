mod app;
pub mod logging;
pub mod settings;

pub use app::execute;
