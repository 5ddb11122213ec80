pub mod app;
pub mod clock;
pub mod config;
pub mod cycle;
pub mod errors;
pub mod handlers;
pub mod messages;
pub mod models;
pub mod notify;
pub mod state;
pub mod storage;

pub use app::router;
pub use config::Config;
pub use cycle::{CyclePredictor, CycleProfile, CycleSnapshot, Phase};
pub use state::AppState;
pub use storage::load_data;
