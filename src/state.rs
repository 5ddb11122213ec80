use crate::clock::Clock;
use crate::cycle::CyclePredictor;
use crate::messages::MessageTable;
use crate::models::AppData;
use crate::notify::Notifier;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub clock: Arc<dyn Clock>,
    pub messages: Arc<MessageTable>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        data_path: PathBuf,
        data: AppData,
        clock: Arc<dyn Clock>,
        messages: MessageTable,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            clock,
            messages: Arc::new(messages),
            notifier,
        }
    }

    pub fn predictor(&self) -> CyclePredictor {
        CyclePredictor::new(Arc::clone(&self.clock))
    }
}
