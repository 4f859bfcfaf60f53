//! Hand-off to the applications that open browser entries.

use std::sync::Mutex;

use crate::error::ActionError;

pub trait AppLauncher: Send {
    /// Start `app` with `arg` (usually the selected path).
    fn launch(&self, app: &str, arg: &str) -> Result<(), ActionError>;
}

/// Launcher for hosts without an application loader: records the request
/// in the log and succeeds.
#[derive(Debug, Default)]
pub struct LogLauncher;

impl AppLauncher for LogLauncher {
    fn launch(&self, app: &str, arg: &str) -> Result<(), ActionError> {
        log::info!("launch: {} {}", app, arg);
        Ok(())
    }
}

/// Keeps every launch request; lets callers inspect what would have run.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    launched: Mutex<Vec<(String, String)>>,
}

impl RecordingLauncher {
    pub fn launched(&self) -> Vec<(String, String)> {
        self.launched.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl AppLauncher for RecordingLauncher {
    fn launch(&self, app: &str, arg: &str) -> Result<(), ActionError> {
        self.launched
            .lock()
            .map_err(|_| ActionError::Launch(app.to_string()))?
            .push((app.to_string(), arg.to_string()));
        Ok(())
    }
}

impl<T: AppLauncher + Sync> AppLauncher for std::sync::Arc<T> {
    fn launch(&self, app: &str, arg: &str) -> Result<(), ActionError> {
        (**self).launch(app, arg)
    }
}
