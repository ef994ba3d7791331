use futures::lock::Mutex;
use gameforge::{AuthGate, Caller, GameGenerator, Studio};
use std::{collections::HashMap, sync::Arc};

/// One [`Studio`] per signed-in caller, all sharing one generator.
///
/// Loading the workspace page starts the caller over with a fresh session,
/// so a session lives as long as the page that shows it.
pub struct Workspaces {
    generator: Arc<GameGenerator>,
    gate: Arc<dyn AuthGate>,
    studios: Mutex<HashMap<String, Arc<Studio>>>,
}

impl Workspaces {
    pub fn new(generator: impl Into<Arc<GameGenerator>>, gate: Arc<dyn AuthGate>) -> Self {
        Self {
            generator: generator.into(),
            gate,
            studios: Mutex::new(HashMap::new()),
        }
    }

    pub async fn is_authenticated(&self, caller: &Caller) -> bool {
        self.gate.is_authenticated(caller).await
    }

    /// The caller's studio, opened on first use. `None` for callers the gate
    /// rejects.
    pub async fn studio(&self, caller: &Caller) -> Option<Arc<Studio>> {
        if !self.is_authenticated(caller).await {
            return None;
        }
        let mut studios = self.studios.lock().await;
        let studio = studios
            .entry(owner(caller))
            .or_insert_with(|| Arc::new(self.open()));
        Some(studio.clone())
    }

    /// Replace the caller's studio with a new one. A generation still running
    /// in the old studio settles there and is never shown.
    pub async fn reopen(&self, caller: &Caller) -> Option<Arc<Studio>> {
        if !self.is_authenticated(caller).await {
            return None;
        }
        let studio = Arc::new(self.open());
        let previous = self
            .studios
            .lock()
            .await
            .insert(owner(caller), studio.clone());
        if previous.is_some() {
            tracing::debug!("workspace session started over");
        }
        Some(studio)
    }

    fn open(&self) -> Studio {
        Studio::new(self.generator.clone(), self.gate.clone())
    }
}

fn owner(caller: &Caller) -> String {
    caller.token().unwrap_or_default().to_string()
}
