// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! View-state controller
//!
//! Owns the selected image, its preview, the busy flag and the result set,
//! and moves between the four views:
//!
//! ```text
//! Idle --select--> Ready --start--> Analyzing --done--> Done
//!   ^                                                    |
//!   +------------------------ reset ---------------------+
//! ```
//!
//! `select_input` lands in `Ready` (or `Idle` for `None`) from any view.
//! Every transition that abandons an analysis bumps a generation counter;
//! a completion carrying an older generation is dropped.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisResultSet, Classifier};
use crate::preview::{PreviewHandle, PreviewHost, PreviewId};
use crate::upload::SelectedInput;
use crate::{PulmoError, Result};

/// Which of the mutually exclusive views is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Nothing selected
    Idle,
    /// Image selected, no results yet
    Ready,
    /// Classifier running
    Analyzing,
    /// Results available for the selected image
    Done,
}

/// Point-in-time copy of the controller state
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub view: View,
    pub input_name: Option<String>,
    pub preview: Option<PreviewId>,
    pub busy: bool,
    pub results: Option<AnalysisResultSet>,
    /// Message of the last failed analysis, cleared by the next transition
    pub last_error: Option<String>,
    /// Whether the "start analysis" affordance is enabled
    pub can_analyze: bool,
}

#[derive(Default)]
struct Session {
    input: Option<SelectedInput>,
    preview: Option<PreviewHandle>,
    busy: bool,
    results: Option<AnalysisResultSet>,
    last_error: Option<String>,
    generation: u64,
    task: Option<AbortHandle>,
}

impl Session {
    fn view(&self) -> View {
        match (&self.input, self.busy, &self.results) {
            (None, _, _) => View::Idle,
            (Some(_), true, _) => View::Analyzing,
            (Some(_), false, Some(_)) => View::Done,
            (Some(_), false, None) => View::Ready,
        }
    }

    /// Abandon any in-flight analysis
    fn invalidate(&mut self) {
        self.generation += 1;
        self.busy = false;
        if let Some(task) = self.task.take() {
            debug!("Aborting analysis task (now generation {})", self.generation);
            task.abort();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Drives upload → analyzing → results.
///
/// Cheap to share behind an `Arc`; all methods take `&self`. Dropping the
/// controller releases the preview and abandons the running analysis.
pub struct Controller {
    session: Arc<Mutex<Session>>,
    classifier: Arc<dyn Classifier>,
    previews: Arc<dyn PreviewHost>,
}

impl Controller {
    pub fn new(classifier: Arc<dyn Classifier>, previews: Arc<dyn PreviewHost>) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::default())),
            classifier,
            previews,
        }
    }

    /// Replace the selected image, or clear it with `None`.
    ///
    /// Results are cleared and a running analysis is abandoned. The new
    /// preview is created before anything is touched, so a failure leaves the
    /// controller as it was.
    pub fn select_input(&self, input: Option<SelectedInput>) -> Result<()> {
        let preview = input
            .as_ref()
            .map(|i| PreviewHandle::acquire(self.previews.clone(), i))
            .transpose()?;

        let old_preview = {
            let mut session = self.session.lock();
            session.invalidate();
            session.results = None;
            session.last_error = None;
            match &input {
                Some(i) => info!("Selected {}", i.name()),
                None => info!("Selection cleared"),
            }
            session.input = input;
            std::mem::replace(&mut session.preview, preview)
        };
        // released outside the lock
        drop(old_preview);
        Ok(())
    }

    /// Start classifying the selected image.
    ///
    /// Returns `None` without doing anything when no image is selected or an
    /// analysis is already running. Must be called from within a tokio
    /// runtime.
    pub fn start_analysis(&self) -> Option<JoinHandle<()>> {
        let mut session = self.session.lock();
        if session.busy {
            debug!("Analysis already running, ignoring start");
            return None;
        }
        let input = match &session.input {
            Some(input) => input.clone(),
            None => {
                debug!("Nothing selected, ignoring start");
                return None;
            }
        };

        session.generation += 1;
        session.busy = true;
        session.results = None;
        session.last_error = None;
        let generation = session.generation;

        info!("Starting analysis of {} with {}", input.name(), self.classifier.name());

        let classifier = self.classifier.clone();
        let weak = Arc::downgrade(&self.session);
        let handle = tokio::spawn(async move {
            let outcome = classifier.analyze(&input).await;
            complete(&weak, generation, outcome);
        });
        session.task = Some(handle.abort_handle());
        Some(handle)
    }

    /// Back to `Idle` from anywhere
    pub fn reset(&self) {
        let old_preview = {
            let mut session = self.session.lock();
            session.invalidate();
            session.input = None;
            session.results = None;
            session.last_error = None;
            session.preview.take()
        };
        drop(old_preview);
        info!("Reset");
    }

    pub fn view(&self) -> View {
        self.session.lock().view()
    }

    pub fn is_busy(&self) -> bool {
        self.session.lock().busy
    }

    pub fn results(&self) -> Option<AnalysisResultSet> {
        self.session.lock().results.clone()
    }

    pub fn preview_id(&self) -> Option<PreviewId> {
        self.session.lock().preview.as_ref().map(PreviewHandle::id)
    }

    pub fn snapshot(&self) -> Snapshot {
        let session = self.session.lock();
        Snapshot {
            view: session.view(),
            input_name: session.input.as_ref().map(|i| i.name().to_string()),
            preview: session.preview.as_ref().map(PreviewHandle::id),
            busy: session.busy,
            results: session.results.clone(),
            last_error: session.last_error.clone(),
            can_analyze: session.input.is_some() && !session.busy,
        }
    }
}

/// Apply a finished analysis if it still belongs to the current generation
fn complete(session: &Weak<Mutex<Session>>, generation: u64, outcome: Result<AnalysisResultSet>) {
    let Some(session) = session.upgrade() else {
        debug!("Controller gone, dropping analysis outcome");
        return;
    };
    let mut session = session.lock();
    if session.generation != generation || !session.busy {
        debug!(
            "Discarding stale analysis outcome (generation {} vs {})",
            generation, session.generation
        );
        return;
    }

    session.busy = false;
    session.task = None;
    match outcome {
        Ok(results) => {
            info!("Analysis finished with {} findings", results.len());
            session.results = Some(results);
        }
        Err(e) => {
            warn!("Analysis failed: {}", e);
            let message = match e {
                PulmoError::AnalysisFailed(m) => m,
                other => other.to_string(),
            };
            session.last_error = Some(message);
        }
    }
}
