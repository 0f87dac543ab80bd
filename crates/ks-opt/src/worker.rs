//! Search execution on a dedicated thread.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, channel};
use std::thread::{self, JoinHandle};

use ks_model::{CaseSpec, ModelSnapshot};

use crate::engine::{BestRecord, SearchOutcome, Simulator, run_search};
use crate::spec::SearchSpec;

/// Messages published by the worker. `Finished` covers both normal
/// completion and cancellation (see [`SearchOutcome::cancelled`]); `Failed`
/// means the search aborted and no final best was produced.
#[derive(Debug, Clone)]
pub enum SearchMessage {
    Progress {
        index: usize,
        best: Option<BestRecord>,
    },
    Finished(SearchOutcome),
    Failed {
        message: String,
    },
}

/// Owns the search thread. All inputs are moved in at spawn time and
/// treated as read-only for the worker's lifetime; the only shared state
/// afterwards is the stop flag and the message channel.
pub struct SearchWorker {
    pub rx: Receiver<SearchMessage>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SearchWorker {
    pub fn spawn<S>(
        simulator: S,
        model_snapshot: ModelSnapshot,
        case_specs: BTreeMap<String, CaseSpec>,
        search: SearchSpec,
    ) -> Self
    where
        S: Simulator + Send + 'static,
    {
        let (tx, rx) = channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_flag = Arc::clone(&cancel);

        let handle = thread::spawn(move || {
            let progress_tx = tx.clone();
            let result = run_search(
                &simulator,
                &model_snapshot,
                &case_specs,
                &search,
                &cancel_flag,
                |index, best| {
                    let _ = progress_tx.send(SearchMessage::Progress {
                        index,
                        best: best.cloned(),
                    });
                },
            );
            let _ = match result {
                Ok(outcome) => tx.send(SearchMessage::Finished(outcome)),
                Err(err) => tx.send(SearchMessage::Failed {
                    message: err.to_string(),
                }),
            };
        });

        Self {
            rx,
            cancel,
            handle: Some(handle),
        }
    }

    /// Advisory stop: takes effect at the next trial boundary.
    pub fn request_stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Wait for the thread to exit. Call after draining the channel.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
