// this_file: crates/glyphstore/src/load_queue.rs

//! Serialized background loading for one store's glyph sources.
//!
//! Each queued load is a task that first waits for the task queued before
//! it. Sources attached to one store therefore load one at a time, in the
//! order they were attached, while different stores (each with its own
//! sequencer) load in parallel.
//!
//! The queue has no drain operation; callers that need to know when fonts
//! are ready poll [`GlyphSource::state`].

use std::sync::Arc;

use glyphstore_core::GlyphSource;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Tail of a per-store chain of load tasks
pub struct LoadSequencer {
    runtime: Handle,
    tail: Mutex<Option<JoinHandle<()>>>,
}

impl LoadSequencer {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tail: Mutex::new(None),
        }
    }

    /// Runtime the chain (and blocking lookups) run on
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Append a source's load to the chain
    ///
    /// A failed or panicking load never breaks the chain: the error was
    /// already logged by the source, so it is noted and dropped here.
    pub fn queue(&self, source: Arc<dyn GlyphSource>) {
        let mut tail = self.tail.lock();
        let previous = tail.take();

        let link = self.runtime.spawn(async move {
            if let Some(previous) = previous {
                if let Err(err) = previous.await {
                    log::debug!("Previous font load aborted: {err}");
                }
            }

            let font_name = source.font_name().to_owned();
            log::debug!("Loading font {font_name}...");
            match source.load().await {
                Ok(()) => log::debug!("Loaded font {font_name}!"),
                Err(err) => log::debug!("Font {font_name} failed to load, continuing: {err}"),
            }
        });

        *tail = Some(link);
    }
}

impl std::fmt::Debug for LoadSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadSequencer")
            .field("idle", &self.tail.lock().as_ref().map_or(true, |t| t.is_finished()))
            .finish()
    }
}
