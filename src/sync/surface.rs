//! Reload notifications to display surfaces.
//!
//! The platform notification API must be driven from a single dedicated
//! context, so the scheduler never calls surfaces directly: it sends a
//! message and this module's thread performs the fan-out. Delivery is
//! best-effort only; surfaces re-read the snapshot store on their own
//! schedule regardless.

use std::{
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{Context, Result};
use log::error;

type ReloadFn = Box<dyn Fn() + Send + 'static>;

enum NotifyRequest {
    Register(ReloadFn),
    Reload,
    Shutdown,
}

struct NotifierInner {
    sender: mpsc::Sender<NotifyRequest>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for NotifierInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(NotifyRequest::Shutdown) {
                error!("Failed to send shutdown to notifier thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join notifier thread: {join_err:?}");
            }
        }
    }
}

#[derive(Clone)]
pub struct SurfaceNotifier {
    inner: Arc<NotifierInner>,
}

impl SurfaceNotifier {
    pub fn spawn() -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<NotifyRequest>();

        let worker = thread::Builder::new()
            .name("habitsync-notify".into())
            .spawn(move || {
                let mut surfaces: Vec<ReloadFn> = Vec::new();
                while let Ok(request) = receiver.recv() {
                    match request {
                        NotifyRequest::Register(surface) => surfaces.push(surface),
                        NotifyRequest::Reload => {
                            for surface in &surfaces {
                                surface();
                            }
                        }
                        NotifyRequest::Shutdown => break,
                    }
                }
            })
            .with_context(|| "failed to spawn notifier thread")?;

        Ok(Self {
            inner: Arc::new(NotifierInner {
                sender,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    /// Register a surface's reload hook. Hooks run on the notifier thread
    /// and should only kick off the surface's own refresh.
    pub fn register(&self, reload: impl Fn() + Send + 'static) {
        let _ = self
            .inner
            .sender
            .send(NotifyRequest::Register(Box::new(reload)));
    }

    /// Ask every registered surface to re-read the store. Fire-and-forget:
    /// a send after shutdown is dropped silently.
    pub fn reload_surfaces(&self) {
        let _ = self.inner.sender.send(NotifyRequest::Reload);
    }
}
