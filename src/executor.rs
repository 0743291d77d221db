//! Background execution contexts.
//!
//! The loader never decodes on the interactive thread; it hands each load to
//! an [`Executor`] as a self-contained job that owns its inputs and reports
//! back over a channel. Which pool runs the job is a configuration choice:
//!
//! | Variant | Feature | Runs the job on |
//! |---------|---------|-----------------|
//! | [`Thread`](Executor::Thread) | always | a fresh named OS thread |
//! | `Rayon` | `rayon` | the rayon global pool, decoding the batch's frames in parallel |
//! | `Tokio` | `async` | `tokio::task::spawn_blocking` on the given runtime |

use std::thread;

use crate::error::FramePagerError;

/// A unit of background work.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where background extraction runs.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub enum Executor {
    /// Spawn a dedicated thread per load. This is the default.
    #[default]
    Thread,
    /// Run on the rayon global pool and decode each batch with
    /// `par_iter`, keeping frames in ascending order.
    #[cfg(feature = "rayon")]
    Rayon,
    /// Run on the blocking pool of a tokio runtime.
    #[cfg(feature = "async")]
    Tokio(tokio::runtime::Handle),
}

impl Executor {
    /// Use the runtime the caller is currently inside of.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like
    /// [`tokio::runtime::Handle::current`].
    #[cfg(feature = "async")]
    pub fn current_tokio() -> Self {
        Executor::Tokio(tokio::runtime::Handle::current())
    }

    /// Whether frames of one batch are decoded concurrently.
    pub(crate) fn decodes_in_parallel(&self) -> bool {
        match self {
            #[cfg(feature = "rayon")]
            Executor::Rayon => true,
            _ => false,
        }
    }

    /// Start `job` in the background.
    pub(crate) fn spawn(&self, job: Job) -> Result<(), FramePagerError> {
        match self {
            Executor::Thread => {
                thread::Builder::new()
                    .name("framepager-load".into())
                    .spawn(job)?;
            }
            #[cfg(feature = "rayon")]
            Executor::Rayon => ::rayon::spawn(job),
            #[cfg(feature = "async")]
            Executor::Tokio(handle) => {
                // The join handle is not needed: the job reports over the
                // completion channel.
                drop(handle.spawn_blocking(job));
            }
        }
        Ok(())
    }
}
