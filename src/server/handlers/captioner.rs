//! Module implementing the thread pool that does the meme captioning.
//! This is used by the /caption request handler.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures::executor::{ThreadPool, ThreadPoolBuilder};
use futures::task::SpawnExt;
use quip::{Font, Pipeline, PipelineError, RenderRequest, RenderResponse, Template,
           ThreadSafeCache};
use thiserror::Error;

use crate::args::Resource;


/// Renders captions onto meme templates, in a pool of worker threads.
pub struct Captioner {
    pool: ThreadPool,
    pipeline: Arc<Pipeline>,
    // Configuration params.
    task_timeout: Duration,
}

impl Captioner {
    /// Create the captioner with given number of render threads.
    /// If omitted or zero, there will be as many threads as CPU cores.
    pub fn new(pipeline: Pipeline, thread_count: Option<usize>) -> io::Result<Self> {
        let mut builder = Self::pool_builder();
        if let Some(count) = thread_count.filter(|&c| c > 0) {
            trace!("Setting thread count for captioning to {}", count);
            builder.pool_size(count);
        }
        let pool = builder.create()?;
        Ok(Captioner{pool, pipeline: Arc::new(pipeline), task_timeout: Duration::ZERO})
    }

    #[inline]
    #[doc(hidden)]
    fn pool_builder() -> ThreadPoolBuilder {
        let mut builder = ThreadPool::builder();
        builder.name_prefix("caption-");
        builder.after_start(|i| trace!("Worker thread #{} created in Captioner::pool", i));
        builder.before_stop(|i| trace!("Stopping worker thread #{} in Captioner::pool", i));
        builder
    }
}

// Configuration tweaks.
impl Captioner {
    /// Set the maximum time a single captioning task may take.
    /// Zero disables the timeout.
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        let secs = timeout.as_secs();
        if secs > 0 {
            trace!("Setting caption request timeout to {} secs", secs);
        } else {
            trace!("Disabling caption request timeout");
        }
        self.task_timeout = timeout;
        self
    }

    /// Fill the cache for given type of resource.
    pub fn preload(&self, what: Resource) {
        let engine = self.pipeline.engine();
        match what {
            Resource::Template => {
                let capacity = self.template_cache().map(|c| c.capacity()).unwrap_or(0);
                debug!("Preloading up to {} templates", capacity);
                for meme in self.pipeline.catalog().iter().take(capacity) {
                    if let Err(e) = engine.preload_template(&meme.image) {
                        warn!("Error preloading template `{}` of meme {}: {}", meme.image, meme.id, e);
                    }
                }
            }
            Resource::Font => {
                let capacity = self.font_cache().map(|c| c.capacity()).unwrap_or(0);
                let fonts: Vec<String> = engine.config().ladder.fonts()
                    .into_iter().map(Into::into).collect();
                debug!("Preloading up to {} fonts", capacity);
                for font in fonts.iter().take(capacity) {
                    if let Err(e) = engine.preload_font(font) {
                        warn!("Error preloading font `{}`: {}", font, e);
                    }
                }
            }
        }
    }
}

impl Captioner {
    #[inline]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    #[inline]
    pub fn template_cache(&self) -> Option<&ThreadSafeCache<String, Template>> {
        self.pipeline.engine().template_cache()
    }

    #[inline]
    pub fn font_cache(&self) -> Option<&ThreadSafeCache<String, Font>> {
        self.pipeline.engine().font_cache()
    }
}

// Rendering code.
impl Captioner {
    /// Handle the render request.
    /// The rendering (and caption generation, if any) is done in a separate thread.
    pub async fn render(&self, request: RenderRequest) -> Result<RenderResponse, RenderError> {
        let task = self.pool.spawn_with_handle({
            let pipeline = self.pipeline.clone();
            async move {
                match pipeline.render(&request) {
                    Ok(response) => {
                        debug!("Successfully rendered {:?} as {}", request, response.image_url);
                        Ok(response)
                    },
                    Err(e) => {
                        error!("Failed to render {:?}: {}", request, e);
                        Err(e)
                    },
                }
            }
        }).map_err(|e| {
            error!("Cannot spawn the captioning task: {}", e);
            RenderError::Unavailable
        })?;

        // Impose a timeout on the task.
        // Note that the worker thread is not interrupted, only the result is discarded.
        let result = if self.task_timeout > Duration::ZERO {
            tokio::time::timeout(self.task_timeout, task).await.map_err(|_| {
                warn!("Captioning task timed out after {} secs", self.task_timeout.as_secs());
                RenderError::Timeout
            })?
        } else {
            task.await
        };
        result.map_err(RenderError::Pipeline)
    }
}


/// Error that can occur during the meme rendering process.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Error within the captioning pipeline.
    #[error("{0}")]
    Pipeline(#[source] PipelineError),
    /// Timeout while performing the caption request.
    #[error("captioning took too long")]
    Timeout,
    /// Captioning service temporarily unavailable.
    #[error("captioning service is unavailable")]
    Unavailable,
}
