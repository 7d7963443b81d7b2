//! Sequential all-or-nothing composition over a list of [`WindowLimiter`]s.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use flashlight_core::RequestContext;

use crate::window::WindowLimiter;

/// Runs a call through a sequence of limiters, outermost to innermost. The
/// call proceeds only if every limiter admits it; if any layer refuses, the
/// layers already acquired are released (inverse order) without the inner
/// ones ever being taken.
pub struct ComposedLimiter {
    layers: Vec<Arc<WindowLimiter>>,
}

impl ComposedLimiter {
    /// `layers[0]` is applied outermost.
    pub fn new(layers: Vec<Arc<WindowLimiter>>) -> Self {
        Self { layers }
    }

    /// Runs `f` if every layer admits it. `min_op_time` is applied by the
    /// innermost layer only; outer layers force no additional pacing of
    /// their own beyond their own window admission.
    pub async fn limit<F, Fut, T>(&self, ctx: &RequestContext, min_op_time: Duration, f: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.limit_layer(ctx, min_op_time, 0, f).await
    }

    fn limit_layer<'a, F, Fut, T>(
        &'a self,
        ctx: &'a RequestContext,
        min_op_time: Duration,
        index: usize,
        f: F,
    ) -> std::pin::Pin<Box<dyn Future<Output = Option<T>> + Send + 'a>>
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = T> + Send + 'a,
        T: Send + 'a,
    {
        Box::pin(async move {
            match self.layers.get(index) {
                None => Some(f().await),
                Some(layer) => {
                    if index + 1 == self.layers.len() {
                        layer.limit(ctx, min_op_time, f).await
                    } else {
                        layer
                            .limit(ctx, Duration::ZERO, || {
                                self.limit_layer(ctx, min_op_time, index + 1, f)
                            })
                            .await
                            .flatten()
                    }
                }
            }
        })
    }
}
