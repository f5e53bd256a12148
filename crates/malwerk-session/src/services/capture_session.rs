// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session — drives capture -> rectify -> bind for the active AR target.
//
// A capture runs in two halves. `prepare` is synchronous: it grabs the frame,
// runs the rectification pipeline inside a per-run resource scope and encodes
// the texture. `bind` is asynchronous: it hands the texture to the binder.
// Every capture and reset bumps the context generation, so a bind that is
// still in flight when the user captures again (or when its target is lost)
// finds itself stale and never reaches the model slot.
//
// All fields are cheaply cloneable (Arc-wrapped). The context lock is never
// held across an `.await`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use image::RgbaImage;
use malwerk_bridge::traits::{FrameSource, TextureBinder};
use malwerk_core::config::{PipelineConfig, TargetBinding};
use malwerk_core::error::{MalwerkError, Result};
use malwerk_core::types::{
    BoundTexture, CaptureStats, EncodedTexture, ModelId, PipelineStage, RunId, TargetId,
};
use malwerk_rectify::{
    OrderedCorners, PipelineFailure, Rectifier, ResourceLedger, ResourceScope, encode_texture,
};
use tracing::{debug, error, info, instrument, warn};

use super::targets::TargetRegistry;
use crate::state::{PipelineContext, Staleness};

/// How a capture that got past the pipeline ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The texture is now on the model.
    Bound(BoundTexture),
    /// The run's target was lost before the texture could be applied.
    TargetChanged,
    /// A newer capture or a reset replaced this run.
    Superseded,
}

impl CaptureOutcome {
    /// Status line for the host UI.
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::Bound(_) => "Coloring applied successfully!",
            Self::TargetChanged => "Target lost",
            Self::Superseded => "Capture replaced by a newer one",
        }
    }
}

impl From<Staleness> for CaptureOutcome {
    fn from(staleness: Staleness) -> Self {
        match staleness {
            Staleness::Superseded => Self::Superseded,
            Staleness::TargetChanged => Self::TargetChanged,
        }
    }
}

/// A rectified, encoded page waiting to be bound.
///
/// Dropping it without calling [`CaptureSession::bind`] abandons the run and
/// returns the pipeline to `Idle`.
pub struct PreparedCapture {
    pub run_id: RunId,
    /// Target that was active when the capture started.
    pub target: TargetBinding,
    pub corners: OrderedCorners,
    /// Size of the rectified page before texture downscaling.
    pub size: (u32, u32),
    pub texture: EncodedTexture,
    guard: BindingGuard,
}

impl std::fmt::Debug for PreparedCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedCapture")
            .field("run_id", &self.run_id)
            .field("target", &self.target.target)
            .field("size", &self.size)
            .field("texture", &self.texture)
            .field("generation", &self.guard.generation)
            .finish()
    }
}

/// Puts an abandoned run back to `Idle`.
///
/// `bind` moves every exit path out of `Binding` itself, so the guard only
/// acts when a prepared capture is dropped or its bind is cancelled.
struct BindingGuard {
    context: Arc<Mutex<PipelineContext>>,
    generation: u64,
}

impl Drop for BindingGuard {
    fn drop(&mut self) {
        let mut ctx = lock(&self.context);
        if ctx.generation() == self.generation && ctx.stage == PipelineStage::Binding {
            ctx.stage = PipelineStage::Idle;
            ctx.stats.discarded += 1;
            debug!(generation = self.generation, "Prepared capture abandoned");
        }
    }
}

fn lock(context: &Mutex<PipelineContext>) -> MutexGuard<'_, PipelineContext> {
    context.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Orchestrates captures for one AR session.
#[derive(Clone)]
pub struct CaptureSession {
    config: Arc<PipelineConfig>,
    rectifier: Arc<Rectifier>,
    targets: Arc<TargetRegistry>,
    frames: Arc<dyn FrameSource>,
    binder: Arc<dyn TextureBinder>,
    context: Arc<Mutex<PipelineContext>>,
    ledger: Arc<ResourceLedger>,
}

impl CaptureSession {
    /// Create a session. Fails with `Config` if the configuration is invalid.
    pub fn new(
        config: PipelineConfig,
        frames: Arc<dyn FrameSource>,
        binder: Arc<dyn TextureBinder>,
    ) -> Result<Self> {
        config.validate()?;
        info!(targets = config.targets.len(), "Capture session created");
        Ok(Self {
            rectifier: Arc::new(Rectifier::new(&config)),
            targets: Arc::new(TargetRegistry::new(&config.targets)),
            context: Arc::new(Mutex::new(PipelineContext::new(
                config.texture_cache_capacity,
            ))),
            config: Arc::new(config),
            frames,
            binder,
            ledger: ResourceLedger::new(),
        })
    }

    fn context(&self) -> MutexGuard<'_, PipelineContext> {
        lock(&self.context)
    }

    // -- Target tracking ------------------------------------------------------

    /// The AR tracker found `target`. Returns the status line to show.
    #[instrument(skip_all, fields(target = %target))]
    pub fn target_found(&self, target: &TargetId) -> Result<String> {
        let binding = self.targets.resolve(target)?.clone();
        let message = format!("{} detected! Ready to capture.", binding.display_name);
        self.context().set_active(binding);
        info!("Target found");
        Ok(message)
    }

    /// The AR tracker lost `target`. Returns a status line if it was the
    /// active target; losing any other target changes nothing.
    #[instrument(skip_all, fields(target = %target))]
    pub fn target_lost(&self, target: &TargetId) -> Option<String> {
        if self.context().clear_active_if(target) {
            info!("Active target lost");
            Some("Target lost".to_string())
        } else {
            debug!("Lost target was not active");
            None
        }
    }

    pub fn active_target(&self) -> Option<TargetBinding> {
        self.context().active().cloned()
    }

    // -- Capture --------------------------------------------------------------

    /// Capture, rectify and bind in one go.
    pub async fn capture(&self) -> std::result::Result<CaptureOutcome, PipelineFailure> {
        let prepared = self.prepare()?;
        self.bind(prepared).await
    }

    /// Run the synchronous half of a capture.
    ///
    /// Rejected with `NoActiveTarget` when nothing is tracked and with
    /// `PipelineBusy` while another run is between capture and encoding.
    /// Any panic inside the pipeline is reported as `PipelineFault`.
    #[instrument(skip(self))]
    pub fn prepare(&self) -> std::result::Result<PreparedCapture, PipelineFailure> {
        let (target, generation) = {
            let mut ctx = self.context();
            if ctx.stage.is_busy() {
                return Err(MalwerkError::PipelineBusy.into());
            }
            let target = ctx.active().cloned().ok_or(MalwerkError::NoActiveTarget)?;
            let generation = ctx.next_generation();
            ctx.stage = PipelineStage::Capturing;
            (target, generation)
        };

        let run_id = RunId::new();
        info!(%run_id, generation, target = %target.target, "Capture started");

        let scope = ResourceScope::new(&self.ledger, format!("capture-{run_id}"));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_pipeline(&scope, generation)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                error!(%run_id, panic = %message, "Pipeline panicked");
                Err(MalwerkError::PipelineFault(message).into())
            });
        drop(scope);

        let mut ctx = self.context();
        match outcome {
            Ok((corners, size, texture)) => {
                ctx.advance(generation, PipelineStage::Binding);
                info!(%run_id, width = size.0, height = size.1, "Capture rectified");
                Ok(PreparedCapture {
                    run_id,
                    target,
                    corners,
                    size,
                    texture,
                    guard: BindingGuard {
                        context: Arc::clone(&self.context),
                        generation,
                    },
                })
            }
            Err(failure) => {
                ctx.advance(generation, PipelineStage::Idle);
                ctx.stats.failed += 1;
                if failure.error.is_recoverable() {
                    warn!(%run_id, error = %failure.error, "Capture failed");
                } else {
                    error!(%run_id, error = %failure.error, "Capture faulted");
                }
                Err(failure)
            }
        }
    }

    fn run_pipeline(
        &self,
        scope: &ResourceScope,
        generation: u64,
    ) -> std::result::Result<(OrderedCorners, (u32, u32), EncodedTexture), PipelineFailure> {
        let frame: RgbaImage = self.frames.current_frame()?;
        let frame = scope.track(frame);

        let rectification = self.rectifier.run(scope, &frame, |stage| {
            self.context().advance(generation, stage);
        })?;
        let page = scope.track(rectification.image);

        let texture = encode_texture(
            &page,
            self.config.texture_max_dimension,
            self.config.jpeg_quality,
        )?;
        Ok((rectification.corners, rectification.size, texture))
    }

    /// Hand a prepared texture to the binder.
    ///
    /// The run is checked against the current generation and active target
    /// both before the bind starts and after it resolves. A stale result is
    /// released instead of being applied. On success the model's previous
    /// texture is released exactly once.
    #[instrument(skip_all, fields(run_id = %prepared.run_id, target = %prepared.target.target))]
    pub async fn bind(
        &self,
        prepared: PreparedCapture,
    ) -> std::result::Result<CaptureOutcome, PipelineFailure> {
        let PreparedCapture {
            run_id,
            target,
            texture,
            guard,
            ..
        } = prepared;
        let generation = guard.generation;

        if let Some(staleness) = self.settle_stale(generation, &target.target) {
            warn!(?staleness, "Bind skipped");
            return Ok(staleness.into());
        }

        let handle = match self.binder.bind(&target.model, &texture).await {
            Ok(handle) => handle,
            Err(e) => {
                let mut ctx = self.context();
                ctx.advance(generation, PipelineStage::Idle);
                ctx.stats.failed += 1;
                let error = match e {
                    MalwerkError::TextureBindFailure(_) => e,
                    other => MalwerkError::TextureBindFailure(other.to_string()),
                };
                warn!(%error, "Texture bind failed");
                return Err(error.into());
            }
        };

        let (bound, previous) = {
            let mut ctx = self.context();
            if let Some(staleness) = ctx.staleness(generation, &target.target) {
                ctx.stats.discarded += 1;
                if staleness == Staleness::TargetChanged {
                    ctx.stage = PipelineStage::Idle;
                }
                drop(ctx);
                warn!(?staleness, %handle, "Discarding texture bound by a stale run");
                self.binder.release(handle);
                return Ok(staleness.into());
            }

            let bound = BoundTexture {
                run_id,
                model: target.model.clone(),
                handle,
                width: texture.width,
                height: texture.height,
                digest: texture.digest.clone(),
                bound_at: Utc::now(),
            };
            let previous = ctx.replace_slot(bound.clone());
            ctx.cache.insert(run_id, target.model.clone(), texture);
            ctx.stage = PipelineStage::Idle;
            ctx.stats.successful += 1;
            (bound, previous)
        };

        if let Some(old) = previous {
            debug!(handle = %old.handle, "Releasing replaced texture");
            self.binder.release(old.handle);
        }
        info!(%handle, width = bound.width, height = bound.height, "Coloring applied");
        Ok(CaptureOutcome::Bound(bound))
    }

    /// Pre-bind check. Returns how the run is stale, after recording it.
    fn settle_stale(&self, generation: u64, target: &TargetId) -> Option<Staleness> {
        let mut ctx = self.context();
        let staleness = ctx.staleness(generation, target)?;
        ctx.stats.discarded += 1;
        if staleness == Staleness::TargetChanged {
            ctx.stage = PipelineStage::Idle;
        }
        Some(staleness)
    }

    // -- Texture management ---------------------------------------------------

    /// Remove the active model's coloring and restore its original material.
    ///
    /// Any bind still in flight is superseded.
    #[instrument(skip(self))]
    pub fn reset_texture(&self) -> Result<()> {
        let (model, previous) = {
            let mut ctx = self.context();
            let model = ctx
                .active()
                .map(|b| b.model.clone())
                .ok_or(MalwerkError::NoActiveTarget)?;
            ctx.next_generation();
            ctx.stage = PipelineStage::Idle;
            let previous = ctx.take_slot(&model);
            (model, previous)
        };
        if let Some(bound) = previous {
            self.binder.release(bound.handle);
        }
        self.binder.restore_original(&model)?;
        info!(%model, "Texture reset");
        Ok(())
    }

    /// Release every bound texture and empty the cache.
    pub fn shutdown(&self) {
        let slots = {
            let mut ctx = self.context();
            ctx.next_generation();
            ctx.stage = PipelineStage::Idle;
            ctx.cache.clear();
            ctx.drain_slots()
        };
        for bound in &slots {
            self.binder.release(bound.handle);
        }
        info!(released = slots.len(), "Capture session shut down");
    }

    // -- Introspection --------------------------------------------------------

    pub fn stage(&self) -> PipelineStage {
        self.context().stage
    }

    pub fn stats(&self) -> CaptureStats {
        self.context().stats
    }

    /// Texture currently bound to `model`.
    pub fn bound_texture(&self, model: &ModelId) -> Option<BoundTexture> {
        self.context().slot(model).cloned()
    }

    /// Number of textures in the recent-texture cache.
    pub fn cached_textures(&self) -> usize {
        self.context().cache.len()
    }

    /// Ledger of every pipeline intermediate this session has created.
    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
