//! Fog Pass Plan
//!
//! The per-frame GPU work of the fog pipeline is a fixed sequence. This
//! module describes it as data so the order and the resource wiring can be
//! inspected without a device; [`FogRenderPipeline::execute`] walks the plan
//! and encodes each step.
//!
//! # Data Flow
//!
//! ```text
//! CameraColor ──copy──► ColorCopy ─────────────────────────────┐
//! SceneDepth ──Copy Depth──► HalfDepth                         │
//! HalfDepth + noise (+ volumes) ──Render Fog──► Fog            │
//! Fog ──H──► Blur0 ──V──► Blur1 ──H──► Blur0 ──V──► Blur1      │
//! ColorCopy + Blur1 + depths ──Apply Fog──► CameraColor ◄──────┘
//! ```
//!
//! [`FogRenderPipeline::execute`]: crate::FogRenderPipeline::execute

use smallvec::SmallVec;
use vfog_resources::FogKeywords;

use crate::program::FogPass;
use crate::targets::FogTargetSlot;

/// Number of separable blur iterations (each is one H and one V pass).
pub const BLUR_ITERATIONS: usize = 2;

/// Coarse phase a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FogStage {
    Copy,
    DepthDownsample,
    FogAccumulation,
    Blur,
    Apply,
}

/// Texture or buffer a step reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FogResource {
    /// The camera's color target (host owned).
    CameraColor,
    /// Full-resolution scene depth (host owned).
    SceneDepth,
    ColorCopy,
    HalfDepth,
    Fog,
    Blur0,
    Blur1,
    BlueNoise,
    Noise,
    CurlNoise,
}

impl FogResource {
    /// Pipeline-owned target backing this resource, if any.
    #[must_use]
    pub fn target_slot(self) -> Option<FogTargetSlot> {
        match self {
            Self::ColorCopy => Some(FogTargetSlot::ColorCopy),
            Self::HalfDepth => Some(FogTargetSlot::HalfDepth),
            Self::Fog => Some(FogTargetSlot::Fog),
            Self::Blur0 => Some(FogTargetSlot::Blur0),
            Self::Blur1 => Some(FogTargetSlot::Blur1),
            _ => None,
        }
    }
}

/// One full-screen program draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FogDraw {
    pub stage: FogStage,
    pub pass: FogPass,
    /// Group 1 inputs; binding `i` is `inputs[i]`.
    pub inputs: SmallVec<[FogResource; 4]>,
    /// Whether group 2 carries the volume array.
    pub reads_volumes: bool,
    pub target: FogResource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FogStep {
    Copy {
        source: FogResource,
        target: FogResource,
    },
    Draw(FogDraw),
}

impl FogStep {
    #[must_use]
    pub fn stage(&self) -> FogStage {
        match self {
            Self::Copy { .. } => FogStage::Copy,
            Self::Draw(draw) => draw.stage,
        }
    }
}

/// Ordered steps of one fog frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FogPassPlan {
    steps: Vec<FogStep>,
}

impl FogPassPlan {
    /// Builds the plan for the given keyword set.
    #[must_use]
    pub fn new(keywords: FogKeywords) -> Self {
        let mut steps = Vec::with_capacity(3 + 2 * BLUR_ITERATIONS + 1);

        steps.push(FogStep::Copy {
            source: FogResource::CameraColor,
            target: FogResource::ColorCopy,
        });

        steps.push(FogStep::Draw(FogDraw {
            stage: FogStage::DepthDownsample,
            pass: FogPass::CopyDepth,
            inputs: smallvec::smallvec![FogResource::SceneDepth],
            reads_volumes: false,
            target: FogResource::HalfDepth,
        }));

        steps.push(FogStep::Draw(FogDraw {
            stage: FogStage::FogAccumulation,
            pass: FogPass::RenderFog,
            inputs: smallvec::smallvec![
                FogResource::HalfDepth,
                FogResource::BlueNoise,
                FogResource::Noise,
                FogResource::CurlNoise,
            ],
            reads_volumes: keywords.contains(FogKeywords::VOLUMES),
            target: FogResource::Fog,
        }));

        let mut source = FogResource::Fog;
        for _ in 0..BLUR_ITERATIONS {
            steps.push(blur(FogPass::BlurHorizontal, source, FogResource::Blur0));
            steps.push(blur(FogPass::BlurVertical, FogResource::Blur0, FogResource::Blur1));
            source = FogResource::Blur1;
        }

        steps.push(FogStep::Draw(FogDraw {
            stage: FogStage::Apply,
            pass: FogPass::ApplyFog,
            inputs: smallvec::smallvec![
                FogResource::ColorCopy,
                FogResource::Blur1,
                FogResource::HalfDepth,
                FogResource::SceneDepth,
            ],
            reads_volumes: false,
            target: FogResource::CameraColor,
        }));

        Self { steps }
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[FogStep] {
        &self.steps
    }

    pub fn draws(&self) -> impl Iterator<Item = &FogDraw> {
        self.steps.iter().filter_map(|step| match step {
            FogStep::Draw(draw) => Some(draw),
            FogStep::Copy { .. } => None,
        })
    }

    /// Program passes in execution order.
    #[must_use]
    pub fn program_passes(&self) -> Vec<FogPass> {
        self.draws().map(|draw| draw.pass).collect()
    }
}

fn blur(pass: FogPass, source: FogResource, target: FogResource) -> FogStep {
    FogStep::Draw(FogDraw {
        stage: FogStage::Blur,
        pass,
        inputs: smallvec::smallvec![source, FogResource::HalfDepth],
        reads_volumes: false,
        target,
    })
}
