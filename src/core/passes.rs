use super::constants::*;
use fnv::FnvHashMap;
use smallvec::SmallVec;
use thiserror::Error;

/// Every stage the render pipeline knows how to encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassId {
    DepthPrepass,
    AuxScene,
    SceneColor,
    Displacement,
    DepthBlur,
    Chromatic,
    Bloom,
    Gamma,
}

impl PassId {
    pub const ALL: [PassId; 8] = [
        PassId::DepthPrepass,
        PassId::AuxScene,
        PassId::SceneColor,
        PassId::Displacement,
        PassId::DepthBlur,
        PassId::Chromatic,
        PassId::Bloom,
        PassId::Gamma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PassId::DepthPrepass => "depth_prepass",
            PassId::AuxScene => "aux_scene",
            PassId::SceneColor => "scene_color",
            PassId::Displacement => "displacement",
            PassId::DepthBlur => "depth_blur",
            PassId::Chromatic => "chromatic",
            PassId::Bloom => "bloom",
            PassId::Gamma => "gamma",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Where a pass writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutput {
    /// A full-resolution target allocated and owned by the pass.
    Target,
    /// The visible framebuffer.
    Screen,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PassDescriptor {
    pub id: PassId,
    pub inputs: SmallVec<[PassId; 3]>,
    pub output: PassOutput,
}

impl PassDescriptor {
    pub fn target(id: PassId, inputs: &[PassId]) -> Self {
        Self {
            id,
            inputs: SmallVec::from_slice(inputs),
            output: PassOutput::Target,
        }
    }

    pub fn screen(id: PassId, inputs: &[PassId]) -> Self {
        Self {
            id,
            inputs: SmallVec::from_slice(inputs),
            output: PassOutput::Screen,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("pass `{}` declared twice", .0.name())]
    DuplicatePass(PassId),
    #[error("pass `{}` reads undeclared pass `{}`", .pass.name(), .input.name())]
    UnknownInput { pass: PassId, input: PassId },
    #[error("pass `{}` reads the screen output of `{}`", .pass.name(), .input.name())]
    ReadsScreen { pass: PassId, input: PassId },
    #[error("pass graph has a cycle through {0:?}")]
    Cycle(Vec<PassId>),
    #[error("no pass writes to the screen")]
    NoScreenOutput,
    #[error("more than one pass writes to the screen")]
    MultipleScreenOutputs,
    #[error("screen pass `{}` is not the last pass", .0.name())]
    ScreenNotLast(PassId),
    #[error("pass `{}` read `{}` before it was written this frame", .pass.name(), .input.name())]
    StaleInput { pass: PassId, input: PassId },
    #[error("pass `{}` has no parameter `{name}`", .pass.name())]
    UnknownParameter { pass: PassId, name: String },
    #[error("invalid value {value} for `{}.{name}`", .pass.name())]
    InvalidValue { pass: PassId, name: String, value: f32 },
}

/// Validated, ordered pass chain plus the size of every pass target.
#[derive(Clone, Debug)]
pub struct PassGraph {
    order: Vec<PassDescriptor>,
    width: u32,
    height: u32,
}

impl PassGraph {
    /// Validate `descriptors` and order them so every pass follows the passes
    /// it reads. Independent passes keep their declaration order.
    pub fn new(descriptors: Vec<PassDescriptor>) -> Result<Self, PipelineError> {
        let mut outputs: FnvHashMap<PassId, PassOutput> = FnvHashMap::default();
        for d in &descriptors {
            if outputs.insert(d.id, d.output).is_some() {
                return Err(PipelineError::DuplicatePass(d.id));
            }
        }
        for d in &descriptors {
            for &input in &d.inputs {
                match outputs.get(&input) {
                    None => return Err(PipelineError::UnknownInput { pass: d.id, input }),
                    Some(PassOutput::Screen) => {
                        return Err(PipelineError::ReadsScreen { pass: d.id, input })
                    }
                    Some(PassOutput::Target) => {}
                }
            }
        }
        let screens = descriptors
            .iter()
            .filter(|d| d.output == PassOutput::Screen)
            .count();
        match screens {
            0 => return Err(PipelineError::NoScreenOutput),
            1 => {}
            _ => return Err(PipelineError::MultipleScreenOutputs),
        }

        let mut pending = descriptors;
        let mut order: Vec<PassDescriptor> = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending.iter().position(|d| {
                d.inputs
                    .iter()
                    .all(|i| order.iter().any(|placed| placed.id == *i))
            });
            match ready {
                Some(idx) => order.push(pending.remove(idx)),
                None => return Err(PipelineError::Cycle(pending.iter().map(|d| d.id).collect())),
            }
        }
        if let Some(pos) = order.iter().position(|d| d.output == PassOutput::Screen) {
            if pos + 1 != order.len() {
                return Err(PipelineError::ScreenNotLast(order[pos].id));
            }
        }
        Ok(Self {
            order,
            width: 1,
            height: 1,
        })
    }

    /// The application's chain: depth pre-pass and aux scene feed the
    /// displacement and depth blur stages, then aberration, bloom and gamma.
    pub fn standard() -> Result<Self, PipelineError> {
        use PassId::*;
        Self::new(vec![
            PassDescriptor::target(DepthPrepass, &[]),
            PassDescriptor::target(AuxScene, &[]),
            PassDescriptor::target(SceneColor, &[]),
            PassDescriptor::target(Displacement, &[SceneColor, AuxScene]),
            PassDescriptor::target(DepthBlur, &[Displacement, DepthPrepass]),
            PassDescriptor::target(Chromatic, &[DepthBlur]),
            PassDescriptor::target(Bloom, &[Chromatic]),
            PassDescriptor::screen(Gamma, &[Bloom]),
        ])
    }

    pub fn order(&self) -> impl Iterator<Item = &PassDescriptor> + '_ {
        self.order.iter()
    }

    pub fn ids(&self) -> Vec<PassId> {
        self.order.iter().map(|d| d.id).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn position(&self, id: PassId) -> Option<usize> {
        self.order.iter().position(|d| d.id == id)
    }

    pub fn descriptor(&self, id: PassId) -> Option<&PassDescriptor> {
        self.order.iter().find(|d| d.id == id)
    }

    /// Resize every pass target; zero dimensions are clamped to 1.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Value for every pass's resolution uniform.
    pub fn resolution(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }

    /// Pixel size of the target `id` writes; `None` for the screen pass.
    pub fn target_size(&self, id: PassId) -> Option<(u32, u32)> {
        self.descriptor(id)
            .filter(|d| d.output == PassOutput::Target)
            .map(|_| (self.width, self.height))
    }

    pub fn targets(&self) -> impl Iterator<Item = (PassId, (u32, u32))> + '_ {
        self.order
            .iter()
            .filter(|d| d.output == PassOutput::Target)
            .map(move |d| (d.id, (self.width, self.height)))
    }

    /// Run one frame: every pass in order, with its inputs checked against
    /// the ledger before `encode` sees it.
    pub fn execute_frame<E: From<PipelineError>>(
        &self,
        ledger: &mut FrameLedger,
        mut encode: impl FnMut(&PassDescriptor) -> Result<(), E>,
    ) -> Result<(), E> {
        ledger.begin_frame();
        for pass in &self.order {
            ledger.check_inputs(pass)?;
            encode(pass)?;
            ledger.record(pass.id);
        }
        Ok(())
    }
}

/// Records which pass outputs were written in which frame.
#[derive(Debug, Default)]
pub struct FrameLedger {
    frame: u64,
    written: FnvHashMap<PassId, u64>,
}

impl FrameLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn record(&mut self, id: PassId) {
        self.written.insert(id, self.frame);
    }

    pub fn written_this_frame(&self, id: PassId) -> bool {
        self.written.get(&id) == Some(&self.frame)
    }

    pub fn check_inputs(&self, pass: &PassDescriptor) -> Result<(), PipelineError> {
        match pass.inputs.iter().find(|i| !self.written_this_frame(**i)) {
            Some(&input) => Err(PipelineError::StaleInput {
                pass: pass.id,
                input,
            }),
            None => Ok(()),
        }
    }
}

/// Externally tunable scalars for every effect pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PostParams {
    pub displacement_scale: f32,
    pub displacement_speed: f32,
    pub max_blur_size: f32,
    pub blur_directions: f32,
    pub blur_quality: f32,
    pub aberration_strength: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub bloom_threshold: f32,
    pub exposure: f32,
    pub gamma: f32,
}

impl Default for PostParams {
    fn default() -> Self {
        Self {
            displacement_scale: DISPLACEMENT_SCALE,
            displacement_speed: DISPLACEMENT_SPEED,
            max_blur_size: MAX_BLUR_SIZE,
            blur_directions: BLUR_DIRECTIONS,
            blur_quality: BLUR_QUALITY,
            aberration_strength: ABERRATION_STRENGTH,
            bloom_strength: BLOOM_STRENGTH,
            bloom_radius: BLOOM_RADIUS,
            bloom_threshold: BLOOM_THRESHOLD,
            exposure: EXPOSURE,
            gamma: GAMMA,
        }
    }
}

impl PostParams {
    fn slot_mut(&mut self, pass: PassId, name: &str) -> Option<&mut f32> {
        Some(match (pass, name) {
            (PassId::Displacement, "scale") => &mut self.displacement_scale,
            (PassId::Displacement, "speed") => &mut self.displacement_speed,
            (PassId::DepthBlur, "max_blur_size") => &mut self.max_blur_size,
            (PassId::DepthBlur, "directions") => &mut self.blur_directions,
            (PassId::DepthBlur, "quality") => &mut self.blur_quality,
            (PassId::Chromatic, "strength") => &mut self.aberration_strength,
            (PassId::Bloom, "strength") => &mut self.bloom_strength,
            (PassId::Bloom, "radius") => &mut self.bloom_radius,
            (PassId::Bloom, "threshold") => &mut self.bloom_threshold,
            (PassId::Gamma, "exposure") => &mut self.exposure,
            (PassId::Gamma, "gamma") => &mut self.gamma,
            _ => return None,
        })
    }

    pub fn get(&self, pass: PassId, name: &str) -> Result<f32, PipelineError> {
        let mut copy = self.clone();
        copy.slot_mut(pass, name)
            .map(|v| *v)
            .ok_or_else(|| PipelineError::UnknownParameter {
                pass,
                name: name.to_string(),
            })
    }

    /// Set one named parameter. Values must be finite and non-negative;
    /// sample counts are rounded and kept at 1 or more.
    pub fn set(&mut self, pass: PassId, name: &str, value: f32) -> Result<(), PipelineError> {
        let invalid = || PipelineError::InvalidValue {
            pass,
            name: name.to_string(),
            value,
        };
        let is_count = matches!((pass, name), (PassId::DepthBlur, "directions" | "quality"));
        let slot = self
            .slot_mut(pass, name)
            .ok_or_else(|| PipelineError::UnknownParameter {
                pass,
                name: name.to_string(),
            })?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }
        if name == "gamma" && value == 0.0 {
            return Err(invalid());
        }
        *slot = if is_count { value.round().max(1.0) } else { value };
        Ok(())
    }
}
