//! Batch orchestration.
//!
//! A batch walks base images, and for each sample:
//!
//! 1. Randomizes the scene
//! 2. Generates a piece and its labels
//! 3. Hands the piece to the renderer as `<index>.png`
//! 4. Appends the label row
//! 5. Resets the scene to its baseline
//!
//! The reset runs whether or not the sample succeeded. On failure the
//! partial CSV is flushed and the error is returned.
//!
//! # Output layout
//!
//! ```text
//! output/
//!   0/            per-base mode: one directory per base image
//!     base.jpg    copy of the base image (optional)
//!     data.csv
//!     0.png 1.png ...
//!   random/       total mode: one directory for all samples
//!     data.csv
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::error::Result;
use crate::generator::PieceGenerator;
use crate::io::csv::{LabelWriter, LABEL_FILE};
use crate::render::{RenderJob, Renderer};
use crate::sampler::ParameterSampler;
use crate::scene::{SceneRandomizer, SceneState};
use crate::textures::{BaseImage, FloorLibrary};

/// Directory used by [`BatchMode::TotalRandom`].
pub const RANDOM_DIR: &str = "random";

/// File stem of the copied base image.
pub const BASE_COPY_STEM: &str = "base";

/// How samples are distributed over base images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// `per_base` samples for every base image, each in its own directory.
    PerBase {
        /// Samples per base image.
        per_base: usize,
    },
    /// `total` samples, each on a uniformly drawn base image.
    TotalRandom {
        /// Total number of samples.
        total: usize,
    },
}

impl BatchMode {
    /// Number of samples for `num_bases` base images.
    pub fn num_samples(&self, num_bases: usize) -> usize {
        match *self {
            BatchMode::PerBase { per_base } => per_base * num_bases,
            BatchMode::TotalRandom { total } => total,
        }
    }
}

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Sample distribution.
    pub mode: BatchMode,
    /// Root output directory.
    pub output_dir: PathBuf,
    /// Copy each base image into its per-base directory.
    pub copy_base: bool,
}

impl BatchOptions {
    /// Options writing to `output_dir`, copying base images.
    pub fn new<P: Into<PathBuf>>(mode: BatchMode, output_dir: P) -> Self {
        Self {
            mode,
            output_dir: output_dir.into(),
            copy_base: true,
        }
    }

    /// Enable or disable copying base images.
    pub fn with_copy_base(mut self, copy_base: bool) -> Self {
        self.copy_base = copy_base;
        self
    }
}

/// A finished sample, as reported to [`BatchProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleEvent {
    /// Samples finished so far, this one included.
    pub done: usize,
    /// Samples in the whole batch.
    pub total: usize,
    /// Base image the sample was drawn on.
    pub base_index: usize,
    /// Index of the sample within its output directory.
    pub sample: usize,
}

impl SampleEvent {
    /// Completed share of the batch in whole percent, rounded to nearest.
    pub fn percent(&self) -> usize {
        if self.total == 0 || self.done >= self.total {
            return 100;
        }
        (self.done * 100 + self.total / 2) / self.total
    }
}

/// Observer notified after every rendered sample.
///
/// ```
/// use jigsaw_synth::batch::BatchProgress;
///
/// let progress = BatchProgress::new(|event| {
///     eprintln!("{}% (base {}, sample {})", event.percent(), event.base_index, event.sample);
/// });
/// # drop(progress);
/// ```
pub struct BatchProgress {
    callback: Box<dyn Fn(&SampleEvent) + Send + Sync>,
}

impl BatchProgress {
    /// Create an observer from a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&SampleEvent) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// An observer that ignores every event.
    pub fn none() -> Self {
        Self::new(|_| {})
    }

    #[inline]
    fn sample_done(&self, event: SampleEvent) {
        (self.callback)(&event);
    }
}

impl Default for BatchProgress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for BatchProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProgress").finish_non_exhaustive()
    }
}

/// What a finished batch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Samples rendered.
    pub samples: usize,
    /// Label files written.
    pub label_files: Vec<PathBuf>,
}

/// Sequences scene randomization, piece generation, labelling and
/// rendering over a set of base images.
pub struct BatchOrchestrator<'a, R: Renderer> {
    generator: PieceGenerator<'a>,
    randomizer: SceneRandomizer,
    floors: &'a FloorLibrary,
    renderer: R,
    scene: SceneState,
}

impl<'a, R: Renderer> BatchOrchestrator<'a, R> {
    /// Create an orchestrator starting from the baseline scene.
    pub fn new(
        generator: PieceGenerator<'a>,
        randomizer: SceneRandomizer,
        floors: &'a FloorLibrary,
        renderer: R,
    ) -> Self {
        Self {
            generator,
            randomizer,
            floors,
            renderer,
            scene: SceneState::default(),
        }
    }

    /// Current scene state. Equals the baseline between samples.
    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Run a batch over `bases`.
    pub fn run(
        &mut self,
        bases: &[BaseImage],
        options: &BatchOptions,
        sampler: &mut ParameterSampler,
        progress: &BatchProgress,
    ) -> Result<BatchSummary> {
        fs::create_dir_all(&options.output_dir)?;
        let mut summary = BatchSummary::default();
        if bases.is_empty() {
            return Ok(summary);
        }
        let total = options.mode.num_samples(bases.len());
        info!(
            "Starting batch: {} samples over {} base images",
            total,
            bases.len()
        );

        match options.mode {
            BatchMode::PerBase { per_base } => {
                for (base_index, base) in bases.iter().enumerate() {
                    let dir = options.output_dir.join(base_index.to_string());
                    fs::create_dir_all(&dir)?;
                    if options.copy_base {
                        copy_base_image(&base.path, &dir)?;
                    }
                    info!("Base {} ({}): {} samples", base_index, base.path.display(), per_base);

                    let mut writer = LabelWriter::create(dir.join(LABEL_FILE))?;
                    for count in 0..per_base {
                        self.sample_into(&mut writer, base, count, &dir, sampler)?;
                        summary.samples += 1;
                        progress.sample_done(SampleEvent {
                            done: summary.samples,
                            total,
                            base_index,
                            sample: count,
                        });
                    }
                    writer.flush()?;
                    summary.label_files.push(writer.path().to_path_buf());
                }
            }
            BatchMode::TotalRandom { .. } => {
                let dir = options.output_dir.join(RANDOM_DIR);
                fs::create_dir_all(&dir)?;
                let mut writer = LabelWriter::create(dir.join(LABEL_FILE))?;
                for count in 0..total {
                    let base_index = sampler.index(bases.len());
                    self.sample_into(&mut writer, &bases[base_index], count, &dir, sampler)?;
                    summary.samples += 1;
                    progress.sample_done(SampleEvent {
                        done: summary.samples,
                        total,
                        base_index,
                        sample: count,
                    });
                }
                writer.flush()?;
                summary.label_files.push(writer.path().to_path_buf());
            }
        }

        info!("Batch complete: {} samples", summary.samples);
        Ok(summary)
    }

    /// Run one sample, always resetting the scene afterwards. On failure
    /// the rows written so far are flushed before the error is returned.
    fn sample_into(
        &mut self,
        writer: &mut LabelWriter,
        base: &BaseImage,
        index: usize,
        dir: &Path,
        sampler: &mut ParameterSampler,
    ) -> Result<()> {
        let result = self.sample(writer, base, index, dir, sampler);
        self.scene.reset();

        if let Err(e) = &result {
            error!("Sample {} in {} failed: {}", index, dir.display(), e);
            writer.flush()?;
        }
        result
    }

    fn sample(
        &mut self,
        writer: &mut LabelWriter,
        base: &BaseImage,
        index: usize,
        dir: &Path,
        sampler: &mut ParameterSampler,
    ) -> Result<()> {
        self.randomizer
            .randomize(&mut self.scene, sampler, self.floors);

        let generated = self
            .generator
            .generate(sampler, base.size, &mut self.scene.material)?;
        let output = dir.join(format!("{}.png", index));
        let job = RenderJob {
            piece: &generated.piece,
            scene: &self.scene,
            base_image: &base.path,
            output: &output,
        };
        self.renderer.render(&job)?;

        // Rows only for samples that have an image
        writer.write(&base.path, index, &generated.labels)
    }
}

/// Copy `base` into `dir` as `base.<ext>`, keeping the original extension.
pub fn copy_base_image(base: &Path, dir: &Path) -> Result<PathBuf> {
    let mut target = dir.join(BASE_COPY_STEM);
    if let Some(ext) = base.extension() {
        target.set_extension(ext);
    }
    fs::copy(base, &target)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MeshBackend;
    use crate::config::PieceConfig;
    use crate::error::SynthError;
    use crate::template::{TemplateOptions, TemplateSection};
    use crate::uv::{ImageSize, PlanarUnwrap};
    use std::sync::{Arc, Mutex};

    /// Records jobs and checks the scene was randomized when rendering.
    #[derive(Default)]
    struct RecordingRenderer {
        outputs: Vec<PathBuf>,
        lenses: Vec<f64>,
        fail_at: Option<usize>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, job: &RenderJob<'_>) -> Result<()> {
            if self.fail_at == Some(self.outputs.len()) {
                return Err(SynthError::invalid_param("render", "forced", "test failure"));
            }
            self.outputs.push(job.output.to_path_buf());
            self.lenses.push(job.scene.camera.lens);
            Ok(())
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("jigsaw_batch_{}_{}", name, std::process::id()));
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn bases(dir: &Path) -> Vec<BaseImage> {
        ["a.png", "b.png"]
            .iter()
            .map(|name| {
                let path = dir.join(name);
                fs::write(&path, b"not really an image").unwrap();
                BaseImage {
                    path,
                    size: ImageSize::new(640, 480),
                }
            })
            .collect()
    }

    fn read_rows(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_per_base_layout() {
        let root = scratch("per_base");
        let bases = bases(&root);
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        let config = PieceConfig::default();
        let backend = MeshBackend::default();
        let floors = FloorLibrary::default();
        let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
        let mut batch = BatchOrchestrator::new(
            generator,
            SceneRandomizer::default(),
            &floors,
            RecordingRenderer::default(),
        );

        let out = root.join("out");
        let options = BatchOptions::new(BatchMode::PerBase { per_base: 3 }, &out);
        let summary = batch
            .run(&bases, &options, &mut ParameterSampler::new(4), &BatchProgress::none())
            .unwrap();

        assert_eq!(summary.samples, 6);
        assert_eq!(summary.label_files, vec![out.join("0/data.csv"), out.join("1/data.csv")]);
        assert!(out.join("0/base.png").exists());
        assert_eq!(batch.renderer().outputs[4], out.join("1/1.png"));
        assert!(batch.renderer().lenses.iter().all(|l| (24.0..=28.0).contains(l)));
        assert_eq!(batch.scene(), &SceneState::default());

        let rows = read_rows(&out.join("1/data.csv"));
        assert_eq!(rows.len(), 3);
        assert!(rows[2].starts_with(&format!("{},2,", bases[1].path.display())));
        assert_eq!(rows[0].split(',').count(), 10);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_total_random_mode() {
        let root = scratch("total");
        let bases = bases(&root);
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        let config = PieceConfig::default();
        let backend = MeshBackend::default();
        let floors = FloorLibrary::default();
        let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
        let mut batch = BatchOrchestrator::new(
            generator,
            SceneRandomizer::default(),
            &floors,
            RecordingRenderer::default(),
        );

        let out = root.join("out");
        let options = BatchOptions::new(BatchMode::TotalRandom { total: 5 }, &out).with_copy_base(false);
        let summary = batch
            .run(&bases, &options, &mut ParameterSampler::new(8), &BatchProgress::none())
            .unwrap();

        assert_eq!(summary.samples, 5);
        assert_eq!(summary.label_files, vec![out.join("random/data.csv")]);
        assert_eq!(read_rows(&out.join("random/data.csv")).len(), 5);
        assert!(!out.join("random/base.png").exists());
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_failure_resets_scene_and_flushes() {
        let root = scratch("failure");
        let bases = bases(&root);
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        let config = PieceConfig::default();
        let backend = MeshBackend::default();
        let floors = FloorLibrary::default();
        let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
        let renderer = RecordingRenderer {
            fail_at: Some(2),
            ..Default::default()
        };
        let mut batch = BatchOrchestrator::new(generator, SceneRandomizer::default(), &floors, renderer);

        let out = root.join("out");
        let options = BatchOptions::new(BatchMode::PerBase { per_base: 4 }, &out);
        let result = batch.run(&bases, &options, &mut ParameterSampler::new(1), &BatchProgress::none());

        assert!(result.is_err());
        assert_eq!(batch.scene(), &SceneState::default());
        // Samples 0 and 1 rendered; sample 2 failed before its row
        assert_eq!(read_rows(&out.join("0/data.csv")).len(), 2);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_same_seed_same_csv() {
        let root = scratch("repro");
        let bases = bases(&root);
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        let config = PieceConfig::default();
        let backend = MeshBackend::default();
        let floors = FloorLibrary::default();

        let run = |name: &str| {
            let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
            let mut batch = BatchOrchestrator::new(
                generator,
                SceneRandomizer::default(),
                &floors,
                RecordingRenderer::default(),
            );
            let out = root.join(name);
            let options = BatchOptions::new(BatchMode::TotalRandom { total: 3 }, &out);
            batch
                .run(&bases, &options, &mut ParameterSampler::new(99), &BatchProgress::none())
                .unwrap();
            fs::read_to_string(out.join("random/data.csv")).unwrap()
        };
        assert_eq!(run("first"), run("second"));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_progress_events() {
        let root = scratch("progress");
        let bases = bases(&root);
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        let config = PieceConfig::default();
        let backend = MeshBackend::default();
        let floors = FloorLibrary::default();
        let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
        let mut batch = BatchOrchestrator::new(
            generator,
            SceneRandomizer::default(),
            &floors,
            RecordingRenderer::default(),
        );

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let progress = BatchProgress::new(move |e| sink.lock().unwrap().push(*e));
        let options = BatchOptions::new(BatchMode::PerBase { per_base: 2 }, root.join("out"));
        batch
            .run(&bases, &options, &mut ParameterSampler::new(3), &progress)
            .unwrap();

        let events = events.lock().unwrap();
        let seen: Vec<_> = events.iter().map(|e| (e.done, e.base_index, e.sample)).collect();
        assert_eq!(seen, vec![(1, 0, 0), (2, 0, 1), (3, 1, 0), (4, 1, 1)]);
        assert!(events.iter().all(|e| e.total == 4));
        assert_eq!(events[1].percent(), 50);
        assert_eq!(events[3].percent(), 100);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_percent_rounds_and_saturates() {
        let event = |done, total| SampleEvent {
            done,
            total,
            base_index: 0,
            sample: 0,
        };
        assert_eq!(event(1, 3).percent(), 33);
        assert_eq!(event(2, 3).percent(), 67);
        assert_eq!(event(0, 0).percent(), 100);
    }
}
