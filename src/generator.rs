//! One piece, end to end.
//!
//! [`PieceGenerator`] runs the per-piece pipeline for a single iteration:
//!
//! 1. Draw [`IterationParams`]
//! 2. Draw the warp anchors
//! 3. Build the four quarters and join them into the piece
//! 4. Place the UV island and extract corner labels
//! 5. Push the finishing stack and set the specular
//!
//! All intermediate state lives in an [`IterationContext`] owned by the call,
//! so nothing leaks from one iteration into the next.

use log::debug;

use crate::assemble::{join_quarters, live_section, quarter_copies};
use crate::config::PieceConfig;
use crate::deform::{sample_anchor_pairs, warp_fields, AnchorPair};
use crate::error::{Result, SynthError};
use crate::finish::{apply_finish, sample_finish, FinishParams};
use crate::modifier::{MeshObject, ModifierBackend};
use crate::sampler::{IterationParams, ParameterSampler};
use crate::scene::Material;
use crate::template::TemplateSection;
use crate::uv::{CornerLabels, ImageSize, LabelEngine, UnwrapOptions, Unwrapper};

/// Working set of one iteration.
#[derive(Debug, Default)]
pub struct IterationContext {
    /// Sampled parameters.
    pub params: Option<IterationParams>,
    /// Warp anchors.
    pub anchors: Vec<AnchorPair>,
    /// Masked quarters. Left in place when the join fails, cleared once it
    /// succeeds.
    pub quarters: Vec<MeshObject>,
    /// The joined piece.
    pub piece: Option<MeshObject>,
}

/// Output of one iteration.
#[derive(Debug, Clone)]
pub struct GeneratedPiece {
    /// Flat piece with UVs and the finishing stack deferred.
    pub piece: MeshObject,
    /// Corner UVs.
    pub labels: CornerLabels,
    /// Parameters the piece was drawn with.
    pub params: IterationParams,
    /// Finishing parameters.
    pub finish: FinishParams,
}

/// Runs the per-piece pipeline against injected operators.
pub struct PieceGenerator<'a> {
    section: &'a TemplateSection,
    config: &'a PieceConfig,
    backend: &'a dyn ModifierBackend,
    unwrapper: &'a dyn Unwrapper,
}

impl<'a> PieceGenerator<'a> {
    /// Create a generator.
    pub fn new(
        section: &'a TemplateSection,
        config: &'a PieceConfig,
        backend: &'a dyn ModifierBackend,
        unwrapper: &'a dyn Unwrapper,
    ) -> Self {
        Self {
            section,
            config,
            backend,
            unwrapper,
        }
    }

    /// Generate one piece for an image of size `image`, setting the piece
    /// material's specular in `material`.
    pub fn generate(
        &self,
        sampler: &mut ParameterSampler,
        image: ImageSize,
        material: &mut Material,
    ) -> Result<GeneratedPiece> {
        let mut ctx = IterationContext::default();
        self.generate_in(&mut ctx, sampler, image, material)
    }

    /// Like [`generate`](Self::generate), but leaves intermediate state in
    /// `ctx` for inspection.
    pub fn generate_in(
        &self,
        ctx: &mut IterationContext,
        sampler: &mut ParameterSampler,
        image: ImageSize,
        material: &mut Material,
    ) -> Result<GeneratedPiece> {
        let params = sampler.iteration_params(self.config);
        ctx.params = Some(params);
        debug!(
            "Piece: scale {:.4}, end scale {:.4}, rotation {:.1}, sides {:?}",
            params.overall_scale, params.end_scale, params.rotation_degrees, params.sides
        );

        ctx.anchors = sample_anchor_pairs(sampler, &params, self.config);
        let live = live_section(self.section, &warp_fields(&ctx.anchors));
        ctx.quarters = quarter_copies(&live, &params.sides, self.backend)?;

        let joined = join_quarters(ctx.quarters.clone(), self.backend)?;
        ctx.quarters.clear();
        let piece = ctx.piece.insert(joined);

        let options = UnwrapOptions::default().with_margin(self.config.unwrap_margin);
        let engine = LabelEngine::new(self.unwrapper, options);
        let labels = engine.label(
            &mut piece.mesh,
            image,
            params.overall_scale,
            params.rotation_degrees,
            sampler,
        )?;

        let finish = sample_finish(sampler, self.config);
        apply_finish(piece, material, &finish);

        let piece = ctx.piece.take().ok_or(SynthError::EmptyMesh)?;
        Ok(GeneratedPiece {
            piece,
            labels,
            params,
            finish,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MeshBackend;
    use crate::deform::WarpField;
    use crate::mesh::{PieceMesh, VertexGroup, VertexRemap};
    use crate::sampler::SideKind;
    use crate::template::TemplateOptions;
    use crate::uv::PlanarUnwrap;

    fn section() -> TemplateSection {
        TemplateSection::build(&TemplateOptions::default()).unwrap()
    }

    #[test]
    fn test_labels_in_unit_square() {
        let section = section();
        let config = PieceConfig::default();
        let backend = MeshBackend::default();
        let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
        let mut sampler = ParameterSampler::new(77);

        for size in [ImageSize::new(640, 480), ImageSize::new(480, 640), ImageSize::new(512, 512)] {
            let mut material = Material::default();
            let out = generator.generate(&mut sampler, size, &mut material).unwrap();
            for c in out.labels.corners {
                assert!((0.0..=1.0).contains(&c.x) && (0.0..=1.0).contains(&c.y));
            }
            assert_eq!(out.piece.modifiers().len(), 3);
            assert_eq!(material.specular, out.finish.specular);
        }
    }

    #[test]
    fn test_same_seed_same_labels() {
        let section = section();
        let config = PieceConfig::default();
        let backend = MeshBackend::default();
        let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);

        let run = |seed| {
            let mut sampler = ParameterSampler::new(seed);
            let mut material = Material::default();
            generator
                .generate(&mut sampler, ImageSize::new(800, 600), &mut material)
                .unwrap()
                .labels
        };
        assert_eq!(run(5), run(5));
        assert_ne!(run(5), run(6));
    }

    #[test]
    fn test_context_keeps_working_set() {
        let section = section();
        let config = PieceConfig::default();
        let backend = MeshBackend::default();
        let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
        let mut sampler = ParameterSampler::new(1);
        let mut ctx = IterationContext::default();
        let mut material = Material::default();

        generator
            .generate_in(&mut ctx, &mut sampler, ImageSize::new(100, 100), &mut material)
            .unwrap();
        assert_eq!(ctx.anchors.len(), crate::deform::NUM_ANCHORS);
        assert!(ctx.quarters.is_empty());
        assert!(ctx.piece.is_none());
        assert!(ctx.params.is_some());
    }

    /// Built-in operators, except that welding never merges anything.
    struct NoWeld(MeshBackend);

    impl ModifierBackend for NoWeld {
        fn warp(&self, mesh: &mut PieceMesh, field: &WarpField) -> Result<()> {
            self.0.warp(mesh, field)
        }
        fn mask(&self, mesh: &PieceMesh, group: VertexGroup) -> Result<(PieceMesh, VertexRemap)> {
            self.0.mask(mesh, group)
        }
        fn weld(&self, mesh: &PieceMesh, _threshold: f64) -> Result<(PieceMesh, VertexRemap)> {
            self.0.weld(mesh, 0.0)
        }
        fn solidify(&self, mesh: &PieceMesh, thickness: f64) -> Result<PieceMesh> {
            self.0.solidify(mesh, thickness)
        }
        fn subdivide(&self, mesh: &PieceMesh, levels: u32) -> Result<PieceMesh> {
            self.0.subdivide(mesh, levels)
        }
        fn bevel(&self, mesh: &PieceMesh, segments: u32, width: f64) -> Result<PieceMesh> {
            self.0.bevel(mesh, segments, width)
        }
    }

    #[test]
    fn test_failed_join_keeps_quarters() {
        let section = section();
        let config = PieceConfig::default();
        let backend = NoWeld(MeshBackend::default());
        let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
        let mut sampler = ParameterSampler::new(1);
        let mut ctx = IterationContext::default();
        let mut material = Material::default();

        let result =
            generator.generate_in(&mut ctx, &mut sampler, ImageSize::new(100, 100), &mut material);
        assert!(matches!(result, Err(SynthError::NotWatertight { .. })));
        assert_eq!(ctx.quarters.len(), 4);
        assert!(ctx.quarters.iter().all(|q| q.mesh.num_faces() > 0));
        assert!(ctx.piece.is_none());
    }

    #[test]
    fn test_pinned_square_labels() {
        let section = section();
        let mut config = PieceConfig::default();
        config.scale = crate::config::ValueRange::new(0.1, 0.1);
        config.end_scale = crate::config::ValueRange::new(1.0, 1.0);
        config.uv_rotation_degrees = crate::config::ValueRange::new(0.0, 0.0);
        config.warp_location_randomness = 0.0;
        config.warp_scale_randomness = 0.0;
        config.cutoff_edge = 0.0;
        let backend = MeshBackend::default();
        let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
        let mut sampler = ParameterSampler::new(3);
        let mut material = Material::default();

        let out = generator
            .generate(&mut sampler, ImageSize::new(256, 256), &mut material)
            .unwrap();
        assert_eq!(out.params.sides, [SideKind::Edge; 4]);

        let xs: Vec<f64> = out.labels.corners.iter().map(|c| c.x).collect();
        let ys: Vec<f64> = out.labels.corners.iter().map(|c| c.y).collect();
        let span = |v: &[f64]| {
            v.iter().cloned().fold(f64::MIN, f64::max) - v.iter().cloned().fold(f64::MAX, f64::min)
        };
        assert!((span(&xs) - 0.0998).abs() < 1e-9);
        assert!((span(&ys) - 0.0998).abs() < 1e-9);
        // Axis-aligned: each corner shares x with one other and y with another
        for c in &out.labels.corners {
            assert_eq!(xs.iter().filter(|&&x| (x - c.x).abs() < 1e-9).count(), 2);
            assert_eq!(ys.iter().filter(|&&y| (y - c.y).abs() < 1e-9).count(), 2);
        }
    }
}
