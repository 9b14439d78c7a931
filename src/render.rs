//! Rendering seam.
//!
//! The photoreal render step is external. A [`Renderer`] receives the
//! finished piece (with its deferred finishing stack), the scene state and
//! the target image path. [`SceneExporter`] is the built-in implementation:
//! it evaluates the stack and writes the piece mesh plus a JSON scene
//! description next to the target, ready for an external renderer.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::error::Result;
use crate::io::obj::{save_obj, ObjMaterial};
use crate::io::{ply, stl, Format};
use crate::modifier::{MeshObject, Modifier, ModifierBackend};
use crate::scene::SceneState;

/// Everything needed to render one sample.
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    /// Piece with its finishing stack still deferred.
    pub piece: &'a MeshObject,
    /// Scene to render in.
    pub scene: &'a SceneState,
    /// Image applied as the piece decal.
    pub base_image: &'a Path,
    /// Target image path, `<index>.png`.
    pub output: &'a Path,
}

/// Produces the image for a [`RenderJob`].
pub trait Renderer {
    /// Render `job` to `job.output`.
    fn render(&mut self, job: &RenderJob<'_>) -> Result<()>;
}

/// Renderer that does nothing. Useful for label-only runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _job: &RenderJob<'_>) -> Result<()> {
        Ok(())
    }
}

/// JSON written next to every exported piece.
#[derive(Debug, Serialize)]
struct SceneDescription<'a> {
    image: &'a Path,
    mesh: PathBuf,
    base_image: &'a Path,
    modifiers: &'a [Modifier],
    scene: &'a SceneState,
}

/// Writes the evaluated piece and a scene description for each job.
///
/// For target `out/7.png` this produces `out/7.obj` (plus `out/7.mtl`), or
/// `.ply`/`.stl` depending on the format, and `out/7.json`.
pub struct SceneExporter<B: ModifierBackend> {
    backend: B,
    format: Format,
}

impl<B: ModifierBackend> SceneExporter<B> {
    /// Exporter writing OBJ.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            format: Format::Obj,
        }
    }

    /// Set the mesh format.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    fn mesh_path(&self, output: &Path) -> PathBuf {
        let ext = match self.format {
            Format::Obj => "obj",
            Format::Ply => "ply",
            Format::Stl => "stl",
        };
        output.with_extension(ext)
    }
}

impl<B: ModifierBackend> Renderer for SceneExporter<B> {
    fn render(&mut self, job: &RenderJob<'_>) -> Result<()> {
        let mesh = job.piece.evaluate(&self.backend)?;
        let mesh_path = self.mesh_path(job.output);

        match self.format {
            Format::Obj => {
                let material = ObjMaterial {
                    name: "piece".to_string(),
                    diffuse_map: Some(job.base_image.to_path_buf()),
                    specular: job.scene.material.specular,
                };
                save_obj(&mesh, &mesh_path, Some(&material))?;
            }
            Format::Ply => ply::save_ply(&mesh, &mesh_path)?,
            Format::Stl => stl::save_stl(&mesh, &mesh_path)?,
        }

        let description = SceneDescription {
            image: job.output,
            mesh: mesh_path.clone(),
            base_image: job.base_image,
            modifiers: job.piece.modifiers(),
            scene: job.scene,
        };
        let json_path = job.output.with_extension("json");
        serde_json::to_writer_pretty(BufWriter::new(File::create(&json_path)?), &description)?;

        debug!(
            "Exported {} ({} faces) and {}",
            mesh_path.display(),
            mesh.num_faces(),
            json_path.display()
        );
        Ok(())
    }
}
