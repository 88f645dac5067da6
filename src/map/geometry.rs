use serde::Serialize;

use crate::glm;
use crate::map::bsp::BSP;
use crate::map::wad::Wad;

/// GoldSrc units are roughly an inch; 0.02 brings them to meter-ish scale.
/// A presentation default, not a format constant.
pub const DEFAULT_SCALE: f32 = 0.02;

/// GoldSrc maps are Z-up; the output mesh is Y-up.
pub fn convert_coords(v: glm::Vec3) -> glm::Vec3 {
    glm::vec3(v.x, v.z, -v.y)
}

/// Flat triangle-soup mesh description: three position and normal
/// components plus two texture coordinates per vertex, partitioned into
/// per-texture draw groups.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MapGeometry {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub groups: Vec<TextureGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureGroup {
    pub texture_name: String,
    pub start_vertex: usize,
    pub vertex_count: usize,
}

/// Fan-triangulate the given faces into one vertex stream grouped by
/// texture. Faces whose texture reference resolves to nothing land in the
/// `"default"` group; groups appear in first-encounter order. `wad_textures`
/// only supplies UV dimensions for textures whose BSP header lacks them.
pub fn build_geometry(
    bsp: &BSP,
    face_indices: &[usize],
    wad_textures: Option<&Wad>,
    scale: f32,
) -> MapGeometry {
    let mut partitions: Vec<(String, Vec<usize>)> = Vec::new();
    for &face_index in face_indices {
        let name: String = texture_name(bsp, face_index);
        match partitions.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, faces)) => faces.push(face_index),
            None => partitions.push((name, vec![face_index])),
        }
    }

    let mut geometry = MapGeometry::default();
    for (texture_name, faces) in partitions {
        let start_vertex: usize = geometry.positions.len() / 3;
        for face_index in faces {
            emit_face(bsp, face_index, wad_textures, scale, &mut geometry);
        }
        let vertex_count: usize = geometry.positions.len() / 3 - start_vertex;
        if vertex_count > 0 {
            geometry.groups.push(TextureGroup {
                texture_name,
                start_vertex,
                vertex_count,
            });
        }
    }
    geometry
}

fn emit_face(
    bsp: &BSP,
    face_index: usize,
    wad_textures: Option<&Wad>,
    scale: f32,
    geometry: &mut MapGeometry,
) {
    let vertices: Vec<glm::Vec3> = bsp.face_vertices(face_index);
    if vertices.len() < 3 {
        // Degenerate boundary, nothing to triangulate.
        return;
    }
    let face = &bsp.faces[face_index];
    let texinfo_index: usize = face.texture_info as usize;
    let normal: glm::Vec3 = convert_coords(bsp.face_normal(face_index));

    for i in 1..vertices.len() - 1 {
        for vertex in [vertices[0], vertices[i], vertices[i + 1]] {
            let position: glm::Vec3 = convert_coords(vertex) * scale;
            geometry
                .positions
                .extend_from_slice(&[position.x, position.y, position.z]);
            geometry
                .normals
                .extend_from_slice(&[normal.x, normal.y, normal.z]);
            // UVs come from source-space positions, with V flipped for a
            // top-left texture origin.
            let uv: glm::Vec2 = if texinfo_index < bsp.texture_infos.len() {
                bsp.tex_coords_resolved(vertex, texinfo_index, wad_textures)
            } else {
                glm::vec2(0.0, 0.0)
            };
            geometry.uvs.extend_from_slice(&[uv.x, 1.0 - uv.y]);
        }
    }
}

fn texture_name(bsp: &BSP, face_index: usize) -> String {
    bsp.texture_infos
        .get(bsp.faces[face_index].texture_info as usize)
        .and_then(|info| bsp.mip_textures.get(info.mip_tex_index as usize))
        .and_then(Option::as_ref)
        .map(|texture| texture.name())
        .unwrap_or_else(|| String::from("default"))
}
