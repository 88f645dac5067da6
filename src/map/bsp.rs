use bit_set::BitSet;
use byteorder::{LittleEndian, ReadBytesExt};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::MapError;
use crate::glm;
use crate::map::bsp30::{self, LumpType};
use crate::map::wad::Wad;
use crate::resource::resource::{ByteReader, Resource};
use crate::scene::entity::Entity;

lazy_static! {
    static ref ENTITY_BLOCK_REGEX: Regex =
        Regex::new(r"\{([^}]*)\}").expect("Could not compile entity block regex");
}

/// UV normalization fallback for textures whose header carries a zero
/// dimension and which cannot be resolved from a WAD.
pub const DEFAULT_TEXTURE_SIZE: u32 = 64;

const LUMP_NAMES: [&str; LumpType::HeaderLumps as usize] = [
    "entities",
    "planes",
    "textures",
    "vertices",
    "visibility",
    "nodes",
    "texinfo",
    "faces",
    "lighting",
    "clipnodes",
    "leaves",
    "marksurfaces",
    "edges",
    "surfedges",
    "models",
];

/// A fully decoded BSP v30 document. Immutable once parsed; every derived
/// query borrows it read-only, so concurrent use needs no synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct BSP {
    pub header: bsp30::Header,
    pub entities: Vec<Entity>,
    pub planes: Vec<bsp30::Plane>,
    pub texture_header: bsp30::TextureHeader,
    pub mip_texture_offsets: Vec<bsp30::MipTexOffset>,
    /// One slot per texture; `None` marks a `-1` offset in the texture
    /// lump, preserved so texinfo cross-references stay index-correct.
    pub mip_textures: Vec<Option<bsp30::MipTex>>,
    pub vertices: Vec<bsp30::Vertex>,
    pub visibility: Option<Vec<u8>>,
    pub nodes: Vec<bsp30::Node>,
    pub texture_infos: Vec<bsp30::TextureInfo>,
    pub faces: Vec<bsp30::Face>,
    pub lighting: Option<Vec<u8>>,
    pub clip_nodes: Vec<bsp30::ClipNode>,
    pub leaves: Vec<bsp30::Leaf>,
    pub mark_surfaces: Vec<bsp30::MarkSurface>,
    pub edges: Vec<bsp30::Edge>,
    pub surface_edges: Vec<bsp30::SurfaceEdge>,
    pub models: Vec<bsp30::Model>,
}

impl BSP {
    /// Decode a BSP v30 buffer into an owned document. Pure: the same bytes
    /// always produce the same document and a failed call leaves nothing
    /// behind.
    pub fn parse(data: &[u8]) -> Result<BSP, MapError> {
        let mut reader = ByteReader::new(data);
        let header = bsp30::Header::from_reader(&mut reader)
            .map_err(|source| MapError::Truncated {
                lump: "header",
                source,
            })?;
        if header.version != bsp30::BSP_VERSION {
            return Err(MapError::UnsupportedVersion(header.version));
        }
        for (lump, name) in header.lump.iter().zip(LUMP_NAMES) {
            check_lump(lump, data.len(), name)?;
        }
        let directory: [bsp30::Lump; LumpType::HeaderLumps as usize] = header.lump;
        let lump = |kind: LumpType| directory[kind as usize];

        let entities = Self::parse_entities(&mut reader, &lump(LumpType::LumpEntities))?;
        let (texture_header, mip_texture_offsets, mip_textures) =
            Self::parse_textures(&mut reader, &lump(LumpType::LumpTextures), data.len())?;
        Ok(BSP {
            entities,
            planes: read_lump(&mut reader, &lump(LumpType::LumpPlanes), "planes")?,
            texture_header,
            mip_texture_offsets,
            mip_textures,
            vertices: read_lump(&mut reader, &lump(LumpType::LumpVertexes), "vertices")?,
            visibility: Self::parse_blob(
                &mut reader,
                &lump(LumpType::LumpVisibility),
                "visibility",
            )?,
            nodes: read_lump(&mut reader, &lump(LumpType::LumpNodes), "nodes")?,
            texture_infos: read_lump(&mut reader, &lump(LumpType::LumpTexinfo), "texinfo")?,
            faces: read_lump(&mut reader, &lump(LumpType::LumpFaces), "faces")?,
            lighting: Self::parse_blob(&mut reader, &lump(LumpType::LumpLighting), "lighting")?,
            clip_nodes: read_lump(&mut reader, &lump(LumpType::LumpClipNodes), "clipnodes")?,
            leaves: read_lump(&mut reader, &lump(LumpType::LumpLeaves), "leaves")?,
            mark_surfaces: read_lump(
                &mut reader,
                &lump(LumpType::LumpMarkSurfaces),
                "marksurfaces",
            )?,
            edges: read_lump(&mut reader, &lump(LumpType::LumpEdges), "edges")?,
            surface_edges: read_lump(
                &mut reader,
                &lump(LumpType::LumpSurfaceEdges),
                "surfedges",
            )?,
            models: read_lump(&mut reader, &lump(LumpType::LumpModels), "models")?,
            header,
        })
    }

    fn parse_entities(
        reader: &mut ByteReader,
        lump: &bsp30::Lump,
    ) -> Result<Vec<Entity>, MapError> {
        reader.seek(lump.offset as usize);
        let raw: Vec<u8> = reader
            .read_bytes(lump.length as usize)
            .map_err(|source| MapError::Truncated {
                lump: "entities",
                source,
            })?;
        let end: usize = raw.iter().position(|&byte| byte == 0).unwrap_or(raw.len());
        let text = String::from_utf8_lossy(&raw[..end]);
        Ok(ENTITY_BLOCK_REGEX
            .captures_iter(&text)
            .filter_map(|block| Entity::from_block(&block[1]))
            .collect())
    }

    fn parse_textures(
        reader: &mut ByteReader,
        lump: &bsp30::Lump,
        size: usize,
    ) -> Result<
        (
            bsp30::TextureHeader,
            Vec<bsp30::MipTexOffset>,
            Vec<Option<bsp30::MipTex>>,
        ),
        MapError,
    > {
        if lump.length == 0 {
            return Ok((bsp30::TextureHeader::default(), Vec::new(), Vec::new()));
        }
        let truncated = |source| MapError::Truncated {
            lump: "textures",
            source,
        };
        let corrupt = || MapError::CorruptLump {
            lump: "textures",
            offset: lump.offset as i64,
            length: lump.length as i64,
            size,
        };

        reader.seek(lump.offset as usize);
        let count: i32 = reader.read_i32::<LittleEndian>().map_err(truncated)?;
        if count < 0 {
            return Err(corrupt());
        }
        let texture_header = bsp30::TextureHeader {
            mip_texture_count: count as u32,
        };
        let mut offsets: Vec<bsp30::MipTexOffset> = Vec::with_capacity(count as usize);
        for _ in 0..count {
            offsets.push(reader.read_i32::<LittleEndian>().map_err(truncated)?);
        }

        let mut textures: Vec<Option<bsp30::MipTex>> = Vec::with_capacity(count as usize);
        for &offset in offsets.iter() {
            if offset == -1 {
                textures.push(None);
                continue;
            }
            if offset < 0 {
                return Err(corrupt());
            }
            let base: usize = (lump.offset as i64 + offset as i64) as usize;
            reader.seek(base);
            let mut mip_texture = bsp30::MipTex::from_reader(reader).map_err(truncated)?;
            if mip_texture.offsets[0] != 0 {
                let pixel_count: usize = (mip_texture.width as usize)
                    .checked_mul(mip_texture.height as usize)
                    .ok_or_else(corrupt)?;
                reader.seek(base + mip_texture.offsets[0] as usize);
                mip_texture.pixels = Some(reader.read_bytes(pixel_count).map_err(truncated)?);
            }
            textures.push(Some(mip_texture));
        }
        Ok((texture_header, offsets, textures))
    }

    fn parse_blob(
        reader: &mut ByteReader,
        lump: &bsp30::Lump,
        name: &'static str,
    ) -> Result<Option<Vec<u8>>, MapError> {
        if lump.length == 0 {
            return Ok(None);
        }
        reader.seek(lump.offset as usize);
        reader
            .read_bytes(lump.length as usize)
            .map(Some)
            .map_err(|source| MapError::Truncated { lump: name, source })
    }

    /// The ordered boundary polygon of a face. A negative surfedge walks its
    /// edge from the second vertex, which is what keeps consecutive edges
    /// head-to-tail around the loop.
    ///
    /// Out-of-range face indices (or indices referenced by corrupt face
    /// records) are caller precondition violations and panic.
    pub fn face_vertices(&self, face_index: usize) -> Vec<glm::Vec3> {
        let face = &self.faces[face_index];
        let count: usize = face.edge_count.max(0) as usize;
        let mut vertices: Vec<glm::Vec3> = Vec::with_capacity(count);
        for i in 0..count {
            let surface_edge: bsp30::SurfaceEdge =
                self.surface_edges[(face.first_edge_index as i64 + i as i64) as usize];
            let edge = &self.edges[surface_edge.unsigned_abs() as usize];
            let vertex_index: u16 = if surface_edge >= 0 {
                edge.vertex_index[0]
            } else {
                edge.vertex_index[1]
            };
            vertices.push(self.vertices[vertex_index as usize]);
        }
        vertices
    }

    /// The face's plane normal, flipped when the face lies on the back side
    /// of its plane.
    pub fn face_normal(&self, face_index: usize) -> glm::Vec3 {
        let face = &self.faces[face_index];
        let normal: glm::Vec3 = self.planes[face.plane_index as usize].normal;
        if face.side != 0 {
            -normal
        } else {
            normal
        }
    }

    /// Texture-space coordinates of a world position under a texinfo's
    /// planar mapping. Missing texture references produce `(0, 0)`; a
    /// present texture with a zero dimension normalizes against
    /// [`DEFAULT_TEXTURE_SIZE`].
    pub fn tex_coords(&self, position: glm::Vec3, texinfo_index: usize) -> glm::Vec2 {
        self.tex_coords_resolved(position, texinfo_index, None)
    }

    pub(crate) fn tex_coords_resolved(
        &self,
        position: glm::Vec3,
        texinfo_index: usize,
        wad_textures: Option<&Wad>,
    ) -> glm::Vec2 {
        let info = &self.texture_infos[texinfo_index];
        let texture = self
            .mip_textures
            .get(info.mip_tex_index as usize)
            .and_then(Option::as_ref);
        let Some(texture) = texture else {
            return glm::vec2(0.0, 0.0);
        };
        let (width, height) = resolve_dimensions(texture, wad_textures);
        glm::vec2(
            (glm::dot(&info.s, &position) + info.s_shift) / width,
            (glm::dot(&info.t, &position) + info.t_shift) / height,
        )
    }

    pub fn entities_by_classname(&self, classname: &str) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|entity| entity.classname() == Some(classname))
            .collect()
    }

    /// Player spawn position: the first `info_player_start`, falling back to
    /// `info_player_deathmatch`, else the world origin.
    pub fn spawn_point(&self) -> glm::Vec3 {
        for classname in ["info_player_start", "info_player_deathmatch"] {
            if let Some(entity) = self.entities_by_classname(classname).into_iter().next() {
                return entity
                    .origin()
                    .unwrap_or_else(|| glm::vec3(0.0, 0.0, 0.0));
            }
        }
        glm::vec3(0.0, 0.0, 0.0)
    }

    /// Face indices belonging to a model. Model 0 is the static world;
    /// higher indices are brush entities.
    pub fn model_faces(&self, model_index: usize) -> Vec<usize> {
        let model = &self.models[model_index];
        let first: usize = model.first_face.max(0) as usize;
        (first..first + model.face_count.max(0) as usize).collect()
    }

    /// Decompress the potentially-visible set for a leaf. `None` means no
    /// visibility data applies and everything should be treated as visible.
    /// Set members are leaf indices; leaf 0 (the solid leaf) never appears.
    pub fn leaf_visibility(&self, leaf_index: usize) -> Option<BitSet<u8>> {
        let leaf = &self.leaves[leaf_index];
        let visibility = self.visibility.as_ref()?;
        if leaf.vis_offset < 0 {
            return None;
        }
        let leaf_count: usize = match self.models.first() {
            Some(model) if model.vis_leaves > 0 => model.vis_leaves as usize,
            _ => self.leaves.len().saturating_sub(1),
        };
        let mut visible: BitSet<u8> = BitSet::default();
        let mut offset: usize = leaf.vis_offset as usize;
        let mut leaf_id: usize = 1;
        while leaf_id <= leaf_count {
            let Some(&byte) = visibility.get(offset) else {
                break;
            };
            offset += 1;
            if byte == 0 {
                // Run-length: a zero byte skips 8 * count leaves.
                let Some(&run) = visibility.get(offset) else {
                    break;
                };
                offset += 1;
                leaf_id += 8 * run as usize;
                continue;
            }
            for bit in 0..8 {
                if leaf_id > leaf_count {
                    break;
                }
                if byte & (1 << bit) != 0 {
                    visible.insert(leaf_id);
                }
                leaf_id += 1;
            }
        }
        Some(visible)
    }
}

/// Resolve the dimensions used to normalize UVs: the texture's own header,
/// then the WAD entry of the same name, then [`DEFAULT_TEXTURE_SIZE`].
pub(crate) fn resolve_dimensions(
    texture: &bsp30::MipTex,
    wad_textures: Option<&Wad>,
) -> (f32, f32) {
    let mut width: u32 = texture.width;
    let mut height: u32 = texture.height;
    if width == 0 || height == 0 {
        if let Some(wad_texture) = wad_textures.and_then(|wad| wad.texture(&texture.name())) {
            if width == 0 {
                width = wad_texture.width;
            }
            if height == 0 {
                height = wad_texture.height;
            }
        }
    }
    let fallback = |dimension: u32| {
        if dimension == 0 {
            DEFAULT_TEXTURE_SIZE as f32
        } else {
            dimension as f32
        }
    };
    (fallback(width), fallback(height))
}

fn check_lump(lump: &bsp30::Lump, size: usize, name: &'static str) -> Result<(), MapError> {
    let offset: i64 = lump.offset as i64;
    let length: i64 = lump.length as i64;
    if offset < 0 || length < 0 || offset + length > size as i64 {
        return Err(MapError::CorruptLump {
            lump: name,
            offset,
            length,
            size,
        });
    }
    Ok(())
}

/// Read every whole record a lump holds. Trailing remainder bytes are
/// ignored rather than rejected; tools pad lumps to 4-byte boundaries.
fn read_lump<R: Resource>(
    reader: &mut ByteReader,
    lump: &bsp30::Lump,
    name: &'static str,
) -> Result<Vec<R>, MapError> {
    reader.seek(lump.offset as usize);
    let count: usize = lump.length as usize / R::SIZE;
    let mut records: Vec<R> = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(
            R::from_reader(reader).map_err(|source| MapError::Truncated { lump: name, source })?,
        );
    }
    Ok(records)
}
