use std::io::Result;

use byteorder::{LittleEndian, ReadBytesExt};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::glm;
use crate::resource::resource::{read_char_array, char_array_to_string, ByteReader, Resource};

// ==== BSP FORMAT LAYOUT ====

/// GoldSrc (Half-Life 1) map format version.
pub const BSP_VERSION: i32 = 30;

pub const MAX_MAP_HULLS: usize = 4;

pub const MAX_MAP_MODELS: usize = 400;
pub const MAX_MAP_ENTITIES: usize = 1024;
pub const MAX_MAP_ENTSTRING: usize = 128 * 1024;

pub const MAX_MAP_PLANES: usize = 32767;
pub const MAX_MAP_NODES: usize = 32767; // Negative shorts are leaves
pub const MAX_MAP_CLIPNODES: usize = 32767;
pub const MAX_MAP_LEAFS: usize = 8192;
pub const MAX_MAP_VERTS: usize = 65535;
pub const MAX_MAP_FACES: usize = 65535;
pub const MAX_MAP_MARKSURFACES: usize = 65535;
pub const MAX_MAP_TEXINFO: usize = 8192;
pub const MAX_MAP_EDGES: usize = 256000;
pub const MAX_MAP_SURFEDGES: usize = 512000;
pub const MAX_MAP_TEXTURES: usize = 512;
pub const MAX_MAP_MIPTEX: usize = 0x200000;
pub const MAX_MAP_LIGHTING: usize = 0x200000;
pub const MAX_MAP_VISIBILITY: usize = 0x200000;

pub enum LumpType {
    LumpEntities = 0,
    LumpPlanes = 1,
    LumpTextures = 2,
    LumpVertexes = 3,
    LumpVisibility = 4,
    LumpNodes = 5,
    LumpTexinfo = 6,
    LumpFaces = 7,
    LumpLighting = 8,
    LumpClipNodes = 9,
    LumpLeaves = 10,
    LumpMarkSurfaces = 11,
    LumpEdges = 12,
    LumpSurfaceEdges = 13,
    LumpModels = 14,
    HeaderLumps = 15,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum ContentType {
    ContentsEmpty = -1,
    ContentsSolid = -2,
    ContentsWater = -3,
    ContentsSlime = -4,
    ContentsLava = -5,
    ContentsSky = -6,
    ContentsOrigin = -7,
    ContentsClip = -8,
    ContentsCurrent0 = -9,
    ContentsCurrent90 = -10,
    ContentsCurrent180 = -11,
    ContentsCurrent270 = -12,
    ContentsCurrentUp = -13,
    ContentsCurrentDown = -14,
    ContentsTranslucent = -15,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum PlaneType {
    PlaneX = 0,
    PlaneY = 1,
    PlaneZ = 2,
    PlaneAnyX = 3,
    PlaneAnyY = 4,
    PlaneAnyZ = 5,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Lump {
    pub offset: i32,
    pub length: i32,
}

impl Resource for Lump {
    type T = LittleEndian;
    const SIZE: usize = 8;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let offset: i32 = reader.read_i32::<Self::T>()?;
        let length: i32 = reader.read_i32::<Self::T>()?;
        Ok(Lump { offset, length })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: i32,
    pub lump: [Lump; LumpType::HeaderLumps as usize],
}

impl Resource for Header {
    type T = LittleEndian;
    const SIZE: usize = 4 + Lump::SIZE * LumpType::HeaderLumps as usize;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let version: i32 = reader.read_i32::<Self::T>()?;
        let mut lump: [Lump; LumpType::HeaderLumps as usize] = Default::default();
        for entry in lump.iter_mut() {
            *entry = Lump::from_reader(reader)?;
        }
        Ok(Header { version, lump })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub plane_index: u32,
    pub child_index: [i16; 2],
    pub lower: [i16; 3],
    pub upper: [i16; 3],
    pub first_face: u16,
    pub face_count: u16,
}

impl Resource for Node {
    type T = LittleEndian;
    const SIZE: usize = 24;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let plane_index: u32 = reader.read_u32::<Self::T>()?;
        let child_index: [i16; 2] = [
            reader.read_i16::<Self::T>()?,
            reader.read_i16::<Self::T>()?,
        ];
        let lower: [i16; 3] = [
            reader.read_i16::<Self::T>()?,
            reader.read_i16::<Self::T>()?,
            reader.read_i16::<Self::T>()?,
        ];
        let upper: [i16; 3] = [
            reader.read_i16::<Self::T>()?,
            reader.read_i16::<Self::T>()?,
            reader.read_i16::<Self::T>()?,
        ];
        let first_face: u16 = reader.read_u16::<Self::T>()?;
        let face_count: u16 = reader.read_u16::<Self::T>()?;
        Ok(Node {
            plane_index,
            child_index,
            lower,
            upper,
            first_face,
            face_count,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf {
    pub content: i32,
    pub vis_offset: i32,
    pub lower: [i16; 3],
    pub upper: [i16; 3],
    pub first_mark_surface: u16,
    pub mark_surface_count: u16,
    pub ambient_levels: [u8; 4],
}

impl Leaf {
    pub fn content_type(&self) -> Option<ContentType> {
        ContentType::from_i32(self.content)
    }
}

impl Resource for Leaf {
    type T = LittleEndian;
    const SIZE: usize = 28;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let content: i32 = reader.read_i32::<Self::T>()?;
        let vis_offset: i32 = reader.read_i32::<Self::T>()?;
        let lower: [i16; 3] = [
            reader.read_i16::<Self::T>()?,
            reader.read_i16::<Self::T>()?,
            reader.read_i16::<Self::T>()?,
        ];
        let upper: [i16; 3] = [
            reader.read_i16::<Self::T>()?,
            reader.read_i16::<Self::T>()?,
            reader.read_i16::<Self::T>()?,
        ];
        let first_mark_surface: u16 = reader.read_u16::<Self::T>()?;
        let mark_surface_count: u16 = reader.read_u16::<Self::T>()?;
        let mut ambient_levels: [u8; 4] = [0; 4];
        for level in ambient_levels.iter_mut() {
            *level = reader.read_u8()?;
        }
        Ok(Leaf {
            content,
            vis_offset,
            lower,
            upper,
            first_mark_surface,
            mark_surface_count,
            ambient_levels,
        })
    }
}

pub type MarkSurface = u16;

impl Resource for MarkSurface {
    type T = LittleEndian;
    const SIZE: usize = 2;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        reader.read_u16::<Self::T>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: glm::Vec3,
    pub dist: f32,
    pub r#type: i32,
}

impl Plane {
    pub fn axis_type(&self) -> Option<PlaneType> {
        PlaneType::from_i32(self.r#type)
    }
}

impl Resource for Plane {
    type T = LittleEndian;
    const SIZE: usize = 20;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let normal: glm::Vec3 = glm::vec3(
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
        );
        let dist: f32 = reader.read_f32::<Self::T>()?;
        let r#type: i32 = reader.read_i32::<Self::T>()?;
        Ok(Plane {
            normal,
            dist,
            r#type,
        })
    }
}

pub type Vertex = glm::Vec3;

impl Resource for Vertex {
    type T = LittleEndian;
    const SIZE: usize = 12;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        Ok(glm::vec3(
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub vertex_index: [u16; 2],
}

impl Resource for Edge {
    type T = LittleEndian;
    const SIZE: usize = 4;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let vertex_index: [u16; 2] = [
            reader.read_u16::<Self::T>()?,
            reader.read_u16::<Self::T>()?,
        ];
        Ok(Edge { vertex_index })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub plane_index: u16,
    /// Nonzero flips the plane normal for this face.
    pub side: u16,
    pub first_edge_index: i32,
    pub edge_count: i16,
    pub texture_info: i16,
    pub styles: [u8; 4], // 0: Lighting styles for the face, 1: Range from 0xFF (dark) to 0x00 (bright), 2: Additional model, 3: Additional model
    pub lightmap_offset: i32,
}

impl Resource for Face {
    type T = LittleEndian;
    const SIZE: usize = 20;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let plane_index: u16 = reader.read_u16::<Self::T>()?;
        let side: u16 = reader.read_u16::<Self::T>()?;
        let first_edge_index: i32 = reader.read_i32::<Self::T>()?;
        let edge_count: i16 = reader.read_i16::<Self::T>()?;
        let texture_info: i16 = reader.read_i16::<Self::T>()?;
        let mut styles: [u8; 4] = [0; 4];
        for style in styles.iter_mut() {
            *style = reader.read_u8()?;
        }
        let lightmap_offset: i32 = reader.read_i32::<Self::T>()?;
        Ok(Face {
            plane_index,
            side,
            first_edge_index,
            edge_count,
            texture_info,
            styles,
            lightmap_offset,
        })
    }
}

/// Signed edge reference; a negative value walks the edge second vertex
/// first.
pub type SurfaceEdge = i32;

impl Resource for SurfaceEdge {
    type T = LittleEndian;
    const SIZE: usize = 4;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        reader.read_i32::<Self::T>()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TextureHeader {
    pub mip_texture_count: u32,
}

/// Offset of a miptex header relative to the start of the texture lump;
/// `-1` marks a slot with no texture data.
pub type MipTexOffset = i32;

pub const MAX_TEXTURE_NAME: usize = 16;
pub const MIP_LEVELS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipTex {
    pub name: [u8; MAX_TEXTURE_NAME],
    pub width: u32,
    pub height: u32,
    pub offsets: [u32; MIP_LEVELS],
    /// Embedded mip-0 palette indices (`width * height` bytes), present only
    /// when `offsets[0]` is nonzero. Raw indices, not RGBA; the palette
    /// lives in a WAD.
    pub pixels: Option<Vec<u8>>,
}

impl MipTex {
    pub fn name(&self) -> String {
        char_array_to_string(&self.name)
    }
}

impl Resource for MipTex {
    type T = LittleEndian;
    const SIZE: usize = 40;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let mut name: [u8; MAX_TEXTURE_NAME] = [0; MAX_TEXTURE_NAME];
        read_char_array(reader, &mut name)?;
        let width: u32 = reader.read_u32::<Self::T>()?;
        let height: u32 = reader.read_u32::<Self::T>()?;
        let mut offsets: [u32; MIP_LEVELS] = [0; MIP_LEVELS];
        for offset in offsets.iter_mut() {
            *offset = reader.read_u32::<Self::T>()?;
        }
        Ok(MipTex {
            name,
            width,
            height,
            offsets,
            pixels: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureInfo {
    pub s: glm::Vec3,
    pub s_shift: f32,
    pub t: glm::Vec3,
    pub t_shift: f32,
    pub mip_tex_index: u32,
    pub flags: u32,
}

impl Resource for TextureInfo {
    type T = LittleEndian;
    const SIZE: usize = 40;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let s: glm::Vec3 = glm::vec3(
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
        );
        let s_shift: f32 = reader.read_f32::<Self::T>()?;
        let t: glm::Vec3 = glm::vec3(
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
        );
        let t_shift: f32 = reader.read_f32::<Self::T>()?;
        let mip_tex_index: u32 = reader.read_u32::<Self::T>()?;
        let flags: u32 = reader.read_u32::<Self::T>()?;
        Ok(TextureInfo {
            s,
            s_shift,
            t,
            t_shift,
            mip_tex_index,
            flags,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Model {
    pub lower: glm::Vec3,
    pub upper: glm::Vec3,
    pub origin: glm::Vec3,
    pub head_nodes_index: [i32; MAX_MAP_HULLS],
    pub vis_leaves: i32,
    pub first_face: i32,
    pub face_count: i32,
}

impl Resource for Model {
    type T = LittleEndian;
    const SIZE: usize = 64;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let lower: glm::Vec3 = glm::vec3(
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
        );
        let upper: glm::Vec3 = glm::vec3(
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
        );
        let origin: glm::Vec3 = glm::vec3(
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
            reader.read_f32::<Self::T>()?,
        );
        let mut head_nodes_index: [i32; MAX_MAP_HULLS] = [0; MAX_MAP_HULLS];
        for index in head_nodes_index.iter_mut() {
            *index = reader.read_i32::<Self::T>()?;
        }
        let vis_leaves: i32 = reader.read_i32::<Self::T>()?;
        let first_face: i32 = reader.read_i32::<Self::T>()?;
        let face_count: i32 = reader.read_i32::<Self::T>()?;
        Ok(Model {
            lower,
            upper,
            origin,
            head_nodes_index,
            vis_leaves,
            first_face,
            face_count,
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClipNode {
    pub plane_index: i32,
    pub child_index: [i16; 2],
}

impl Resource for ClipNode {
    type T = LittleEndian;
    const SIZE: usize = 8;

    fn from_reader(reader: &mut ByteReader) -> Result<Self> {
        let plane_index: i32 = reader.read_i32::<Self::T>()?;
        let child_index: [i16; 2] = [
            reader.read_i16::<Self::T>()?,
            reader.read_i16::<Self::T>()?,
        ];
        Ok(ClipNode {
            plane_index,
            child_index,
        })
    }
}
