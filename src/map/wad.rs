use std::collections::HashMap;
use std::io::Result as IoResult;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::MapError;
use crate::map::bsp30::{MAX_TEXTURE_NAME, MIP_LEVELS};
use crate::resource::image::Image;
use crate::resource::resource::{char_array_to_string, read_char_array, ByteReader, Resource};

/// "WAD3" read as a little-endian u32.
pub const WAD3_MAGIC: u32 = 0x33444157;

pub const WAD_TYPE_PALETTE: u8 = 0x40;
pub const WAD_TYPE_MIPTEX: u8 = 0x43;
pub const WAD_TYPE_FONT: u8 = 0x45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WadHeader {
    pub magic: u32,
    pub n_dir: i32,
    pub dir_offset: i32,
}

impl Resource for WadHeader {
    type T = LittleEndian;
    const SIZE: usize = 12;

    fn from_reader(reader: &mut ByteReader) -> IoResult<Self> {
        let magic: u32 = reader.read_u32::<Self::T>()?;
        let n_dir: i32 = reader.read_i32::<Self::T>()?;
        let dir_offset: i32 = reader.read_i32::<Self::T>()?;
        Ok(WadHeader {
            magic,
            n_dir,
            dir_offset,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WadDirEntry {
    pub n_file_pos: i32,
    pub n_disk_size: i32,
    pub n_size: i32,
    pub r#type: u8,
    pub compressed: bool,
    /// Upper-cased on read; lump lookup is case-insensitive.
    pub name: String,
}

impl Resource for WadDirEntry {
    type T = LittleEndian;
    const SIZE: usize = 32;

    fn from_reader(reader: &mut ByteReader) -> IoResult<Self> {
        let n_file_pos: i32 = reader.read_i32::<Self::T>()?;
        let n_disk_size: i32 = reader.read_i32::<Self::T>()?;
        let n_size: i32 = reader.read_i32::<Self::T>()?;
        let r#type: u8 = reader.read_u8()?;
        let compressed: bool = reader.read_u8()? != 0;
        reader.read_u16::<Self::T>()?; // padding
        let mut name: [u8; MAX_TEXTURE_NAME] = [0; MAX_TEXTURE_NAME];
        read_char_array(reader, &mut name)?;
        Ok(WadDirEntry {
            n_file_pos,
            n_disk_size,
            n_size,
            r#type,
            compressed,
            name: char_array_to_string(&name).to_uppercase(),
        })
    }
}

/// A decoded miptex: the texture's own (case-preserved) name, its mip-0
/// dimensions, and all four mip levels expanded from palette indices to
/// RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipmapTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub img: [Image; MIP_LEVELS],
}

impl MipmapTexture {
    pub fn mip0(&self) -> &Image {
        &self.img[0]
    }
}

/// A decoded WAD3 texture archive.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Wad {
    pub dir_entries: Vec<WadDirEntry>,
    textures: HashMap<String, MipmapTexture>,
}

impl Wad {
    /// Decode a WAD3 buffer. Only miptex lumps are expanded; palette and
    /// font lumps (and anything else) are listed in `dir_entries` but not
    /// decoded.
    pub fn parse(data: &[u8]) -> Result<Wad, MapError> {
        let mut reader = ByteReader::new(data);
        let header = WadHeader::from_reader(&mut reader).map_err(|source| MapError::Truncated {
            lump: "WAD header",
            source,
        })?;
        if header.magic != WAD3_MAGIC {
            return Err(MapError::InvalidMagic(header.magic));
        }
        let dir_offset: i64 = header.dir_offset as i64;
        let dir_length: i64 = header.n_dir as i64 * WadDirEntry::SIZE as i64;
        if header.n_dir < 0 || dir_offset < 0 || dir_offset + dir_length > data.len() as i64 {
            return Err(MapError::CorruptLump {
                lump: "WAD directory",
                offset: dir_offset,
                length: dir_length,
                size: data.len(),
            });
        }

        reader.seek(header.dir_offset as usize);
        let mut dir_entries: Vec<WadDirEntry> = Vec::with_capacity(header.n_dir as usize);
        for _ in 0..header.n_dir {
            dir_entries.push(WadDirEntry::from_reader(&mut reader).map_err(|source| {
                MapError::Truncated {
                    lump: "WAD directory",
                    source,
                }
            })?);
        }

        let mut textures: HashMap<String, MipmapTexture> = HashMap::new();
        for entry in dir_entries.iter() {
            if entry.r#type != WAD_TYPE_MIPTEX {
                continue;
            }
            if let Some(texture) = Self::parse_mip_texture(&mut reader, entry, data.len())? {
                textures.insert(entry.name.clone(), texture);
            }
        }
        Ok(Wad {
            dir_entries,
            textures,
        })
    }

    /// Case-insensitive lookup by texture name.
    pub fn texture(&self, name: &str) -> Option<&MipmapTexture> {
        self.textures.get(&name.to_uppercase())
    }

    pub fn textures(&self) -> &HashMap<String, MipmapTexture> {
        &self.textures
    }

    fn parse_mip_texture(
        reader: &mut ByteReader,
        entry: &WadDirEntry,
        size: usize,
    ) -> Result<Option<MipmapTexture>, MapError> {
        let truncated = |source| MapError::Truncated {
            lump: "WAD miptex",
            source,
        };
        let corrupt = || MapError::CorruptLump {
            lump: "WAD miptex",
            offset: entry.n_file_pos as i64,
            length: entry.n_disk_size as i64,
            size,
        };
        if entry.n_file_pos < 0 {
            return Err(corrupt());
        }
        let base: usize = entry.n_file_pos as usize;

        reader.seek(base);
        let mut name: [u8; MAX_TEXTURE_NAME] = [0; MAX_TEXTURE_NAME];
        read_char_array(reader, &mut name).map_err(truncated)?;
        let width: u32 = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let height: u32 = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let mut offsets: [u32; MIP_LEVELS] = [0; MIP_LEVELS];
        for offset in offsets.iter_mut() {
            *offset = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        }
        if offsets[0] == 0 {
            // No pixel data stored for this name.
            return Ok(None);
        }

        // GoldSrc halves dimensions per level with flooring division; odd
        // dimensions simply lose the remainder.
        let mut mip_sizes: [usize; MIP_LEVELS] = [0; MIP_LEVELS];
        let mut total_mip_size: usize = 0;
        for (level, mip_size) in mip_sizes.iter_mut().enumerate() {
            *mip_size = ((width >> level) as usize)
                .checked_mul((height >> level) as usize)
                .ok_or_else(corrupt)?;
            total_mip_size = total_mip_size.checked_add(*mip_size).ok_or_else(corrupt)?;
        }

        // The 256-entry RGB palette sits after all four mip levels plus two
        // bytes of padding.
        reader.seek(base + offsets[0] as usize + total_mip_size + 2);
        let palette: Vec<u8> = reader.read_bytes(256 * 3).map_err(truncated)?;

        let mut img: [Image; MIP_LEVELS] = Default::default();
        for level in 0..MIP_LEVELS {
            if offsets[level] == 0 {
                continue;
            }
            reader.seek(base + offsets[level] as usize);
            let indices: Vec<u8> = reader.read_bytes(mip_sizes[level]).map_err(truncated)?;
            img[level] = expand_indices(width >> level, height >> level, &indices, &palette);
        }
        Ok(Some(MipmapTexture {
            name: char_array_to_string(&name),
            width,
            height,
            img,
        }))
    }
}

fn expand_indices(width: u32, height: u32, indices: &[u8], palette: &[u8]) -> Image {
    let mut image = Image::with_dimensions(width as usize, height as usize);
    for (i, &index) in indices.iter().enumerate() {
        let palette_offset: usize = index as usize * 3;
        image.data[i * 4] = palette[palette_offset];
        image.data[i * 4 + 1] = palette[palette_offset + 1];
        image.data[i * 4 + 2] = palette[palette_offset + 2];
        // Palette slot 255 is the transparency key used by decal textures.
        image.data[i * 4 + 3] = if index == 255 { 0 } else { 255 };
    }
    image
}

#[cfg(test)]
mod tests {
    use byteorder::WriteBytesExt;

    use super::*;

    /// Build a WAD3 archive holding one 16x16 miptex named `name` whose
    /// mip-0 indices are `index` everywhere, plus one font lump that must be
    /// skipped. Palette entry `i` is `(i, 2 * i, 255 - i)`.
    fn wad_with_texture(name: &str, index: u8) -> Vec<u8> {
        let mut body: Vec<u8> = Vec::new();
        let mut name_bytes: [u8; 16] = [0; 16];
        name_bytes[..name.len()].copy_from_slice(name.as_bytes());
        body.extend_from_slice(&name_bytes);
        body.write_u32::<LittleEndian>(16).unwrap();
        body.write_u32::<LittleEndian>(16).unwrap();
        // Mip offsets: 40-byte header, then 256/64/16/4 index bytes.
        for offset in [40u32, 296, 360, 376] {
            body.write_u32::<LittleEndian>(offset).unwrap();
        }
        for _ in 0..(256 + 64 + 16 + 4) {
            body.push(index);
        }
        body.extend_from_slice(&[0, 0]); // padding before the palette
        for i in 0..=255u32 {
            body.extend_from_slice(&[i as u8, (2 * i) as u8, (255 - i) as u8]);
        }

        let mut data: Vec<u8> = Vec::new();
        data.write_u32::<LittleEndian>(WAD3_MAGIC).unwrap();
        data.write_i32::<LittleEndian>(2).unwrap();
        data.write_i32::<LittleEndian>((12 + body.len()) as i32).unwrap();
        data.extend_from_slice(&body);

        // Directory: the miptex entry, then a font entry.
        data.write_i32::<LittleEndian>(12).unwrap();
        data.write_i32::<LittleEndian>(body.len() as i32).unwrap();
        data.write_i32::<LittleEndian>(body.len() as i32).unwrap();
        data.push(WAD_TYPE_MIPTEX);
        data.push(0);
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&name_bytes);
        data.write_i32::<LittleEndian>(12).unwrap();
        data.write_i32::<LittleEndian>(0).unwrap();
        data.write_i32::<LittleEndian>(0).unwrap();
        data.push(WAD_TYPE_FONT);
        data.push(0);
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&[0; 16]);
        data
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = wad_with_texture("wall1", 0);
        data[..4].copy_from_slice(b"WAD2");
        match Wad::parse(&data) {
            Err(MapError::InvalidMagic(got)) => assert_eq!(got, u32::from_le_bytes(*b"WAD2")),
            other => panic!("expected InvalidMagic, got {:?}", other),
        }
    }

    #[test]
    fn decodes_all_mip_levels() {
        let wad = Wad::parse(&wad_with_texture("wall1", 10)).unwrap();
        let texture = wad.texture("WALL1").unwrap();
        assert_eq!(texture.name, "wall1");
        assert_eq!((texture.width, texture.height), (16, 16));
        for (level, expected) in [16usize, 8, 4, 2].into_iter().enumerate() {
            assert_eq!(texture.img[level].width, expected);
            assert_eq!(texture.img[level].height, expected);
            assert_eq!(texture.img[level].data.len(), expected * expected * 4);
        }
        // Palette entry 10 is (10, 20, 245), opaque.
        assert_eq!(&texture.mip0().data[..4], &[10, 20, 245, 255]);
    }

    #[test]
    fn palette_index_255_is_transparent() {
        let wad = Wad::parse(&wad_with_texture("decal", 255)).unwrap();
        let texture = wad.texture("decal").unwrap();
        for pixel in texture.mip0().data.chunks_exact(4) {
            assert_eq!(pixel[3], 0);
        }
        let wad = Wad::parse(&wad_with_texture("solid", 254)).unwrap();
        for pixel in wad.texture("solid").unwrap().mip0().data.chunks_exact(4) {
            assert_eq!(pixel[3], 255);
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let wad = Wad::parse(&wad_with_texture("Wall1", 0)).unwrap();
        assert!(wad.texture("wall1").is_some());
        assert!(wad.texture("WALL1").is_some());
        assert!(wad.texture("other").is_none());
    }

    #[test]
    fn non_miptex_lumps_are_listed_but_not_decoded() {
        let wad = Wad::parse(&wad_with_texture("wall1", 0)).unwrap();
        assert_eq!(wad.dir_entries.len(), 2);
        assert_eq!(wad.dir_entries[1].r#type, WAD_TYPE_FONT);
        assert_eq!(wad.textures().len(), 1);
    }

    #[test]
    fn truncated_directory_is_corrupt() {
        let mut data = wad_with_texture("wall1", 0);
        let keep = data.len() - 16;
        data.truncate(keep);
        assert!(matches!(
            Wad::parse(&data),
            Err(MapError::CorruptLump { lump: "WAD directory", .. })
        ));
    }

    #[test]
    fn miptex_without_pixel_data_is_skipped() {
        let mut data = wad_with_texture("wall1", 0);
        // Zero the mip-0 offset inside the miptex header (body starts at 12,
        // offsets at +24).
        data[36..40].copy_from_slice(&0u32.to_le_bytes());
        let wad = Wad::parse(&data).unwrap();
        assert!(wad.texture("wall1").is_none());
    }
}
