use std::env;
use std::error::Error;
use std::fs;
use std::panic;
use std::path::Path;
use std::process;

use lazy_static::lazy_static;
use serde::Serialize;
use slog::{crit, info, Logger};

use hlbsp::logging::logging::initialize_logging;
use hlbsp::map::geometry::{build_geometry, MapGeometry, DEFAULT_SCALE};
use hlbsp::scene::entity::Entity;
use hlbsp::BSP;

lazy_static! {
    static ref LOGGER: Logger = initialize_logging("bsp-to-json");
}

#[derive(Serialize)]
struct ConvertedMap<'a> {
    meta: Meta,
    entities: &'a [Entity],
    textures: Vec<TextureMeta>,
    geometry: &'a MapGeometry,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    source: String,
    version: i32,
    converted_at: String,
    stats: Stats,
}

#[derive(Serialize)]
struct Stats {
    faces: usize,
    vertices: usize,
    textures: usize,
    entities: usize,
    triangles: usize,
}

#[derive(Serialize)]
struct TextureMeta {
    name: String,
    width: u32,
    height: u32,
}

fn convert(input_path: &str, output_path: &str) -> Result<(), Box<dyn Error>> {
    info!(&LOGGER, "Reading {}", input_path);
    let data: Vec<u8> = fs::read(input_path)?;

    info!(&LOGGER, "Parsing BSP");
    let bsp: BSP = BSP::parse(&data)?;

    info!(&LOGGER, "Pre-computing geometry");
    let face_indices: Vec<usize> = if bsp.models.is_empty() {
        Vec::new()
    } else {
        bsp.model_faces(0)
    };
    let geometry: MapGeometry = build_geometry(&bsp, &face_indices, None, DEFAULT_SCALE);

    let textures: Vec<TextureMeta> = bsp
        .mip_textures
        .iter()
        .flatten()
        .map(|texture| TextureMeta {
            name: texture.name(),
            width: texture.width,
            height: texture.height,
        })
        .collect();
    let document = ConvertedMap {
        meta: Meta {
            source: Path::new(input_path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| input_path.to_string()),
            version: bsp.header.version,
            converted_at: chrono::Utc::now().to_rfc3339(),
            stats: Stats {
                faces: bsp.faces.len(),
                vertices: bsp.vertices.len(),
                textures: textures.len(),
                entities: bsp.entities.len(),
                triangles: geometry.positions.len() / 9,
            },
        },
        entities: &bsp.entities,
        textures,
        geometry: &geometry,
    };

    let json: String = serde_json::to_string(&document)?;
    fs::write(output_path, &json)?;
    info!(
        &LOGGER, "Wrote {}", output_path;
        "input_bytes" => data.len(),
        "output_bytes" => json.len(),
        "faces" => document.meta.stats.faces,
        "triangles" => document.meta.stats.triangles,
        "textures" => document.meta.stats.textures
    );
    Ok(())
}

fn default_output_path(input_path: &str) -> String {
    let path = Path::new(input_path);
    match path.extension().map(|ext| ext.eq_ignore_ascii_case("bsp")) {
        Some(true) => path.with_extension("json").to_string_lossy().into_owned(),
        _ => format!("{}.json", input_path),
    }
}

fn main() {
    panic::set_hook(Box::new(|panic_info| {
        if let Some(location) = panic_info.location() {
            crit!(
                &LOGGER,
                "[{}:{}:{}] {}",
                location.file(),
                location.line(),
                location.column(),
                panic_info,
            );
        } else {
            crit!(&LOGGER, "Panic at unknown location");
        }
        std::thread::sleep(std::time::Duration::from_millis(1000));
    }));

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: bsp-to-json <input.bsp> [output.json]");
        eprintln!();
        eprintln!("Converts a GoldSrc BSP v30 map into JSON with pre-triangulated geometry.");
        process::exit(1);
    }
    let input_path: &String = &args[1];
    let output_path: String = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| default_output_path(input_path));

    if let Err(error) = convert(input_path, &output_path) {
        crit!(&LOGGER, "Conversion failed: {}", error);
        // Give the async drain a moment to flush before exiting
        std::thread::sleep(std::time::Duration::from_millis(1000));
        process::exit(1);
    }
    std::thread::sleep(std::time::Duration::from_millis(1000));
}
