use crate::scene::{Block, BlockList};
use glam::Vec3;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

pub const EXT_DRACO: &str = "KHR_draco_mesh_compression";
pub const EXT_BASISU: &str = "KHR_texture_basisu";

const PROXY_COLOR: [f32; 3] = [0.74, 0.74, 0.72];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssetError {
    #[error("http status {0}")]
    Http(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("not a binary glTF container")]
    NotGlb,
    #[error("unsupported glTF container version {0}")]
    UnsupportedVersion(u32),
    #[error("container truncated")]
    Truncated,
    #[error("first chunk is not JSON")]
    MissingJsonChunk,
    #[error("invalid glTF json: {0}")]
    Json(String),
}

/// What the control layer knows about a loaded asset.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelInfo {
    pub path: String,
    pub byte_len: usize,
    pub proxies: BlockList,
    pub needs_geometry_decoder: bool,
    pub needs_texture_transcoder: bool,
}

#[derive(Deserialize)]
struct GltfJson {
    #[serde(default)]
    accessors: Vec<Accessor>,
    #[serde(default)]
    meshes: Vec<Mesh>,
    #[serde(default, rename = "extensionsUsed")]
    extensions_used: Vec<String>,
}

#[derive(Deserialize)]
struct Accessor {
    #[serde(default)]
    min: Option<Vec<f32>>,
    #[serde(default)]
    max: Option<Vec<f32>>,
}

#[derive(Deserialize)]
struct Mesh {
    #[serde(default)]
    primitives: Vec<Primitive>,
}

#[derive(Deserialize)]
struct Primitive {
    #[serde(default)]
    attributes: HashMap<String, usize>,
}

#[inline]
fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub fn inspect_glb(path: &str, bytes: &[u8]) -> Result<ModelInfo, AssetError> {
    let magic = read_u32(bytes, 0).ok_or(AssetError::NotGlb)?;
    if magic != GLB_MAGIC {
        return Err(AssetError::NotGlb);
    }
    let version = read_u32(bytes, 4).ok_or(AssetError::Truncated)?;
    if version != GLB_VERSION {
        return Err(AssetError::UnsupportedVersion(version));
    }
    let declared = read_u32(bytes, 8).ok_or(AssetError::Truncated)? as usize;
    if declared > bytes.len() || declared < HEADER_LEN + CHUNK_HEADER_LEN {
        return Err(AssetError::Truncated);
    }
    let chunk_len = read_u32(bytes, HEADER_LEN).ok_or(AssetError::Truncated)? as usize;
    let chunk_type = read_u32(bytes, HEADER_LEN + 4).ok_or(AssetError::Truncated)?;
    if chunk_type != CHUNK_JSON {
        return Err(AssetError::MissingJsonChunk);
    }
    let start = HEADER_LEN + CHUNK_HEADER_LEN;
    let end = start
        .checked_add(chunk_len)
        .filter(|&end| end <= declared)
        .ok_or(AssetError::Truncated)?;
    let json = bytes.get(start..end).ok_or(AssetError::Truncated)?;
    // The JSON chunk is space-padded to a 4-byte boundary.
    let doc: GltfJson =
        serde_json::from_slice(json).map_err(|e| AssetError::Json(e.to_string()))?;

    let mut proxies = BlockList::new();
    for prim in doc.meshes.iter().flat_map(|m| m.primitives.iter()) {
        let Some(acc) = prim
            .attributes
            .get("POSITION")
            .and_then(|i| doc.accessors.get(*i))
        else {
            continue;
        };
        if let (Some(min), Some(max)) = (&acc.min, &acc.max) {
            if min.len() == 3 && max.len() == 3 {
                let lo = Vec3::new(min[0], min[1], min[2]);
                let hi = Vec3::new(max[0], max[1], max[2]);
                if lo.is_finite() && hi.is_finite() {
                    proxies.push(Block {
                        center: (lo + hi) * 0.5,
                        size: (hi - lo).abs(),
                        color: PROXY_COLOR,
                    });
                }
            }
        }
    }

    let uses = |ext: &str| doc.extensions_used.iter().any(|e| e == ext);
    Ok(ModelInfo {
        path: path.to_string(),
        byte_len: bytes.len(),
        proxies,
        needs_geometry_decoder: uses(EXT_DRACO),
        needs_texture_transcoder: uses(EXT_BASISU),
    })
}

#[cfg(test)]
pub(crate) fn build_glb(json: &str) -> Vec<u8> {
    let mut chunk = json.as_bytes().to_vec();
    while chunk.len() % 4 != 0 {
        chunk.push(b' ');
    }
    let total = HEADER_LEN + CHUNK_HEADER_LEN + chunk.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&chunk);
    out
}
