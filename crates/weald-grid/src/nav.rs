//! The navigation-mesh collaborator seam.
//!
//! Tiles are loaded and unloaded alongside grids, keyed by map id and
//! tile coordinates. Tile payloads are opaque to the core; the only
//! structure it understands is the magic/version-stamped header, so a
//! corrupt or mismatched file can be rejected before the payload is
//! handed to the collaborator. Failures here are logged by callers and
//! never fatal to the process.

use std::error::Error;
use std::fmt;

use weald_core::MapId;

/// Header stamped on every navigation tile file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavTileHeader {
    /// File magic; must equal [`Self::MAGIC`].
    pub magic: u32,
    /// Format version; must equal [`Self::VERSION`].
    pub version: u32,
    /// Map the tile belongs to.
    pub map: MapId,
    /// Tile x coordinate (grid-space).
    pub tile_x: u32,
    /// Tile y coordinate (grid-space).
    pub tile_y: u32,
    /// Payload length in bytes, excluding the header.
    pub payload_len: u32,
}

impl NavTileHeader {
    /// `"WNAV"` little-endian.
    pub const MAGIC: u32 = 0x5641_4e57;

    /// Current tile format version.
    pub const VERSION: u32 = 7;

    /// Encoded header size in bytes.
    pub const BYTES: usize = 24;

    /// Decode and validate a header from the front of a tile buffer.
    pub fn parse(buf: &[u8]) -> Result<Self, NavError> {
        if buf.len() < Self::BYTES {
            return Err(NavError::Truncated { len: buf.len() });
        }
        let field = |i: usize| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&buf[i * 4..i * 4 + 4]);
            u32::from_le_bytes(raw)
        };
        let magic = field(0);
        if magic != Self::MAGIC {
            return Err(NavError::BadMagic { found: magic });
        }
        let version = field(1);
        if version != Self::VERSION {
            return Err(NavError::BadVersion { found: version });
        }
        Ok(Self {
            magic,
            version,
            map: MapId(field(2)),
            tile_x: field(3),
            tile_y: field(4),
            payload_len: field(5),
        })
    }

    /// Encode this header. Inverse of [`parse`](Self::parse).
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut out = [0u8; Self::BYTES];
        for (i, v) in [
            self.magic,
            self.version,
            self.map.0,
            self.tile_x,
            self.tile_y,
            self.payload_len,
        ]
        .into_iter()
        .enumerate()
        {
            out[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
        }
        out
    }
}

/// Navigation tile failures. Never fatal: the specific load/unload call
/// fails, is logged, and the grid carries on without pathfinding data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavError {
    /// Buffer shorter than a tile header.
    Truncated {
        /// Observed buffer length.
        len: usize,
    },
    /// Header magic mismatch — not a navigation tile.
    BadMagic {
        /// The magic value found.
        found: u32,
    },
    /// Header version mismatch — tile built for another format revision.
    BadVersion {
        /// The version value found.
        found: u32,
    },
    /// No tile on record for the requested coordinates.
    TileMissing {
        /// Map the tile was requested for.
        map: MapId,
        /// Requested tile x.
        tile_x: u32,
        /// Requested tile y.
        tile_y: u32,
    },
    /// Underlying storage failure.
    Io {
        /// Human-readable description.
        reason: String,
    },
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { len } => {
                write!(f, "tile buffer truncated: {len} bytes")
            }
            Self::BadMagic { found } => {
                write!(f, "bad tile magic {found:#010x}")
            }
            Self::BadVersion { found } => {
                write!(
                    f,
                    "tile version {found} (expected {})",
                    NavTileHeader::VERSION
                )
            }
            Self::TileMissing { map, tile_x, tile_y } => {
                write!(f, "no tile ({tile_x}, {tile_y}) for map {map}")
            }
            Self::Io { reason } => write!(f, "tile io: {reason}"),
        }
    }
}

impl Error for NavError {}

/// Navigation service keyed by map id and tile coordinates.
///
/// Implementations carry their own synchronization: tile loads happen
/// during grid population on whichever worker thread ticks the map.
pub trait NavMesh: Send + Sync {
    /// Load per-map pathfinding parameters. Called once per map before
    /// any tile load.
    fn load_map_params(&self, map: MapId) -> Result<(), NavError>;

    /// Load the tile covering grid (`tile_x`, `tile_y`).
    fn load_tile(&self, map: MapId, tile_x: u32, tile_y: u32) -> Result<(), NavError>;

    /// Unload a previously loaded tile.
    fn unload_tile(&self, map: MapId, tile_x: u32, tile_y: u32) -> Result<(), NavError>;

    /// Number of live references to a tile.
    fn tile_refs(&self, map: MapId, tile_x: u32, tile_y: u32) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> NavTileHeader {
        NavTileHeader {
            magic: NavTileHeader::MAGIC,
            version: NavTileHeader::VERSION,
            map: MapId(13),
            tile_x: 31,
            tile_y: 32,
            payload_len: 4096,
        }
    }

    #[test]
    fn header_round_trips() {
        let h = header();
        let parsed = NavTileHeader::parse(&h.to_bytes()).expect("valid header");
        assert_eq!(parsed, h);
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let bytes = header().to_bytes();
        match NavTileHeader::parse(&bytes[..10]) {
            Err(NavError::Truncated { len: 10 }) => {}
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = header().to_bytes();
        bytes[0] ^= 0xff;
        match NavTileHeader::parse(&bytes) {
            Err(NavError::BadMagic { .. }) => {}
            other => panic!("expected BadMagic, got {other:?}"),
        }
    }

    #[test]
    fn bad_version_is_rejected() {
        let mut h = header();
        h.version = NavTileHeader::VERSION + 1;
        match NavTileHeader::parse(&h.to_bytes()) {
            Err(NavError::BadVersion { found }) => {
                assert_eq!(found, NavTileHeader::VERSION + 1);
            }
            other => panic!("expected BadVersion, got {other:?}"),
        }
    }
}
