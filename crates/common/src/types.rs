use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a placeable entity (sound object, mobile object,
/// effect zone). Generated, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position, rotation (Euler angles in radians) and scale of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform placed at `position`.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Integer chunk-space coordinate of a grid chunk.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCoord {
    /// The permanent origin chunk.
    pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn is_origin(self) -> bool {
        self == Self::ORIGIN
    }

    /// Canonical `"x,y,z"` key.
    pub fn key(self) -> String {
        self.to_string()
    }

    /// World-space origin of this chunk for the given edge length.
    pub fn world_origin(self, grid_size: f32) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32) * grid_size
    }

    /// Chunk coordinate obtained by rounding `position / grid_size` per axis.
    /// Halves round toward positive infinity, so -0.5 lands on 0.
    pub fn from_world_rounded(position: Vec3, grid_size: f32) -> Self {
        let c = (position / grid_size + Vec3::splat(0.5)).floor();
        Self::new(c.x as i32, c.y as i32, c.z as i32)
    }

    /// Chebyshev distance between two chunk coordinates. Widened so chunks
    /// at opposite ends of the `i32` range still compare.
    pub fn chebyshev(self, other: Self) -> u64 {
        let d = |a: i32, b: i32| (i64::from(a) - i64::from(b)).unsigned_abs();
        d(self.x, other.x).max(d(self.y, other.y)).max(d(self.z, other.z))
    }

    /// Neighbour at the given offset, or `None` past the edge of chunk space.
    pub fn checked_offset(self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid grid key {0:?}, expected \"x,y,z\"")]
pub struct ParseCoordError(pub String);

impl FromStr for GridCoord {
    type Err = ParseCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, z] = parts.as_slice() else {
            return Err(ParseCoordError(s.to_string()));
        };
        let parse = |v: &str| v.parse::<i32>().map_err(|_| ParseCoordError(s.to_string()));
        Ok(Self::new(parse(*x)?, parse(*y)?, parse(*z)?))
    }
}

/// Address of a grid chunk.
///
/// Chunk-addressed grids are keyed by their coordinate; grids made through the
/// free-form creation path get an opaque id and only carry a derived coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GridId {
    Chunk(GridCoord),
    Custom(Uuid),
}

impl GridId {
    pub const ORIGIN: Self = Self::Chunk(GridCoord::ORIGIN);

    pub fn new_custom() -> Self {
        Self::Custom(Uuid::new_v4())
    }

    pub fn is_origin(self) -> bool {
        self == Self::ORIGIN
    }
}

impl From<GridCoord> for GridId {
    fn from(coord: GridCoord) -> Self {
        Self::Chunk(coord)
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chunk(c) => write!(f, "{c}"),
            Self::Custom(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_uniqueness() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn grid_key_is_comma_joined() {
        assert_eq!(GridCoord::new(1, -2, 3).key(), "1,-2,3");
        assert_eq!(GridCoord::ORIGIN.key(), "0,0,0");
    }

    #[test]
    fn grid_key_parses_back() {
        let c: GridCoord = " 4, 0 ,-7".parse().unwrap();
        assert_eq!(c, GridCoord::new(4, 0, -7));
        assert!("1,2".parse::<GridCoord>().is_err());
        assert!("a,b,c".parse::<GridCoord>().is_err());
    }

    #[test]
    fn rounding_from_world_position() {
        let c = GridCoord::from_world_rounded(Vec3::new(40.0, 0.0, 0.0), 20.0);
        assert_eq!(c, GridCoord::new(2, 0, 0));
        let c = GridCoord::from_world_rounded(Vec3::new(29.0, -31.0, 9.0), 20.0);
        assert_eq!(c, GridCoord::new(1, -2, 0));
    }

    #[test]
    fn rounding_halves_go_up() {
        let c = GridCoord::from_world_rounded(Vec3::new(-10.0, 10.0, -30.0), 20.0);
        assert_eq!(c, GridCoord::new(0, 1, -1));
    }

    #[test]
    fn chebyshev_distance() {
        let a = GridCoord::new(0, 0, 0);
        assert_eq!(a.chebyshev(GridCoord::new(2, -1, 1)), 2);
        assert_eq!(a.chebyshev(a), 0);
        let far = GridCoord::new(i32::MAX, 0, 0);
        let near = GridCoord::new(i32::MIN, 0, 0);
        assert_eq!(far.chebyshev(near), u64::from(u32::MAX));
    }

    #[test]
    fn offset_stops_at_the_edge() {
        let edge = GridCoord::new(i32::MAX, 0, i32::MIN);
        assert_eq!(edge.checked_offset(1, 0, 0), None);
        assert_eq!(edge.checked_offset(0, 0, -1), None);
        assert_eq!(
            edge.checked_offset(-1, 1, 1),
            Some(GridCoord::new(i32::MAX - 1, 1, i32::MIN + 1))
        );
    }

    #[test]
    fn grid_id_display() {
        assert_eq!(GridId::ORIGIN.to_string(), "0,0,0");
        assert!(GridId::ORIGIN.is_origin());
        assert!(!GridId::new_custom().is_origin());
    }
}
