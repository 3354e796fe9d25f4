//! Data types shared between the scene graph and the event bus.
//!
//! These are the plain values that cross component boundaries: node
//! handles, shape kinds, semantic roles, handle types and the extracted
//! per-element data carried in event payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geometry::Point;

/// Stable handle of a node in a scene graph.
///
/// Ids survive snapshot/restore: a restored scene reuses the ids it was
/// captured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed set of primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    #[serde(rename = "rect")]
    Rect,
    #[serde(rename = "circle")]
    Circle,
    #[serde(rename = "polygon")]
    Polygon,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "g")]
    Group,
}

impl ShapeKind {
    /// Tag name used in event payloads and history labels.
    pub fn tag(&self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Circle => "circle",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Line => "line",
            ShapeKind::Group => "g",
        }
    }

    /// Role a node of this kind falls back to when it carries none.
    pub fn default_role(&self) -> Role {
        match self {
            ShapeKind::Group => Role::Group,
            other => Role::Custom(other.tag().to_string()),
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Semantic role tag of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Bbox,
    Polygon,
    Keypoint,
    Group,
    Handle,
    CrossIndicator,
    MaskCandidate,
    Custom(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Bbox => "bbox",
            Role::Polygon => "polygon",
            Role::Keypoint => "keypoint",
            Role::Group => "group",
            Role::Handle => "handle",
            Role::CrossIndicator => "cross-indicator",
            Role::MaskCandidate => "mask-candidate",
            Role::Custom(name) => name,
        }
    }

    /// Roles that decorate another node and never carry annotation data.
    pub fn is_transient(&self) -> bool {
        matches!(self, Role::Handle | Role::CrossIndicator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bbox" => Role::Bbox,
            "polygon" => Role::Polygon,
            "keypoint" => Role::Keypoint,
            "group" => Role::Group,
            "handle" => Role::Handle,
            "cross-indicator" => Role::CrossIndicator,
            "mask-candidate" => Role::MaskCandidate,
            other => Role::Custom(other.to_string()),
        })
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(role) => role,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Role::from(s.as_str()))
    }
}

/// Rectangle corner held by a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// All corners in handle index order (0..3).
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn index(&self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomLeft => 2,
            Corner::BottomRight => 3,
        }
    }
}

/// What started a manipulation: a handle, the shape body, or the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleType {
    #[serde(rename = "corner-tl")]
    CornerTl,
    #[serde(rename = "corner-tr")]
    CornerTr,
    #[serde(rename = "corner-bl")]
    CornerBl,
    #[serde(rename = "corner-br")]
    CornerBr,
    #[serde(rename = "vertex")]
    Vertex,
    #[serde(rename = "move")]
    Move,
    #[serde(rename = "direct-move")]
    DirectMove,
    #[serde(rename = "keyboard")]
    Keyboard,
}

impl HandleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandleType::CornerTl => "corner-tl",
            HandleType::CornerTr => "corner-tr",
            HandleType::CornerBl => "corner-bl",
            HandleType::CornerBr => "corner-br",
            HandleType::Vertex => "vertex",
            HandleType::Move => "move",
            HandleType::DirectMove => "direct-move",
            HandleType::Keyboard => "keyboard",
        }
    }

    pub fn from_corner(corner: Corner) -> Self {
        match corner {
            Corner::TopLeft => HandleType::CornerTl,
            Corner::TopRight => HandleType::CornerTr,
            Corner::BottomLeft => HandleType::CornerBl,
            Corner::BottomRight => HandleType::CornerBr,
        }
    }

    pub fn corner(&self) -> Option<Corner> {
        match self {
            HandleType::CornerTl => Some(Corner::TopLeft),
            HandleType::CornerTr => Some(Corner::TopRight),
            HandleType::CornerBl => Some(Corner::BottomLeft),
            HandleType::CornerBr => Some(Corner::BottomRight),
            _ => None,
        }
    }

    /// True for body moves (`move` and `direct-move`).
    pub fn is_move(&self) -> bool {
        matches!(self, HandleType::Move | HandleType::DirectMove)
    }

    /// Modification type reported when a drag with this handle completes.
    pub fn modification(&self) -> ModificationKind {
        if self.corner().is_some() {
            ModificationKind::Resize
        } else if *self == HandleType::Vertex {
            ModificationKind::Vertex
        } else {
            ModificationKind::Position
        }
    }
}

impl fmt::Display for HandleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of change reported by modification events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationKind {
    Position,
    Resize,
    Vertex,
    Delete,
    AddKeypoint,
}

/// Geometry and identity extracted from a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementData {
    Polygon {
        points: Vec<Point>,
        id: String,
        role: String,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        id: String,
        role: String,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        id: String,
        label: String,
        role: String,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        id: String,
        role: String,
    },
    Group {
        uuid: String,
        class: String,
        #[serde(rename = "childCount")]
        child_count: usize,
    },
}

/// Identity of a node captured just before it is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub role: Role,
    pub uuid: Option<String>,
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
}
