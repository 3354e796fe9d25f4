//! Event type definitions for the event bus.
//!
//! This module defines every editor event organized by category. Each event
//! knows its wire topic (`select`, `dragend`, `annotationcreated`, ...), so
//! hosts can subscribe by topic name as well as by category.
//! Events are cloneable and serializable for logging/replay.

use serde::{Deserialize, Serialize};

use crate::data::{ElementData, ElementInfo, HandleType, ModificationKind, NodeId, ShapeKind};
use crate::geometry::Point;

/// Root event enum for all editor events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotatorEvent {
    /// Selection changes
    Selection(SelectionEvent),
    /// Hover and plain canvas clicks
    Hover(HoverEvent),
    /// Drag session progress
    Drag(DragEvent),
    /// Geometry and content modifications
    Modification(ModificationEvent),
    /// Creation, update and deletion of annotations
    Lifecycle(LifecycleEvent),
    /// Runtime settings changes
    Settings(SettingsEvent),
}

impl AnnotatorEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AnnotatorEvent::Selection(_) => EventCategory::Selection,
            AnnotatorEvent::Hover(_) => EventCategory::Hover,
            AnnotatorEvent::Drag(_) => EventCategory::Drag,
            AnnotatorEvent::Modification(_) => EventCategory::Modification,
            AnnotatorEvent::Lifecycle(_) => EventCategory::Lifecycle,
            AnnotatorEvent::Settings(_) => EventCategory::Settings,
        }
    }

    /// Wire topic name of this event
    pub fn topic(&self) -> &'static str {
        match self {
            AnnotatorEvent::Selection(e) => e.topic(),
            AnnotatorEvent::Hover(e) => e.topic(),
            AnnotatorEvent::Drag(e) => e.topic(),
            AnnotatorEvent::Modification(e) => e.topic(),
            AnnotatorEvent::Lifecycle(e) => e.topic(),
            AnnotatorEvent::Settings(e) => e.topic(),
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AnnotatorEvent::Selection(e) => e.description(),
            AnnotatorEvent::Hover(e) => e.description(),
            AnnotatorEvent::Drag(e) => e.description(),
            AnnotatorEvent::Modification(e) => e.description(),
            AnnotatorEvent::Lifecycle(e) => e.description(),
            AnnotatorEvent::Settings(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Selection events.
    Selection,
    /// Hover and canvas click events.
    Hover,
    /// Drag session events.
    Drag,
    /// Modification events.
    Modification,
    /// Annotation lifecycle events.
    Lifecycle,
    /// Settings events.
    Settings,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Selection => write!(f, "Selection"),
            EventCategory::Hover => write!(f, "Hover"),
            EventCategory::Drag => write!(f, "Drag"),
            EventCategory::Modification => write!(f, "Modification"),
            EventCategory::Lifecycle => write!(f, "Lifecycle"),
            EventCategory::Settings => write!(f, "Settings"),
        }
    }
}

/// Selection events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionEvent {
    /// A node became the selection.
    Select {
        node: NodeId,
        kind: ShapeKind,
        data: Option<ElementData>,
    },
    /// The selection was cleared.
    Deselect { node: NodeId, kind: ShapeKind },
}

impl SelectionEvent {
    fn topic(&self) -> &'static str {
        match self {
            SelectionEvent::Select { .. } => "select",
            SelectionEvent::Deselect { .. } => "deselect",
        }
    }

    fn description(&self) -> String {
        match self {
            SelectionEvent::Select { node, kind, .. } => format!("Selected {} {}", kind, node),
            SelectionEvent::Deselect { node, kind } => format!("Deselected {} {}", kind, node),
        }
    }
}

/// Hover and empty-canvas click events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HoverEvent {
    /// Pointer is over a selectable node.
    Element {
        node: NodeId,
        kind: ShapeKind,
        position: Point,
    },
    /// Pointer is over empty canvas.
    Canvas { position: Point },
    /// Empty canvas was clicked while something was selected.
    CanvasClick { position: Point },
}

impl HoverEvent {
    fn topic(&self) -> &'static str {
        match self {
            HoverEvent::Element { .. } => "hoverelement",
            HoverEvent::Canvas { .. } => "hovercanvas",
            HoverEvent::CanvasClick { .. } => "canvasclick",
        }
    }

    fn description(&self) -> String {
        match self {
            HoverEvent::Element { node, kind, .. } => format!("Hovering {} {}", kind, node),
            HoverEvent::Canvas { position } => {
                format!("Hovering canvas at ({:.1}, {:.1})", position.x, position.y)
            }
            HoverEvent::CanvasClick { position } => {
                format!("Canvas click at ({:.1}, {:.1})", position.x, position.y)
            }
        }
    }
}

/// Drag session events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DragEvent {
    /// A drag session began.
    Start {
        node: NodeId,
        kind: ShapeKind,
        handle_type: HandleType,
        position: Point,
    },
    /// A pointer move was applied during a drag.
    Moved {
        node: NodeId,
        kind: ShapeKind,
        handle_type: HandleType,
        position: Point,
        delta: Point,
    },
    /// The drag session ended.
    End {
        node: NodeId,
        kind: ShapeKind,
        handle_type: HandleType,
        start_position: Point,
        end_position: Point,
        data: Option<ElementData>,
    },
}

impl DragEvent {
    fn topic(&self) -> &'static str {
        match self {
            DragEvent::Start { .. } => "dragstart",
            DragEvent::Moved { .. } => "drag",
            DragEvent::End { .. } => "dragend",
        }
    }

    fn description(&self) -> String {
        match self {
            DragEvent::Start {
                node, handle_type, ..
            } => format!("Drag start {} ({})", node, handle_type),
            DragEvent::Moved { node, delta, .. } => {
                format!("Drag {} by ({:.2}, {:.2})", node, delta.x, delta.y)
            }
            DragEvent::End {
                node, handle_type, ..
            } => format!("Drag end {} ({})", node, handle_type),
        }
    }
}

/// Payload attached to modification events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModificationData {
    /// Current data of the modified node.
    Element(ElementData),
    /// Identity of a deleted node.
    Deleted(ElementInfo),
    /// Node produced no extractable data.
    None,
}

impl From<Option<ElementData>> for ModificationData {
    fn from(data: Option<ElementData>) -> Self {
        data.map(ModificationData::Element)
            .unwrap_or(ModificationData::None)
    }
}

/// Geometry and content modification events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModificationEvent {
    /// A node was translated.
    ElementMoved {
        node: NodeId,
        kind: ShapeKind,
        delta_x: f64,
        delta_y: f64,
    },
    /// An intermediate or final change to annotation geometry.
    AnnotationModified {
        node: Option<NodeId>,
        kind: ShapeKind,
        modification: ModificationKind,
        vertex_index: Option<usize>,
        data: ModificationData,
    },
    /// A user-level modification finished.
    AnnotationModificationComplete {
        node: Option<NodeId>,
        kind: ShapeKind,
        modification: ModificationKind,
        handle_type: Option<HandleType>,
        data: ModificationData,
    },
    /// A keypoint was added to an annotation group.
    KeypointAdded {
        node: NodeId,
        name: String,
        position: Point,
        group: NodeId,
    },
}

impl ModificationEvent {
    fn topic(&self) -> &'static str {
        match self {
            ModificationEvent::ElementMoved { .. } => "elementmoved",
            ModificationEvent::AnnotationModified { .. } => "annotationmodified",
            ModificationEvent::AnnotationModificationComplete { .. } => {
                "annotationmodificationcomplete"
            }
            ModificationEvent::KeypointAdded { .. } => "keypointadded",
        }
    }

    fn description(&self) -> String {
        match self {
            ModificationEvent::ElementMoved {
                node,
                delta_x,
                delta_y,
                ..
            } => format!("Moved {} by ({:.2}, {:.2})", node, delta_x, delta_y),
            ModificationEvent::AnnotationModified {
                kind, modification, ..
            } => format!("Modified {} ({:?})", kind, modification),
            ModificationEvent::AnnotationModificationComplete {
                kind, modification, ..
            } => format!("Modification of {} complete ({:?})", kind, modification),
            ModificationEvent::KeypointAdded { name, group, .. } => {
                format!("Keypoint '{}' added to {}", name, group)
            }
        }
    }
}

/// Annotation lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// A node is about to be deleted.
    BeforeDelete(ElementInfo),
    /// A node was deleted.
    Deleted(ElementInfo),
    /// A group is about to be deleted.
    BeforeDeleteGroup {
        group: NodeId,
        group_id: Option<String>,
    },
    /// A group was deleted.
    GroupDeleted { group_id: Option<String> },
    /// An annotation group was created.
    AnnotationCreated {
        group: NodeId,
        uuid: String,
        class: String,
    },
    /// An annotation group was rebuilt in place.
    AnnotationUpdated {
        uuid: String,
        id: Option<String>,
        group: NodeId,
        old_group: NodeId,
    },
}

impl LifecycleEvent {
    fn topic(&self) -> &'static str {
        match self {
            LifecycleEvent::BeforeDelete(_) => "beforedelete",
            LifecycleEvent::Deleted(_) => "delete",
            LifecycleEvent::BeforeDeleteGroup { .. } => "beforedeletegroup",
            LifecycleEvent::GroupDeleted { .. } => "deletegroup",
            LifecycleEvent::AnnotationCreated { .. } => "annotationcreated",
            LifecycleEvent::AnnotationUpdated { .. } => "annotationupdated",
        }
    }

    fn description(&self) -> String {
        match self {
            LifecycleEvent::BeforeDelete(info) => format!("Deleting {} ({})", info.kind, info.role),
            LifecycleEvent::Deleted(info) => format!("Deleted {} ({})", info.kind, info.role),
            LifecycleEvent::BeforeDeleteGroup { group, .. } => format!("Deleting group {}", group),
            LifecycleEvent::GroupDeleted { group_id } => {
                format!("Deleted group {}", group_id.as_deref().unwrap_or("<none>"))
            }
            LifecycleEvent::AnnotationCreated { uuid, class, .. } => {
                format!("Created annotation {} ({})", uuid, class)
            }
            LifecycleEvent::AnnotationUpdated { uuid, .. } => format!("Updated annotation {}", uuid),
        }
    }
}

/// Settings change events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingsEvent {
    /// Zoom level changed.
    ZoomChanged { zoom: f64 },
    /// Annotator accepted input again.
    Enabled,
    /// Annotator stopped accepting input.
    Disabled,
    /// Keyboard controls switched on.
    KeyboardControlsEnabled,
    /// Keyboard controls switched off.
    KeyboardControlsDisabled,
    /// Drag-requires-selection policy changed.
    RequireSelectionToDragChanged { require_selection_to_drag: bool },
}

impl SettingsEvent {
    fn topic(&self) -> &'static str {
        match self {
            SettingsEvent::ZoomChanged { .. } => "zoomchange",
            SettingsEvent::Enabled => "enabled",
            SettingsEvent::Disabled => "disabled",
            SettingsEvent::KeyboardControlsEnabled => "keyboardcontrolsenabled",
            SettingsEvent::KeyboardControlsDisabled => "keyboardcontrolsdisabled",
            SettingsEvent::RequireSelectionToDragChanged { .. } => "requireselectiontodragchanged",
        }
    }

    fn description(&self) -> String {
        match self {
            SettingsEvent::ZoomChanged { zoom } => format!("Zoom: {}", zoom),
            SettingsEvent::Enabled => "Annotator enabled".to_string(),
            SettingsEvent::Disabled => "Annotator disabled".to_string(),
            SettingsEvent::KeyboardControlsEnabled => "Keyboard controls enabled".to_string(),
            SettingsEvent::KeyboardControlsDisabled => "Keyboard controls disabled".to_string(),
            SettingsEvent::RequireSelectionToDragChanged {
                require_selection_to_drag,
            } => format!("Require selection to drag: {}", require_selection_to_drag),
        }
    }
}
