//! Cascading deletion.
//!
//! Deleting a shape consults the deletion rules stamped on its annotation
//! group. When the rule list for the shape's role is non-empty, shapes bound
//! to it are deleted too, and so is the shape it is bound to if that shape's
//! role is listed. Otherwise followers are only unbound. A group left
//! without content afterwards is removed as well.

use markin_core::event_bus::{AnnotatorEvent, LifecycleEvent, ModificationData, ModificationEvent};
use markin_core::{ElementInfo, LookupError, ModificationKind, NodeId, Result, Role, ShapeKind};

use super::Annotator;
use crate::config::parse_deletion_rules;
use crate::scene::Node;

impl Annotator {
    /// Deletes `node`, cascading per its group's deletion rules.
    ///
    /// Emits `beforedelete`, `delete`, `annotationmodified` and
    /// `annotationmodificationcomplete`, then saves `delete_element`.
    pub fn delete_element(&mut self, node: NodeId) -> Result<()> {
        let Some(n) = self.scene.get(node) else {
            tracing::error!("Cannot delete {}: not in scene", node);
            return Err(LookupError::NodeNotFound { node }.into());
        };
        let kind = n.kind();
        let role = n.role();
        let element_id = n.element_id.clone();
        let bound_to = n.bound_to.clone();

        let group = self.scene.closest_annotation_group(node);
        let info = ElementInfo {
            kind,
            role: role.clone(),
            uuid: n.group().and_then(|g| g.uuid.clone()),
            group_id: group
                .and_then(|g| self.scene.get(g))
                .and_then(|g| g.element_id.clone().or_else(|| g.group()?.uuid.clone())),
        };

        self.bus
            .emit(AnnotatorEvent::Lifecycle(LifecycleEvent::BeforeDelete(info.clone())));
        self.release_selection_within(node);

        if kind == ShapeKind::Group {
            self.remove_group(node);
        } else {
            if self.options.bind_elements {
                let cascade = self.cascade_roles(group, &role);
                self.apply_bindings_on_delete(element_id.as_deref(), bound_to.as_deref(), &cascade);
            }
            self.discard(node);
            if let Some(group) = group {
                self.cleanup_group_if_needed(group);
            }
        }

        tracing::info!("Deleted {} ({})", kind, role);
        self.bus
            .emit(AnnotatorEvent::Lifecycle(LifecycleEvent::Deleted(info.clone())));
        self.bus
            .emit(AnnotatorEvent::Modification(ModificationEvent::AnnotationModified {
                node: None,
                kind,
                modification: ModificationKind::Delete,
                vertex_index: None,
                data: ModificationData::Deleted(info.clone()),
            }));
        self.bus.emit(AnnotatorEvent::Modification(
            ModificationEvent::AnnotationModificationComplete {
                node: None,
                kind,
                modification: ModificationKind::Delete,
                handle_type: None,
                data: ModificationData::Deleted(info),
            },
        ));

        self.save_state("delete_element");
        Ok(())
    }

    /// Deletes a whole group, unbinding shapes outside it that follow
    /// shapes inside it. Saves `delete_group`.
    pub fn delete_group(&mut self, group: NodeId) -> Result<()> {
        match self.scene.kind(group) {
            Some(ShapeKind::Group) => {}
            Some(_) => {
                tracing::error!("Cannot delete {} as a group", group);
                return Err(LookupError::NotAnAnnotationGroup { node: group }.into());
            }
            None => {
                tracing::error!("Cannot delete group {}: not in scene", group);
                return Err(LookupError::NodeNotFound { node: group }.into());
            }
        }
        self.release_selection_within(group);
        self.remove_group(group);
        self.save_state("delete_group");
        Ok(())
    }

    /// Deletes the selection, then clears selection and handles.
    pub fn delete_selected_element(&mut self) -> Result<()> {
        let Some(selected) = self.selection.selected() else {
            tracing::warn!("Nothing selected to delete");
            return Err(LookupError::NoSelection.into());
        };
        self.delete_element(selected)?;
        self.deselect();
        self.handles.clear_handles(&mut self.scene);
        Ok(())
    }

    /// Roles cascaded by deleting a `role` shape inside `group`.
    ///
    /// Unparseable rule payloads are logged and treated as "unbind only".
    fn cascade_roles(&self, group: Option<NodeId>, role: &Role) -> Vec<String> {
        let Some(raw) = group
            .and_then(|g| self.scene.get(g))
            .and_then(Node::group)
            .and_then(|g| g.deletion_rules.as_deref())
        else {
            return Vec::new();
        };
        match parse_deletion_rules(raw) {
            Ok(mut rules) => rules.remove(role.as_str()).unwrap_or_default(),
            Err(e) => {
                tracing::error!("Error parsing deletion rules: {}", e);
                Vec::new()
            }
        }
    }

    fn apply_bindings_on_delete(
        &mut self,
        element_id: Option<&str>,
        bound_to: Option<&str>,
        cascade: &[String],
    ) {
        if let Some(element_id) = element_id {
            for follower in self.scene.bound_to(element_id) {
                if cascade.is_empty() {
                    if let Some(n) = self.scene.get_mut(follower) {
                        n.bound_to = None;
                    }
                } else {
                    tracing::debug!("Cascading delete to follower {}", follower);
                    self.discard(follower);
                }
            }
        }

        if cascade.is_empty() {
            return;
        }
        let Some(leader) = bound_to.and_then(|id| self.scene.find_by_element_id(id)) else {
            return;
        };
        let leader_role = self.scene.get(leader).map(Node::role);
        if leader_role.is_some_and(|r| cascade.iter().any(|c| c == r.as_str())) {
            tracing::debug!("Cascading delete to bound target {}", leader);
            self.discard(leader);
        }
    }

    /// Removes `group` when nothing but handles and indicators are left in it.
    pub(crate) fn cleanup_group_if_needed(&mut self, group: NodeId) {
        if !self.scene.contains(group) {
            return;
        }
        let has_content = self
            .scene
            .children(Some(group))
            .iter()
            .any(|c| self.scene.get(*c).is_some_and(|n| !n.is_transient()));
        if !has_content {
            tracing::debug!("Removing emptied group {}", group);
            self.remove_group(group);
        }
    }

    /// Group removal proper: `beforedeletegroup`, unbind outsiders, remove,
    /// `deletegroup`. No history entry.
    pub(crate) fn remove_group(&mut self, group: NodeId) {
        let group_id = self
            .scene
            .get(group)
            .and_then(Node::group)
            .and_then(|g| g.uuid.clone());
        self.bus
            .emit(AnnotatorEvent::Lifecycle(LifecycleEvent::BeforeDeleteGroup {
                group,
                group_id: group_id.clone(),
            }));

        let inner_ids: Vec<String> = self
            .scene
            .descendants(group)
            .into_iter()
            .filter_map(|d| self.scene.get(d)?.element_id.clone())
            .collect();
        for id in inner_ids {
            for follower in self.scene.bound_to(&id) {
                if self.scene.closest_annotation_group(follower) != Some(group) {
                    if let Some(n) = self.scene.get_mut(follower) {
                        n.bound_to = None;
                    }
                }
            }
        }

        self.discard(group);
        tracing::info!("Deleted group {}", group_id.as_deref().unwrap_or("<none>"));
        self.bus
            .emit(AnnotatorEvent::Lifecycle(LifecycleEvent::GroupDeleted { group_id }));
    }

    /// Removes a subtree from the scene and forgets every reference to it.
    fn discard(&mut self, node: NodeId) {
        if !self.scene.contains(node) {
            return;
        }
        self.release_selection_within(node);
        let mut gone = self.scene.descendants(node);
        gone.push(node);
        for id in &gone {
            self.armed.remove(id);
            self.unregister(*id);
        }
        self.scene.remove(node);
    }

    /// Deselects when the selection is `node` or lies inside it.
    fn release_selection_within(&mut self, node: NodeId) {
        let Some(selected) = self.selection.selected() else {
            return;
        };
        if selected == node || self.scene.ancestors(selected).contains(&node) {
            self.deselect();
        }
    }
}
