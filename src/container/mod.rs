//! Replication container: the live set of instances at one replication point
//!
//! The container owns its templates, index counters and instances. Every
//! operation computes its fallible parts first and only then commits, so a
//! failed call leaves the container unchanged.

mod events;
mod host;
mod instance;
mod soft_delete;
mod submission;

pub use events::{ContainerEvent, EventBus, SubscriptionId};
pub use host::{Confirm, InsertPosition, LogConfirm, NullRenderTarget, RenderTarget};
pub use instance::{Instance, InstanceId, InstanceOrigin, InstanceState};
pub use soft_delete::{SoftDeleteCoordinator, UndoMarker};
pub use submission::{SubmissionEntry, DESTROY_FIELD};

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ContainerConfig;
use crate::materialize::{apply_overrides, materialize, Overrides};
use crate::template::{
    display_name, IndexAllocator, Template, TemplateError, TemplateName, TemplateStore,
};

/// Errors that can occur during container operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// Restoring an instance would exceed the item limit
    #[error("capacity exceeded: at most {max} items")]
    CapacityExceeded { max: usize },

    /// Template lookup or capture failed
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("unknown instance {0}")]
    UnknownInstance(InstanceId),

    #[error("instance {0} is not active")]
    InstanceNotActive(InstanceId),

    #[error("instance {0} was already submitted as deleted")]
    AlreadySubmitted(InstanceId),

    #[error("container is not sortable")]
    NotSortable,

    #[error("unknown undo marker {0}")]
    UnknownMarker(u64),
}

/// Result of an add request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Instance),
    /// The container is full; nothing changed
    Rejected,
}

impl AddOutcome {
    pub fn instance(&self) -> Option<&Instance> {
        match self {
            AddOutcome::Added(instance) => Some(instance),
            AddOutcome::Rejected => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AddOutcome::Rejected)
    }
}

/// The ordered collection of instances for one replication point
pub struct Container {
    config: ContainerConfig,
    templates: TemplateStore,
    allocator: IndexAllocator,
    instances: Vec<Instance>,
    soft_delete: SoftDeleteCoordinator,
    events: EventBus,
    render: Box<dyn RenderTarget>,
    confirm: Box<dyn Confirm>,
    next_id: u64,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("config", &self.config)
            .field("templates", &self.templates)
            .field("instances", &self.instances)
            .field("soft_delete", &self.soft_delete)
            .field("events", &self.events)
            .finish()
    }
}

impl Container {
    /// Create an empty container that renders nowhere
    pub fn new(config: ContainerConfig) -> Self {
        let templates =
            TemplateStore::new(config.depth, config.placeholder.clone(), config.seed_margin);
        Self {
            config,
            templates,
            allocator: IndexAllocator::new(),
            instances: Vec::new(),
            soft_delete: SoftDeleteCoordinator::new(),
            events: EventBus::new(),
            render: Box::new(NullRenderTarget),
            confirm: Box::new(LogConfirm),
            next_id: 0,
        }
    }

    /// Set the presentation layer
    pub fn with_render_target(mut self, render: impl RenderTarget + 'static) -> Self {
        self.render = Box::new(render);
        self
    }

    /// Set the capability used for blocking user messages
    pub fn with_confirm(mut self, confirm: impl Confirm + 'static) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Configuration for a container nested inside this one
    pub fn child_config(&self) -> ContainerConfig {
        self.config.child()
    }

    // --- templates ---

    /// Capture the prototype for `name` and seed its index counter
    pub fn capture(
        &mut self,
        name: Option<&str>,
        raw_text: &str,
    ) -> Result<&Template, ContainerError> {
        let name: TemplateName = name.map(str::to_string);
        let template = self.templates.capture(name.clone(), raw_text)?;
        self.allocator.register(name, template.first_index);
        Ok(template)
    }

    pub fn template(&self, name: Option<&str>) -> Result<&Template, ContainerError> {
        Ok(self.templates.get(&name.map(str::to_string))?)
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// The index the next add of `name` would receive
    pub fn peek_index(&self, name: Option<&str>) -> Option<u64> {
        self.allocator.peek(&name.map(str::to_string))
    }

    // --- listeners ---

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&ContainerEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // --- queries ---

    /// Number of instances that are not deleted
    pub fn current_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_active()).count()
    }

    /// Whether another instance fits under `max_items`
    pub fn can_add(&self) -> bool {
        self.config
            .max_items
            .map_or(true, |max| self.current_count() < max)
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// Every instance, deleted ones included, in presentation order
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn active_instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter().filter(|i| i.is_active())
    }

    /// Undo markers of deletions that can still be reverted
    pub fn pending_undo(&self) -> impl Iterator<Item = &UndoMarker> {
        self.soft_delete.pending()
    }

    // --- adding ---

    /// Add one instance of `name`, applying `overrides` as default values
    pub fn add(
        &mut self,
        name: Option<&str>,
        overrides: &Overrides,
    ) -> Result<AddOutcome, ContainerError> {
        let name: TemplateName = name.map(str::to_string);
        match self.insert_new(&name, overrides, InstanceOrigin::Added)? {
            Some(instance) => {
                self.events
                    .emit(&ContainerEvent::InstanceAdded(instance.clone()));
                Ok(AddOutcome::Added(instance))
            }
            None => Ok(AddOutcome::Rejected),
        }
    }

    /// Add one single-template instance per record, notifying once at the end
    ///
    /// Records past the item limit are skipped.
    pub fn add_many(&mut self, records: &[Overrides]) -> Result<Vec<Instance>, ContainerError> {
        let name: TemplateName = None;
        self.templates.get(&name)?;

        let mut added = Vec::with_capacity(records.len());
        for record in records {
            match self.insert_new(&name, record, InstanceOrigin::Added)? {
                Some(instance) => added.push(instance),
                None => {
                    warn!(
                        skipped = records.len() - added.len(),
                        "item limit reached during batch add"
                    );
                    break;
                }
            }
        }

        debug!(count = added.len(), "batch added");
        self.events.emit(&ContainerEvent::BatchAdded(added.clone()));
        self.events.emit(&ContainerEvent::BatchAddedDone);
        Ok(added)
    }

    /// Show a blank template-only instance
    pub fn add_placeholder(&mut self, name: Option<&str>) -> Result<AddOutcome, ContainerError> {
        let name: TemplateName = name.map(str::to_string);
        match self.insert_new(&name, &Overrides::new(), InstanceOrigin::Placeholder)? {
            Some(instance) => {
                self.events
                    .emit(&ContainerEvent::InstanceAdded(instance.clone()));
                Ok(AddOutcome::Added(instance))
            }
            None => Ok(AddOutcome::Rejected),
        }
    }

    /// Register an instance the server already rendered
    ///
    /// The index counter moves past `index` so new instances never collide
    /// with it. Server-rendered instances are not inserted into the render
    /// target and are not subject to the item limit.
    pub fn adopt_existing(
        &mut self,
        name: Option<&str>,
        index: u64,
        markup: impl Into<String>,
    ) -> Result<Instance, ContainerError> {
        let name: TemplateName = name.map(str::to_string);
        self.templates.get(&name)?;
        self.allocator.observe(&name, index);

        let id = self.next_instance_id();
        self.instances.push(Instance {
            id,
            index,
            template_name: name,
            order: None,
            state: InstanceState::Active,
            origin: InstanceOrigin::Existing,
            markup: markup.into(),
            values: Overrides::new(),
        });
        self.refresh();

        if let Some(max) = self.config.max_items {
            if self.current_count() > max {
                warn!(count = self.current_count(), max, "server rendered more items than allowed");
            }
        }
        Ok(self.instances[self.instances.len() - 1].clone())
    }

    /// Drop every template-only placeholder instance
    pub fn clear_placeholders(&mut self) -> usize {
        let (placeholders, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.instances)
            .into_iter()
            .partition(|i| i.origin == InstanceOrigin::Placeholder);
        self.instances = kept;

        for instance in &placeholders {
            if self.soft_delete.take(instance.id).is_some() {
                self.render.dismiss_undo_marker(instance.id);
            }
            self.render.remove(instance.id);
        }
        if !placeholders.is_empty() {
            debug!(count = placeholders.len(), "cleared placeholders");
            self.refresh();
        }
        placeholders.len()
    }

    fn insert_new(
        &mut self,
        name: &TemplateName,
        overrides: &Overrides,
        origin: InstanceOrigin,
    ) -> Result<Option<Instance>, ContainerError> {
        let template = self.templates.get(name)?;
        if !self.can_add() {
            debug!(
                template = display_name(name),
                count = self.current_count(),
                "add rejected, item limit reached"
            );
            return Ok(None);
        }

        let index = self.allocator.next_index(name)?;
        let materialized = materialize(template, index, overrides);
        let (position, at) = self.insertion_point(name);
        let id = self.next_instance_id();

        self.instances.insert(
            at,
            Instance {
                id,
                index,
                template_name: name.clone(),
                order: None,
                state: InstanceState::Active,
                origin,
                markup: materialized.markup,
                values: materialized.values,
            },
        );
        self.render.insert(id, &self.instances[at].markup, position);
        self.refresh();

        debug!(
            template = display_name(name),
            index,
            %id,
            applied = materialized.applied,
            "added instance"
        );
        Ok(Some(self.instances[at].clone()))
    }

    /// Where a new instance of `name` goes
    ///
    /// Single-template containers append. Multi-template containers keep
    /// instances of one template together: after the last one, or at the head
    /// if there is none yet.
    fn insertion_point(&self, name: &TemplateName) -> (InsertPosition, usize) {
        if !self.templates.is_multi() {
            return (InsertPosition::Tail, self.instances.len());
        }
        match self
            .instances
            .iter()
            .rposition(|i| &i.template_name == name)
        {
            Some(at) => (InsertPosition::After(self.instances[at].id), at + 1),
            None => (InsertPosition::Head, 0),
        }
    }

    fn next_instance_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        id
    }

    // --- removal ---

    /// Soft-delete an instance, opening an undo window
    ///
    /// Removing an instance that is already deleted does nothing.
    pub fn remove(&mut self, id: InstanceId) -> Result<(), ContainerError> {
        let at = self.position(id)?;
        if !self.instances[at].is_active() {
            debug!(%id, "remove ignored, instance already deleted");
            return Ok(());
        }
        let Some(marker) = self.soft_delete.begin(id, &self.config.undo_message) else {
            return Ok(());
        };

        self.instances[at].state = InstanceState::PendingDelete;
        self.render.set_hidden(id, true);
        self.render.show_undo_marker(&marker);
        self.refresh();

        debug!(%id, token = marker.token, "instance pending delete");
        Ok(())
    }

    /// Restore a soft-deleted instance
    ///
    /// Fails with `CapacityExceeded` when the container is already full; the
    /// user is told through the confirmation capability.
    pub fn undo(&mut self, id: InstanceId) -> Result<(), ContainerError> {
        let at = self.position(id)?;
        match self.instances[at].state {
            InstanceState::Active => return Ok(()),
            InstanceState::Excluded => return Err(ContainerError::AlreadySubmitted(id)),
            InstanceState::PendingDelete => {}
        }

        if let Some(max) = self.config.max_items {
            if self.current_count() >= max {
                warn!(%id, max, "undo rejected, item limit reached");
                self.confirm.alert(&self.config.capacity_text());
                return Err(ContainerError::CapacityExceeded { max });
            }
        }

        self.instances[at].state = InstanceState::Active;
        self.soft_delete.take(id);
        self.render.dismiss_undo_marker(id);
        self.render.set_hidden(id, false);
        self.refresh();

        debug!(%id, "instance restored");
        Ok(())
    }

    /// Fire the one-shot undo trigger behind a marker
    pub fn undo_marker(&mut self, token: u64) -> Result<(), ContainerError> {
        let id = self
            .soft_delete
            .resolve(token)
            .ok_or(ContainerError::UnknownMarker(token))?;
        self.undo(id)
    }

    // --- ordering ---

    /// Move an instance to position `new_order` among live instances
    ///
    /// Positions past the end move the instance to the end.
    pub fn reorder(&mut self, id: InstanceId, new_order: usize) -> Result<(), ContainerError> {
        if !self.config.sortable {
            return Err(ContainerError::NotSortable);
        }
        let at = self.position(id)?;
        if !self.instances[at].is_active() {
            return Err(ContainerError::InstanceNotActive(id));
        }

        let instance = self.instances.remove(at);
        let target = self
            .instances
            .iter()
            .enumerate()
            .filter(|(_, i)| i.is_active())
            .map(|(pos, _)| pos)
            .nth(new_order)
            .unwrap_or(self.instances.len());
        self.instances.insert(target, instance);
        self.refresh();

        debug!(%id, new_order, "reordered instance");
        Ok(())
    }

    // --- late results ---

    /// Apply values that arrived after the instance was added
    ///
    /// Returns `None` when the instance is gone or deleted; the result is
    /// dropped.
    pub fn apply_late_overrides(
        &mut self,
        id: InstanceId,
        overrides: &Overrides,
    ) -> Option<Instance> {
        let Some(instance) = self.instances.iter_mut().find(|i| i.id == id) else {
            debug!(%id, "late result for unknown instance dropped");
            return None;
        };
        if !instance.is_active() {
            debug!(%id, "late result for deleted instance dropped");
            return None;
        }

        let applied = apply_overrides(&mut instance.markup, overrides);
        instance
            .values
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.render.update(id, &instance.markup);

        debug!(%id, applied, "applied late values");
        Some(instance.clone())
    }

    // --- submission ---

    /// Instances as the form serializer should see them
    ///
    /// Pending deletions of server records are kept with `deleted = true` so a
    /// `_destroy` field can be sent; pending deletions of anything created on
    /// the client are dropped.
    pub fn instances_for_submission(&self) -> Vec<SubmissionEntry> {
        self.instances
            .iter()
            .filter_map(|instance| {
                let deleted = match (instance.state, instance.origin) {
                    (InstanceState::Active, _) => false,
                    (InstanceState::PendingDelete, InstanceOrigin::Existing) => true,
                    _ => return None,
                };
                let path = self
                    .templates
                    .get(&instance.template_name)
                    .ok()
                    .and_then(|t| t.instance_path(instance.index));
                Some(SubmissionEntry {
                    id: instance.id,
                    path,
                    deleted,
                })
            })
            .collect()
    }

    /// Close every undo window after the form was submitted
    pub fn mark_submitted(&mut self) -> Vec<InstanceId> {
        for marker in self.soft_delete.clear() {
            self.render.dismiss_undo_marker(marker.instance);
        }

        let mut excluded = Vec::new();
        for instance in &mut self.instances {
            if instance.state == InstanceState::PendingDelete {
                instance.state = InstanceState::Excluded;
                excluded.push(instance.id);
            }
        }
        debug!(count = excluded.len(), "submitted deletions excluded");
        excluded
    }

    // --- internals ---

    fn position(&self, id: InstanceId) -> Result<usize, ContainerError> {
        self.instances
            .iter()
            .position(|i| i.id == id)
            .ok_or(ContainerError::UnknownInstance(id))
    }

    /// Renumber live instances and push control visibility to the render target
    fn refresh(&mut self) {
        if self.config.sortable {
            let mut next = 0;
            for instance in &mut self.instances {
                if instance.is_active() {
                    instance.order = Some(next);
                    next += 1;
                } else {
                    instance.order = None;
                }
            }
        }

        let can_add = self.can_add();
        self.render.set_add_enabled(can_add);
        if self.config.sortable {
            let count = self.current_count();
            self.render.set_sortable_controls(count > 1);
        }
    }
}
