use std::collections::BTreeMap;
use std::time::Duration;

use folio_markup::{ComputedStyle, ExecCommand, FormattingState, InlineStyleAttr, TextRange};
use serde_json::Value;

use crate::autosave::{AutosaveNotice, AutosaveScheduler};
use crate::backend::{AuthProvider, ContentBackend, DefaultPlanPolicy, Plan, PlanPolicy, Saver};
use crate::command::{Command, CommandOutcome};
use crate::config::EditorConfig;
use crate::error::{FieldError, SaveError};
use crate::field::{
    EditableField, EditableImage, EditableText, Field, FieldBinding, FieldDisplay, FieldId,
    ImageAffordances, RepeatableField, RepeatableOp,
};
use crate::geometry::Viewport;
use crate::selection::{HostSelection, SelectionTracker, TrackerUpdate, toolbar_position};
use crate::store::{ContentMap, ContentStore, SaveStatus};
use crate::time::Timestamp;
use crate::toolbar::{FloatingToolbar, ToolbarAction, ToolbarControl};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocSelection {
    pub field: FieldId,
    pub range: TextRange,
}

/// The host drives time through [`EditorSession::advance_to`].
pub struct EditorSession<B, A> {
    config: EditorConfig,
    store: ContentStore,
    saver: Saver<B, A>,
    fields: BTreeMap<FieldId, Field>,
    next_field: usize,
    tracker: SelectionTracker,
    toolbar: FloatingToolbar,
    autosave: AutosaveScheduler,
    selection: Option<DocSelection>,
    focused: Option<FieldId>,
    viewport: Viewport,
    styles: Box<dyn ComputedStyle>,
    policy: Box<dyn PlanPolicy>,
    plan: Plan,
    now: Timestamp,
    mounted: bool,
}

impl<B: ContentBackend, A: AuthProvider> EditorSession<B, A> {
    pub fn new(config: EditorConfig, saver: Saver<B, A>) -> Self {
        Self {
            autosave: AutosaveScheduler::new(&config),
            config,
            store: ContentStore::new(),
            saver,
            fields: BTreeMap::new(),
            next_field: 0,
            tracker: SelectionTracker::new(),
            toolbar: FloatingToolbar::new(),
            selection: None,
            focused: None,
            viewport: Viewport::default(),
            styles: Box::new(InlineStyleAttr),
            policy: Box::new(DefaultPlanPolicy),
            plan: Plan::default(),
            now: Timestamp::ZERO,
            mounted: true,
        }
    }

    pub fn with_styles(mut self, styles: impl ComputedStyle + 'static) -> Self {
        self.styles = Box::new(styles);
        self
    }

    pub fn with_plan_policy(mut self, policy: impl PlanPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn saver(&self) -> &Saver<B, A> {
        &self.saver
    }

    pub fn saver_mut(&mut self) -> &mut Saver<B, A> {
        &mut self.saver
    }

    pub fn toolbar(&self) -> &FloatingToolbar {
        &self.toolbar
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    pub fn selection(&self) -> Option<DocSelection> {
        self.selection
    }

    pub fn focused(&self) -> Option<FieldId> {
        self.focused
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn status(&self) -> SaveStatus {
        self.store.status()
    }

    pub fn notice(&self) -> Option<AutosaveNotice> {
        self.autosave.notice()
    }

    pub fn dismiss_notice(&mut self) {
        self.autosave.dismiss_notice();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(&id)
    }

    pub fn text(&self, id: FieldId) -> Option<&EditableText> {
        self.fields.get(&id).and_then(Field::as_text)
    }

    pub fn image(&self, id: FieldId) -> Option<&EditableImage> {
        self.fields.get(&id).and_then(Field::as_image)
    }

    pub fn repeatable(&self, id: FieldId) -> Option<&RepeatableField> {
        self.fields.get(&id).and_then(Field::as_repeatable)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    // Loading and mounting

    pub fn load(&mut self) -> Result<bool, SaveError> {
        let Some(stored) = self.saver.load()? else {
            tracing::debug!(theme = self.saver.theme(), "no saved content");
            return Ok(false);
        };
        tracing::info!(
            theme = self.saver.theme(),
            entries = stored.content.len(),
            "content loaded"
        );
        self.replace_content(stored.content);
        Ok(true)
    }

    /// Swaps in a whole content map (a fresh load, theme defaults) and lets
    /// the mounted fields reconcile with it. The store ends up clean.
    pub fn replace_content(&mut self, content: ContentMap) {
        self.store.set_content(content);
        self.sync_fields_from_store();
    }

    /// Writes a value that changed outside the editor (another tab, an
    /// import) and lets the bound fields reconcile with it.
    pub fn push_external(&mut self, path: &str, value: impl Into<Value>) {
        self.store.update_content(path, value);
        self.sync_fields_from_store();
        self.after_store_write();
    }

    fn sync_fields_from_store(&mut self) {
        let now = self.now;
        for field in self.fields.values_mut() {
            let value = self.store.get(field.path()).cloned().unwrap_or(Value::Null);
            field.receive_external(&value, now);
        }
    }

    fn allocate_id(&mut self) -> FieldId {
        let id = FieldId::new(self.next_field);
        self.next_field += 1;
        id
    }

    pub fn register_text(&mut self, binding: FieldBinding) -> FieldId {
        let id = self.allocate_id();
        let initial = self.store.get_str(&binding.path);
        let field = EditableText::new(id, binding, initial, &self.config);
        tracing::debug!(field = %id, path = field.path(), "text field mounted");
        self.fields.insert(id, Field::Text(field));
        id
    }

    pub fn register_image(
        &mut self,
        path: impl Into<String>,
        default_src: impl Into<String>,
    ) -> FieldId {
        let id = self.allocate_id();
        let path = path.into();
        let initial = self.store.get_str(&path);
        let affordances = ImageAffordances::for_plan(self.policy.as_ref(), self.plan);
        let field = EditableImage::new(id, path, default_src, initial, affordances);
        self.fields.insert(id, Field::Image(field));
        id
    }

    pub fn register_repeatable(&mut self, path: impl Into<String>) -> FieldId {
        let id = self.allocate_id();
        let path = path.into();
        let field = RepeatableField::new(id, path.clone(), self.store.get(&path));
        self.fields.insert(id, Field::Repeatable(field));
        id
    }

    pub fn unmount(&mut self, id: FieldId) {
        let Some(mut field) = self.fields.remove(&id) else {
            return;
        };
        if let Some(text) = field.as_text_mut() {
            text.cancel_pending();
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        if self.selection.is_some_and(|sel| sel.field == id) {
            self.selection = None;
            self.toolbar.hide();
        }
        self.tracker.forget_field(id);
        tracing::debug!(field = %id, "field unmounted");
    }

    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = plan;
        let affordances = ImageAffordances::for_plan(self.policy.as_ref(), plan);
        for field in self.fields.values_mut() {
            if let Some(image) = field.as_image_mut() {
                image.set_affordances(affordances);
            }
        }
    }

    // Host events

    pub fn set_edit_mode(&mut self, edit_mode: bool) {
        self.store.set_edit_mode(edit_mode);
        if !edit_mode {
            if let Some(id) = self.focused {
                self.blur(id);
            }
            self.selection = None;
            self.toolbar.hide();
        }
    }

    pub fn focus(&mut self, id: FieldId) -> bool {
        if self.focused == Some(id) {
            return true;
        }
        let edit_mode = self.store.edit_mode();
        if editable_text(&mut self.fields, id, edit_mode).is_none() {
            return false;
        }
        if let Some(previous) = self.focused {
            self.blur(previous);
        }
        if let Some(text) = editable_text(&mut self.fields, id, edit_mode) {
            text.focus();
        }
        self.focused = Some(id);
        true
    }

    pub fn blur(&mut self, id: FieldId) {
        let now = self.now;
        let mut wrote = false;
        if let Some(text) = self.fields.get_mut(&id).and_then(Field::as_text_mut) {
            if text.is_focused() {
                text.blur(&mut self.store, now);
                wrote = true;
            }
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        if wrote {
            self.share_local_write(id);
        }
    }

    pub fn input(&mut self, id: FieldId, html: &str) -> bool {
        if !self.focus(id) {
            return false;
        }
        let now = self.now;
        let Some(text) = editable_text(&mut self.fields, id, self.store.edit_mode()) else {
            return false;
        };
        text.on_input(html, &mut self.store, now);
        self.share_local_write(id);
        true
    }

    /// Document selection changed. `None` means the selection left every
    /// editable field or was cleared by a click elsewhere.
    pub fn select(&mut self, selection: Option<HostSelection>) {
        let edit_mode = self.store.edit_mode();
        let resolved = selection.and_then(|sel| {
            let text = self
                .fields
                .get(&sel.field)
                .and_then(Field::as_text)
                .filter(|text| text.is_editable(edit_mode))?;
            Some((sel, text))
        });

        let update = self.tracker.on_selection_change(
            resolved.as_ref().map(|(sel, text)| (sel, text.dom())),
            edit_mode,
            self.viewport,
            &self.config,
        );

        self.selection = resolved.map(|(sel, _)| DocSelection {
            field: sel.field,
            range: sel.range.ordered(),
        });

        match update {
            TrackerUpdate::Show(position) => {
                let formatting = self.formatting_of_selection().unwrap_or_default();
                self.toolbar.show(position, formatting);
            }
            TrackerUpdate::Hide => {
                if self.toolbar.link_input().is_none() {
                    self.toolbar
                        .schedule_hide(self.now, self.config.toolbar_hide_delay());
                }
            }
        }
    }

    fn formatting_of_selection(&self) -> Option<FormattingState> {
        let sel = self.selection?;
        let text = self.text(sel.field)?;
        Some(text.dom().inspect(sel.range, self.styles.as_ref()))
    }

    // Toolbar

    /// Toolbar button pressed. The saved range is restored on mousedown,
    /// before focus leaves the field.
    pub fn toolbar_mouse_down(&mut self, control: ToolbarControl) -> CommandOutcome {
        self.toolbar.cancel_hide();
        self.restore_saved_selection();
        match self.toolbar.action_for(&control) {
            ToolbarAction::Execute(command) => {
                let keep = command.keeps_selection();
                self.execute(command, keep)
            }
            ToolbarAction::OpenLinkInput => {
                let prefill = self
                    .selection
                    .and_then(|sel| {
                        self.text(sel.field)
                            .and_then(|text| text.dom().link_href(sel.range))
                    })
                    .unwrap_or_default();
                self.toolbar.open_link_input(prefill.clone());
                CommandOutcome::AwaitingLink { prefill }
            }
        }
    }

    pub fn submit_link(&mut self, url: &str) -> CommandOutcome {
        self.restore_saved_selection();
        let command = self.toolbar.submit_link(url);
        self.execute(command, false)
    }

    pub fn cancel_link(&mut self) {
        self.toolbar.cancel_link();
    }

    fn restore_saved_selection(&mut self) {
        let Some(saved) = self.tracker.saved() else {
            return;
        };
        let Some(text) = self.text(saved.field) else {
            return;
        };
        if let Some(range) = saved.resolve(text.dom()) {
            self.selection = Some(DocSelection {
                field: saved.field,
                range,
            });
        }
    }

    /// Live selection first, then the tracker's saved range. Yields the
    /// target field, the range and the text it covers.
    fn resolve_target(&self) -> Option<(FieldId, TextRange, String)> {
        if let Some(sel) = self.selection {
            if let Some(text) = self.text(sel.field) {
                let selected = text.dom().text_in(sel.range);
                if !sel.range.is_collapsed() && !selected.is_empty() {
                    return Some((sel.field, sel.range, selected));
                }
            }
        }
        let saved = self.tracker.saved()?;
        let text = self.text(saved.field)?;
        let range = saved.resolve(text.dom())?;
        Some((saved.field, range, saved.text.clone()))
    }

    pub fn execute(&mut self, command: Command, keep_selection: bool) -> CommandOutcome {
        if !self.mounted {
            return CommandOutcome::Skipped;
        }
        match command {
            Command::Format(exec) => self.execute_format(&exec, keep_selection),
            Command::Undo => self.execute_history(true),
            Command::Redo => self.execute_history(false),
        }
    }

    fn execute_format(
        &mut self,
        exec: &ExecCommand,
        keep_selection: bool,
    ) -> CommandOutcome {
        let Some((field, range, selected)) = self.resolve_target() else {
            tracing::debug!(command = exec.name(), "no selection to format");
            return CommandOutcome::Skipped;
        };
        if !self.focus(field) {
            return CommandOutcome::Skipped;
        }
        self.selection = Some(DocSelection { field, range });

        let now = self.now;
        let Some(text) = editable_text(&mut self.fields, field, self.store.edit_mode()) else {
            return CommandOutcome::Skipped;
        };
        let effect = match text.exec(exec, range) {
            Ok(effect) => effect,
            Err(err) => {
                tracing::warn!(%err, command = exec.name(), "formatting command failed");
                return CommandOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };
        tracing::debug!(command = exec.name(), field = %field, changed = effect.changed, "command applied");

        text.on_formatting_change(&mut self.store, now);
        let html = text.html().to_string();
        let reselected = effect
            .wrapper_range
            .filter(|wrapped| text.dom().text_in(*wrapped) == selected)
            .or_else(|| text.dom().find_text(&selected, range.start));
        self.share_local_write(field);

        if keep_selection {
            self.reselect(field, reselected, selected);
        } else {
            self.selection = None;
            self.tracker.clear();
            self.toolbar
                .schedule_hide(now, self.config.toolbar_hide_delay());
        }
        CommandOutcome::Applied { field, html }
    }

    fn reselect(&mut self, field: FieldId, range: Option<TextRange>, selected: String) {
        let Some(range) = range else {
            tracing::debug!(field = %field, "could not reselect formatted text");
            self.selection = None;
            return;
        };
        self.selection = Some(DocSelection { field, range });
        let bounds = self.tracker.last_bounds().unwrap_or_default();
        self.tracker.save(field, range, selected, bounds);
        let formatting = self.formatting_of_selection().unwrap_or_default();
        if self.toolbar.is_visible() {
            self.toolbar.set_formatting(formatting);
        } else {
            self.toolbar.show(
                toolbar_position(bounds, self.viewport, &self.config),
                formatting,
            );
        }
    }

    fn execute_history(&mut self, undo: bool) -> CommandOutcome {
        let target = self
            .focused
            .or_else(|| self.selection.map(|sel| sel.field))
            .or_else(|| self.tracker.saved().map(|saved| saved.field));
        let Some(field) = target else {
            return CommandOutcome::Skipped;
        };
        let now = self.now;
        let Some(text) = editable_text(&mut self.fields, field, self.store.edit_mode()) else {
            return CommandOutcome::Skipped;
        };
        let stepped = if undo {
            text.undo(&mut self.store, now)
        } else {
            text.redo(&mut self.store, now)
        };
        if !stepped {
            return CommandOutcome::Skipped;
        }
        let html = text.html().to_string();
        self.share_local_write(field);
        self.selection = None;
        self.toolbar.hide();
        CommandOutcome::Applied { field, html }
    }

    // Images and lists

    pub fn choose_stock_image(&mut self, id: FieldId, url: &str) -> Result<(), FieldError> {
        let image = image_in_edit_mode(&mut self.fields, id, self.store.edit_mode())?;
        image.choose_stock(url, &mut self.store)?;
        self.share_local_write(id);
        Ok(())
    }

    pub fn upload_image(&mut self, id: FieldId, url: &str) -> Result<(), FieldError> {
        let image = image_in_edit_mode(&mut self.fields, id, self.store.edit_mode())?;
        image.upload(url, &mut self.store)?;
        self.share_local_write(id);
        Ok(())
    }

    pub fn edit_list(&mut self, id: FieldId, op: RepeatableOp) -> Result<(), FieldError> {
        if !self.store.edit_mode() {
            return Err(FieldError::Disabled(id.to_string()));
        }
        let list = self
            .fields
            .get_mut(&id)
            .and_then(Field::as_repeatable_mut)
            .ok_or_else(|| FieldError::UnknownField(id.to_string()))?;
        list.apply(op, &mut self.store)?;
        self.share_local_write(id);
        Ok(())
    }

    pub fn render(&self, id: FieldId) -> Option<FieldDisplay> {
        self.text(id).map(|text| text.display(self.store.edit_mode()))
    }

    // Time and saving

    fn share_local_write(&mut self, source: FieldId) {
        if let Some(path) = self.fields.get(&source).map(|field| field.path().to_string()) {
            let value = self.store.get(&path).cloned().unwrap_or(Value::Null);
            let now = self.now;
            for (id, field) in &mut self.fields {
                if *id != source && field.path() == path {
                    let sync = field.receive_external(&value, now);
                    tracing::trace!(field = %id, ?sync, "shared local write");
                }
            }
        }
        self.after_store_write();
    }

    fn after_store_write(&mut self) {
        if self.store.has_unsaved_changes() {
            self.autosave.schedule(self.now);
        }
    }

    /// Field syncs fire before the toolbar hide and the debounced save.
    pub fn advance_to(&mut self, now: Timestamp) {
        if !self.mounted || now < self.now {
            return;
        }
        self.now = now;
        for field in self.fields.values_mut() {
            if let Some(text) = field.as_text_mut() {
                text.poll(now);
            }
        }
        if self.toolbar.poll(now) {
            tracing::trace!("toolbar hidden");
        }
        self.autosave.poll(now, &mut self.store, &mut self.saver);
    }

    pub fn advance_by(&mut self, delta: Duration) {
        self.advance_to(self.now + delta);
    }

    pub fn save_now(&mut self) -> Result<(), SaveError> {
        self.autosave
            .save_now(self.now, &mut self.store, &mut self.saver)
    }

    pub fn shutdown(&mut self) {
        self.mounted = false;
        self.autosave.cancel();
        self.toolbar.hide();
        for field in self.fields.values_mut() {
            if let Some(text) = field.as_text_mut() {
                text.cancel_pending();
            }
        }
        tracing::debug!("editor session shut down");
    }
}

fn editable_text(
    fields: &mut BTreeMap<FieldId, Field>,
    id: FieldId,
    edit_mode: bool,
) -> Option<&mut EditableText> {
    fields
        .get_mut(&id)
        .and_then(Field::as_text_mut)
        .filter(|text| text.is_editable(edit_mode))
}

fn image_in_edit_mode(
    fields: &mut BTreeMap<FieldId, Field>,
    id: FieldId,
    edit_mode: bool,
) -> Result<&mut EditableImage, FieldError> {
    if !edit_mode {
        return Err(FieldError::Disabled(id.to_string()));
    }
    fields
        .get_mut(&id)
        .and_then(Field::as_image_mut)
        .ok_or_else(|| FieldError::UnknownField(id.to_string()))
}
