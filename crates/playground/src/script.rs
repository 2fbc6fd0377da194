use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use folio_editor::{
    AutosaveNotice, CommandOutcome, ContentMap, EditorConfig, EditorSession, FieldBinding,
    FieldId, HostSelection, MemoryBackend, OwnerId, Plan, Rect, RepeatableOp, SaveStatus, Saver,
    StaticAuth, ToolbarControl,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const DEMO: &str = include_str!("demo.json");

/// Where a scripted selection sits unless the step says otherwise.
const DEFAULT_BOUNDS: Rect = Rect {
    left: 400.0,
    top: 300.0,
    width: 80.0,
    height: 20.0,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default = "default_theme")]
    theme: String,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    plan: Plan,
    #[serde(default)]
    content: ContentMap,
    #[serde(default)]
    fields: Vec<FieldDecl>,
    steps: Vec<Step>,
}

fn default_theme() -> String {
    "default".into()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum FieldDecl {
    Text(FieldBinding),
    Image {
        path: String,
        #[serde(default)]
        default_src: String,
    },
    List {
        path: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
enum Step {
    EditMode {
        on: bool,
    },
    Focus {
        path: String,
    },
    Type {
        path: String,
        html: String,
    },
    Blur {
        path: String,
    },
    Select {
        path: String,
        text: String,
        #[serde(default)]
        bounds: Option<Rect>,
    },
    ClearSelection,
    Command(ToolbarControl),
    Link {
        url: String,
    },
    Advance {
        ms: u64,
    },
    External {
        path: String,
        value: Value,
    },
    Image {
        path: String,
        url: String,
        #[serde(default)]
        upload: bool,
    },
    List {
        path: String,
        op: RepeatableOp,
    },
    Save,
    SignIn {
        owner: String,
    },
    SignOut,
}

#[derive(Debug, Serialize)]
pub struct Report {
    content: ContentMap,
    status: SaveStatus,
    status_label: &'static str,
    save_calls: usize,
    writes: usize,
    notice: Option<AutosaveNotice>,
    events: Vec<Event>,
}

/// Something the user would have seen: a command result or an error.
#[derive(Debug, Serialize)]
struct Event {
    step: usize,
    action: &'static str,
    result: Value,
}

type Session = EditorSession<MemoryBackend, StaticAuth>;

impl Script {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse script {}", path.display()))
    }

    pub fn demo() -> anyhow::Result<Self> {
        serde_json::from_str(DEMO).context("built-in demo script is malformed")
    }

    pub fn run(self, config: EditorConfig) -> anyhow::Result<Report> {
        let mut session = self.start(config)?;
        let ids = mount(&mut session, self.fields);
        let mut events = Vec::new();

        for (ix, step) in self.steps.into_iter().enumerate() {
            tracing::debug!(step = ix, ?step, "running step");
            if let Some(event) = run_step(&mut session, &ids, ix, step)? {
                events.push(event);
            }
        }
        tracing::info!(events = events.len(), "script finished");

        let backend = session.saver().backend();
        Ok(Report {
            content: session.store().snapshot(),
            status: session.status(),
            status_label: session.status().label(),
            save_calls: backend.save_calls(),
            writes: backend.writes(),
            notice: session.notice(),
            events,
        })
    }

    fn start(&self, config: EditorConfig) -> anyhow::Result<Session> {
        let owner = self.owner.as_deref().map(OwnerId::new);
        let (backend, auth) = match &owner {
            Some(owner) => (
                MemoryBackend::new().with_content(owner, &self.theme, self.content.clone(), None),
                StaticAuth::signed_in(owner.clone()),
            ),
            None => (MemoryBackend::new(), StaticAuth::anonymous()),
        };

        let mut session = EditorSession::new(config, Saver::new(backend, auth, &self.theme));
        session.set_plan(self.plan);
        if !session.load().context("failed to load content")? {
            session.replace_content(self.content.clone());
        }
        Ok(session)
    }
}

fn mount(session: &mut Session, fields: Vec<FieldDecl>) -> HashMap<String, FieldId> {
    fields
        .into_iter()
        .map(|decl| match decl {
            FieldDecl::Text(binding) => {
                let path = binding.path.clone();
                (path, session.register_text(binding))
            }
            FieldDecl::Image { path, default_src } => {
                let id = session.register_image(path.clone(), default_src);
                (path, id)
            }
            FieldDecl::List { path } => {
                let id = session.register_repeatable(path.clone());
                (path, id)
            }
        })
        .collect()
}

fn lookup(ids: &HashMap<String, FieldId>, ix: usize, path: &str) -> anyhow::Result<FieldId> {
    ids.get(path)
        .copied()
        .with_context(|| format!("step {ix}: no field mounted at {path:?}"))
}

fn outcome_event(ix: usize, action: &'static str, outcome: &CommandOutcome) -> anyhow::Result<Event> {
    Ok(Event {
        step: ix,
        action,
        result: serde_json::to_value(outcome).context("failed to encode command outcome")?,
    })
}

fn error_event(ix: usize, action: &'static str, err: impl std::fmt::Display) -> Event {
    Event {
        step: ix,
        action,
        result: json!({ "error": err.to_string() }),
    }
}

fn run_step(
    session: &mut Session,
    ids: &HashMap<String, FieldId>,
    ix: usize,
    step: Step,
) -> anyhow::Result<Option<Event>> {
    match step {
        Step::EditMode { on } => session.set_edit_mode(on),
        Step::Focus { path } => {
            if !session.focus(lookup(ids, ix, &path)?) {
                tracing::warn!(step = ix, %path, "field cannot take focus");
            }
        }
        Step::Type { path, html } => {
            if !session.input(lookup(ids, ix, &path)?, &html) {
                tracing::warn!(step = ix, %path, "input ignored");
            }
        }
        Step::Blur { path } => session.blur(lookup(ids, ix, &path)?),
        Step::Select { path, text, bounds } => {
            let field = lookup(ids, ix, &path)?;
            let range = session
                .text(field)
                .with_context(|| format!("step {ix}: {path:?} is not a text field"))?
                .dom()
                .find_text(&text, 0)
                .with_context(|| format!("step {ix}: {text:?} not found in {path:?}"))?;
            session.select(Some(HostSelection {
                field,
                range,
                bounds: bounds.unwrap_or(DEFAULT_BOUNDS),
            }));
        }
        Step::ClearSelection => session.select(None),
        Step::Command(control) => {
            let outcome = session.toolbar_mouse_down(control);
            return outcome_event(ix, "command", &outcome).map(Some);
        }
        Step::Link { url } => {
            let outcome = session.submit_link(&url);
            return outcome_event(ix, "link", &outcome).map(Some);
        }
        Step::Advance { ms } => session.advance_by(Duration::from_millis(ms)),
        Step::External { path, value } => session.push_external(&path, value),
        Step::Image { path, url, upload } => {
            let field = lookup(ids, ix, &path)?;
            let result = if upload {
                session.upload_image(field, &url)
            } else {
                session.choose_stock_image(field, &url)
            };
            if let Err(err) = result {
                return Ok(Some(error_event(ix, "image", err)));
            }
        }
        Step::List { path, op } => {
            if let Err(err) = session.edit_list(lookup(ids, ix, &path)?, op) {
                return Ok(Some(error_event(ix, "list", err)));
            }
        }
        Step::Save => {
            let event = match session.save_now() {
                Ok(()) => Event {
                    step: ix,
                    action: "save",
                    result: json!({ "saved": true }),
                },
                Err(err) => error_event(ix, "save", err),
            };
            return Ok(Some(event));
        }
        Step::SignIn { owner } => session.saver_mut().auth_mut().sign_in(OwnerId::new(owner)),
        Step::SignOut => session.saver_mut().auth_mut().sign_out(),
    }
    Ok(None)
}
