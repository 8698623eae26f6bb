//! Create-or-update publishing.
//!
//! A resource is POSTed to its collection; when the platform answers that it
//! already exists, the identical body is PUT to the resource's own address.
//! Creation is never retried:
//! a blind retry of a POST could create the resource twice before the
//! conflict path is ever reached.

use reqwest::Method;
use serde_json::{Map, Value};

use super::error::ApiError;
use super::transport::{FilePart, RequestBody};
use super::ApiClient;

/// Whether the caller is creating a resource or modifying an existing one.
/// Only changes how a first-try success is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishMode {
    #[default]
    Create,
    Modify,
}

/// What to do when the platform reports that the resource already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// PUT the same body to the resource's update address.
    #[default]
    Update,
    /// Leave the existing resource alone.
    Skip,
}

/// How a conflict is recognised in a create response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictSignal {
    /// 409 only.
    #[default]
    Status,
    /// 409, or a 400 whose body says the resource "already exists".
    /// The image endpoint reports duplicates this way.
    StatusOrExistsMessage,
    /// 409, or any reply whose JSON body carries `"code": 409` and a message
    /// saying the resource "already exists". The configuration endpoint
    /// sometimes wraps its conflict in another status.
    StatusOrBodyCode,
}

impl ConflictSignal {
    fn is_conflict(self, status: u16, body: &str) -> bool {
        match self {
            ConflictSignal::Status => status == 409,
            ConflictSignal::StatusOrExistsMessage => {
                status == 409
                    || (status == 400 && body.to_ascii_lowercase().contains("already exists"))
            }
            ConflictSignal::StatusOrBodyCode => status == 409 || body_reports_conflict(body),
        }
    }
}

fn body_reports_conflict(body: &str) -> bool {
    let Ok(Value::Object(reply)) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    let code = reply.get("code").and_then(Value::as_u64);
    let message = reply
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_lowercase();
    code == Some(409) && message.contains("already exists")
}

/// Result of one publish call. Every variant is returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Created,
    Updated,
    ConflictedThenUpdated,
    /// Conflict with [`ConflictPolicy::Skip`]: nothing was changed.
    AlreadyExists,
    Failed { status: u16, body: String },
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, PublishOutcome::Failed { .. })
    }
}

impl std::fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishOutcome::Created => write!(f, "created"),
            PublishOutcome::Updated => write!(f, "updated"),
            PublishOutcome::ConflictedThenUpdated => write!(f, "already existed, updated"),
            PublishOutcome::AlreadyExists => write!(f, "already exists, skipped"),
            PublishOutcome::Failed { status, body } => write!(f, "failed ({}): {}", status, body),
        }
    }
}

/// A field that scopes a resource, e.g. `user-scope = "Office Manager"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub field: String,
    pub value: String,
}

/// A named resource and the state it should have on the platform.
///
/// The request body is `defaults`, then `desired_state`, then the scope
/// field, each layer overriding the one before it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    name: String,
    path: String,
    update_path: Option<String>,
    defaults: Map<String, Value>,
    desired_state: Map<String, Value>,
    scope: Option<Scope>,
    file: Option<FilePart>,
    conflict_policy: ConflictPolicy,
    conflict_signal: ConflictSignal,
}

impl ResourceDescriptor {
    /// `path` is relative to the API prefix, e.g. `/domains/acme/users`.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            update_path: None,
            defaults: Map::new(),
            desired_state: Map::new(),
            scope: None,
            file: None,
            conflict_policy: ConflictPolicy::default(),
            conflict_signal: ConflictSignal::default(),
        }
    }

    /// Address of the existing resource, used for the PUT after a conflict.
    /// Defaults to the create path.
    pub fn with_update_path(mut self, path: impl Into<String>) -> Self {
        self.update_path = Some(path.into());
        self
    }

    pub fn with_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.desired_state.insert(field.into(), value.into());
        self
    }

    pub fn with_scope(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope = Some(Scope {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Send as a multipart form carrying `file`; body fields become text parts.
    pub fn with_file(mut self, file: FilePart) -> Self {
        self.file = Some(file);
        self
    }

    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn conflict_signal(mut self, signal: ConflictSignal) -> Self {
        self.conflict_signal = signal;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn update_path(&self) -> &str {
        self.update_path.as_deref().unwrap_or(&self.path)
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    pub fn merged_body(&self) -> Map<String, Value> {
        let mut body = self.defaults.clone();
        body.extend(self.desired_state.clone());
        if let Some(scope) = &self.scope {
            body.insert(scope.field.clone(), Value::String(scope.value.clone()));
        }
        body
    }

    fn request_body(&self) -> RequestBody {
        let body = self.merged_body();
        match &self.file {
            None => RequestBody::Json(Value::Object(body)),
            Some(file) => RequestBody::Multipart {
                fields: body
                    .into_iter()
                    .map(|(k, v)| {
                        let v = match v {
                            Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (k, v)
                    })
                    .collect(),
                file: file.clone(),
            },
        }
    }
}

fn is_accepted(status: u16) -> bool {
    matches!(status, 200 | 201 | 202)
}

impl ApiClient {
    /// Create `descriptor`, falling back to an update on conflict.
    pub async fn publish(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<PublishOutcome, ApiError> {
        self.publish_with_mode(descriptor, PublishMode::Create).await
    }

    pub async fn publish_with_mode(
        &self,
        descriptor: &ResourceDescriptor,
        mode: PublishMode,
    ) -> Result<PublishOutcome, ApiError> {
        let body = descriptor.request_body();
        let scope = descriptor.scope().map(|s| s.value.as_str()).unwrap_or("default");

        let created = self
            .send(Method::POST, descriptor.path(), body.clone())
            .await?;
        let created_text = created.text();
        tracing::info!(
            method = "POST",
            url = %self.url(descriptor.path()),
            resource = descriptor.name(),
            scope,
            status = created.status,
            "publish attempt"
        );

        if is_accepted(created.status) {
            return Ok(match mode {
                PublishMode::Create => PublishOutcome::Created,
                PublishMode::Modify => PublishOutcome::Updated,
            });
        }

        if !descriptor
            .conflict_signal
            .is_conflict(created.status, &created_text)
        {
            return Ok(PublishOutcome::Failed {
                status: created.status,
                body: created_text,
            });
        }

        if descriptor.conflict_policy() == ConflictPolicy::Skip {
            tracing::info!(resource = descriptor.name(), "already exists, leaving as is");
            return Ok(PublishOutcome::AlreadyExists);
        }

        tracing::info!(resource = descriptor.name(), "already exists, updating");
        let updated = self.send(Method::PUT, descriptor.update_path(), body).await?;
        tracing::info!(
            method = "PUT",
            url = %self.url(descriptor.update_path()),
            resource = descriptor.name(),
            scope,
            status = updated.status,
            "publish attempt"
        );

        if (200..300).contains(&updated.status) {
            Ok(PublishOutcome::ConflictedThenUpdated)
        } else {
            Ok(PublishOutcome::Failed {
                status: updated.status,
                body: updated.text(),
            })
        }
    }
}
