//! Resource sub-clients.
//!
//! Every resource is a thin path builder over the four pipeline verbs. The
//! registry maps the public resource names to their kind; [`Client::api`]
//! caches one [`Resource`] per kind.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{LazyLock, Weak};

use serde::Serialize;
use url::form_urlencoded;

use crate::client::{Client, Inner, Response};
use crate::error::{ApiError, Result};
use crate::request::UPLOAD_PATHS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Attachment,
    Group,
    CustomFields,
    Issue,
    IssueCategory,
    IssuePriority,
    IssueRelation,
    IssueStatus,
    Membership,
    News,
    Project,
    Query,
    Role,
    TimeEntry,
    TimeEntryActivity,
    Tracker,
    User,
    Version,
    Wiki,
}

static REGISTRY: LazyLock<HashMap<&'static str, ResourceKind>> = LazyLock::new(|| {
    ResourceKind::ALL
        .iter()
        .map(|kind| (kind.name(), *kind))
        .collect()
});

impl ResourceKind {
    pub const ALL: [ResourceKind; 19] = [
        ResourceKind::Attachment,
        ResourceKind::Group,
        ResourceKind::CustomFields,
        ResourceKind::Issue,
        ResourceKind::IssueCategory,
        ResourceKind::IssuePriority,
        ResourceKind::IssueRelation,
        ResourceKind::IssueStatus,
        ResourceKind::Membership,
        ResourceKind::News,
        ResourceKind::Project,
        ResourceKind::Query,
        ResourceKind::Role,
        ResourceKind::TimeEntry,
        ResourceKind::TimeEntryActivity,
        ResourceKind::Tracker,
        ResourceKind::User,
        ResourceKind::Version,
        ResourceKind::Wiki,
    ];

    /// Name accepted by [`Client::api`].
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Attachment => "attachment",
            ResourceKind::Group => "group",
            ResourceKind::CustomFields => "custom_fields",
            ResourceKind::Issue => "issue",
            ResourceKind::IssueCategory => "issue_category",
            ResourceKind::IssuePriority => "issue_priority",
            ResourceKind::IssueRelation => "issue_relation",
            ResourceKind::IssueStatus => "issue_status",
            ResourceKind::Membership => "membership",
            ResourceKind::News => "news",
            ResourceKind::Project => "project",
            ResourceKind::Query => "query",
            ResourceKind::Role => "role",
            ResourceKind::TimeEntry => "time_entry",
            ResourceKind::TimeEntryActivity => "time_entry_activity",
            ResourceKind::Tracker => "tracker",
            ResourceKind::User => "user",
            ResourceKind::Version => "version",
            ResourceKind::Wiki => "wiki",
        }
    }

    /// URL segment of the resource's items.
    pub fn endpoint(self) -> &'static str {
        match self {
            ResourceKind::Attachment => "attachments",
            ResourceKind::Group => "groups",
            ResourceKind::CustomFields => "custom_fields",
            ResourceKind::Issue => "issues",
            ResourceKind::IssueCategory => "issue_categories",
            ResourceKind::IssuePriority => "enumerations/issue_priorities",
            ResourceKind::IssueRelation => "relations",
            ResourceKind::IssueStatus => "issue_statuses",
            ResourceKind::Membership => "memberships",
            ResourceKind::News => "news",
            ResourceKind::Project => "projects",
            ResourceKind::Query => "queries",
            ResourceKind::Role => "roles",
            ResourceKind::TimeEntry => "time_entries",
            ResourceKind::TimeEntryActivity => "enumerations/time_entry_activities",
            ResourceKind::Tracker => "trackers",
            ResourceKind::User => "users",
            ResourceKind::Version => "versions",
            ResourceKind::Wiki => "wiki",
        }
    }

    /// Collection segment, which differs from the item segment for wiki pages.
    fn collection(self) -> &'static str {
        match self {
            ResourceKind::Wiki => "wiki/index",
            other => other.endpoint(),
        }
    }

    /// Resource the nested collections live under.
    pub fn parent(self) -> &'static str {
        match self {
            ResourceKind::IssueRelation => "issues",
            _ => "projects",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = ApiError;

    fn from_str(name: &str) -> Result<Self> {
        REGISTRY
            .get(name)
            .copied()
            .ok_or_else(|| ApiError::InvalidArgument {
                name: name.to_string(),
            })
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sub-client for one resource kind. Holds a weak handle so the client's
/// cache does not keep the client alive.
#[derive(Debug)]
pub struct Resource {
    kind: ResourceKind,
    client: Weak<Inner>,
}

impl Resource {
    pub(crate) fn new(kind: ResourceKind, client: Weak<Inner>) -> Self {
        Self { kind, client }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn client(&self) -> Result<Client> {
        self.client
            .upgrade()
            .map(Client::from_inner)
            .ok_or(ApiError::ClientClosed)
    }

    pub fn collection_path(&self, params: &[(&str, &str)]) -> String {
        with_query(format!("/{}.json", self.kind.collection()), params)
    }

    pub fn nested_collection_path(
        &self,
        parent_id: impl Display,
        params: &[(&str, &str)],
    ) -> String {
        with_query(
            format!(
                "/{}/{}/{}.json",
                self.kind.parent(),
                parent_id,
                self.kind.collection()
            ),
            params,
        )
    }

    pub fn item_path(&self, id: impl Display) -> String {
        format!("/{}/{}.json", self.kind.endpoint(), id)
    }

    pub fn nested_item_path(&self, parent_id: impl Display, id: impl Display) -> String {
        format!(
            "/{}/{}/{}/{}.json",
            self.kind.parent(),
            parent_id,
            self.kind.endpoint(),
            id
        )
    }

    pub async fn list(&self, params: &[(&str, &str)]) -> Result<Response> {
        self.client()?.get(&self.collection_path(params)).await
    }

    pub async fn list_in(
        &self,
        parent_id: impl Display,
        params: &[(&str, &str)],
    ) -> Result<Response> {
        let path = self.nested_collection_path(parent_id, params);
        self.client()?.get(&path).await
    }

    pub async fn show(&self, id: impl Display) -> Result<Response> {
        self.client()?.get(&self.item_path(id)).await
    }

    pub async fn show_in(&self, parent_id: impl Display, id: impl Display) -> Result<Response> {
        let path = self.nested_item_path(parent_id, id);
        self.client()?.get(&path).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<Response> {
        let payload = serde_json::to_vec(body)?;
        self.client()?
            .post(&format!("/{}.json", self.kind.endpoint()), payload)
            .await
    }

    pub async fn create_in<B: Serialize + ?Sized>(
        &self,
        parent_id: impl Display,
        body: &B,
    ) -> Result<Response> {
        let payload = serde_json::to_vec(body)?;
        let path = format!(
            "/{}/{}/{}.json",
            self.kind.parent(),
            parent_id,
            self.kind.endpoint()
        );
        self.client()?.post(&path, payload).await
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: impl Display,
        body: &B,
    ) -> Result<Response> {
        let payload = serde_json::to_vec(body)?;
        let path = self.item_path(id);
        self.client()?.put(&path, payload).await
    }

    pub async fn remove(&self, id: impl Display) -> Result<Response> {
        let path = self.item_path(id);
        self.client()?.delete(&path).await
    }

    /// Sends raw file content to the upload endpoint. The returned token is
    /// then referenced from an issue's `uploads` list. Only the attachment
    /// resource uploads.
    pub async fn upload(&self, content: impl Into<Vec<u8>>) -> Result<Response> {
        if self.kind != ResourceKind::Attachment {
            return Err(ApiError::UnsupportedOperation {
                resource: self.kind.name(),
                operation: "upload",
            });
        }
        self.client()?.post(UPLOAD_PATHS[0], content).await
    }

    /// Browser link to an item on the configured instance.
    pub fn link(&self, id: impl Display) -> Result<String> {
        let base = self.client()?.url();
        Ok(format!(
            "{}/{}/{}",
            base.trim_end_matches('/'),
            self.kind.endpoint(),
            id
        ))
    }
}

fn with_query(path: String, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path;
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{path}?{query}")
}
