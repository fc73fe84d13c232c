use crate::transport::{GraphQlTransport, PageRequest};
use friendnet_core::{ApiConfig, FriendNetError, Identity, IdentityCollection, Operation, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const MUTUAL_FRIENDS_LIST_TYPE: &str = "MUTUAL_FRIENDS";
const USER_TYPENAME: &str = "User";

/// What a paginated fetch walks through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// The scanned account's own friends
    FriendList,
    /// Connections shared between the account and `source_id`
    MutualFriends { source_id: String },
}

impl ResourceKind {
    pub fn mutual_friends(source_id: impl Into<String>) -> Self {
        Self::MutualFriends {
            source_id: source_id.into(),
        }
    }

    fn connection_pointer(&self) -> &'static str {
        match self {
            ResourceKind::FriendList => "/data/viewer/all_friends",
            ResourceKind::MutualFriends { .. } => "/data/profile_list/list_items",
        }
    }
}

/// Pagination marker returned with every page. `has_more == false` ends the walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageCursor {
    #[serde(rename = "has_next_page")]
    pub has_more: bool,
    #[serde(rename = "end_cursor", default)]
    pub token: Option<String>,
}

/// One parsed response page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub identities: Vec<Identity>,
    pub cursor: PageCursor,
}

enum PaginationState {
    Fetching { cursor: Option<String> },
    Done,
}

#[derive(Serialize)]
struct PageVariables<'a> {
    #[serde(rename = "count", skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
    #[serde(rename = "listType", skip_serializing_if = "Option::is_none")]
    list_type: Option<&'a str>,
    #[serde(serialize_with = "compact_number")]
    scale: f64,
    #[serde(rename = "sourceID", skip_serializing_if = "Option::is_none")]
    source_id: Option<&'a str>,
}

/// Whole numbers go out as integers (`1`, not `1.0`).
fn compact_number<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Deserialize)]
struct Connection {
    #[serde(default)]
    edges: Vec<ConnectionEdge>,
    page_info: PageCursor,
}

#[derive(Deserialize)]
struct ConnectionEdge {
    node: RemoteNode,
}

#[derive(Deserialize)]
struct RemoteNode {
    #[serde(rename = "__typename")]
    typename: String,
    #[serde(default, deserialize_with = "id_as_string")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    gender: Option<String>,
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "unexpected id value: {other}"
        ))),
    }
}

/// Cursor-driven "fetch all pages" client shared by the friend list and the
/// structured mutual-friend lookups.
#[derive(Clone)]
pub struct PaginatedClient {
    transport: Arc<dyn GraphQlTransport>,
    token: String,
    config: ApiConfig,
}

impl PaginatedClient {
    pub fn new(transport: Arc<dyn GraphQlTransport>, token: impl Into<String>, config: ApiConfig) -> Self {
        Self {
            transport,
            token: token.into(),
            config,
        }
    }

    /// Walks every page of `resource` in order.
    ///
    /// Entries that are not people are dropped. The first transport or parse
    /// failure aborts the walk; nothing is retried and no partial result is
    /// returned.
    pub async fn fetch_all(&self, resource: &ResourceKind) -> Result<IdentityCollection> {
        let mut collected = IdentityCollection::default();
        let mut pages = 0usize;
        let mut state = PaginationState::Fetching { cursor: None };

        while let PaginationState::Fetching { cursor } = state {
            let request = self.build_request(resource, cursor.as_deref())?;
            let body = self.transport.post(&request).await?;
            let page = parse_page(resource, &body)?;
            pages += 1;
            collected.extend(page.identities);

            state = if page.cursor.has_more {
                let next = page.cursor.token.filter(|t| !t.is_empty()).ok_or_else(|| {
                    FriendNetError::MalformedResponse(format!(
                        "page {pages} of {resource:?} announces more pages without a cursor"
                    ))
                })?;
                PaginationState::Fetching { cursor: Some(next) }
            } else {
                PaginationState::Done
            };
        }

        debug!(
            "Fetched {} identities in {} pages for {:?}",
            collected.len(),
            pages,
            resource
        );
        Ok(collected)
    }

    /// First page when `cursor` is `None`, continuation otherwise.
    pub fn build_request(&self, resource: &ResourceKind, cursor: Option<&str>) -> Result<PageRequest> {
        let cursor = cursor.filter(|c| !c.is_empty());
        let continuation = cursor.is_some();

        let (operations, page_size, list_type, source_id) = match resource {
            ResourceKind::FriendList => (&self.config.friend_list, self.config.friend_list_page_size, None, None),
            ResourceKind::MutualFriends { source_id } => (
                &self.config.mutual_friends,
                self.config.mutual_friends_page_size,
                Some(MUTUAL_FRIENDS_LIST_TYPE),
                Some(source_id.as_str()).filter(|id| !id.is_empty()),
            ),
        };

        let variables = PageVariables {
            page_size: continuation.then_some(page_size),
            cursor,
            list_type,
            scale: if continuation {
                self.config.next_page_scale
            } else {
                self.config.first_page_scale
            },
            source_id,
        };

        let operation: &Operation = if continuation {
            &operations.next_pages
        } else {
            &operations.first_page
        };

        Ok(PageRequest {
            token: self.token.clone(),
            operation: operation.clone(),
            variables: serde_json::to_string(&variables)?,
        })
    }
}

/// Parses one response body into people and the next cursor.
pub fn parse_page(resource: &ResourceKind, body: &str) -> Result<Page> {
    let mut value: Value = serde_json::from_str(body)
        .map_err(|e| FriendNetError::MalformedResponse(format!("response is not JSON: {e}")))?;

    let pointer = resource.connection_pointer();
    let connection = value
        .pointer_mut(pointer)
        .map(Value::take)
        .ok_or_else(|| FriendNetError::MalformedResponse(format!("response has no {pointer}")))?;

    let connection: Connection = serde_json::from_value(connection)
        .map_err(|e| FriendNetError::MalformedResponse(format!("unexpected {pointer} shape: {e}")))?;

    let identities = connection
        .edges
        .into_iter()
        .map(|edge| edge.node)
        .filter(|node| node.typename == USER_TYPENAME)
        .map(|node| Identity {
            id: node.id,
            name: node.name,
            link: node.url,
            gender: node.gender,
        })
        .collect();

    Ok(Page {
        identities,
        cursor: connection.page_info,
    })
}
