use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregator::{Header, Observation};
use crate::classify::ResourceType;
use crate::dom::{Document, DomMutation};
use crate::link::Link;
use crate::settings::Settings;

fn default_method() -> String {
    "GET".to_string()
}

/// One message from the browser extension, keyed by `action`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostRequest {
    RequestStarted {
        request_id: String,
        tab_id: i64,
        url: String,
        #[serde(default = "default_method")]
        method: String,
        #[serde(default)]
        resource_type: ResourceType,
    },
    RequestHeadersSent {
        request_id: String,
        #[serde(default)]
        headers: Vec<Header>,
    },
    ResponseHeadersReceived {
        request_id: String,
        url: String,
        #[serde(default)]
        headers: Vec<Header>,
    },
    RequestCompleted {
        request_id: String,
    },
    RequestFailed {
        request_id: String,
    },
    DomStart {
        tab_id: i64,
        document: Document,
    },
    DomMutations {
        tab_id: i64,
        #[serde(default)]
        mutations: Vec<DomMutation>,
    },
    DomStop {
        tab_id: i64,
    },
    CaptureAllLinks {
        tab_id: i64,
        document: Document,
    },
    CaptureLink {
        url: String,
        #[serde(default)]
        filename: Option<String>,
    },
    SendLinks {
        links: Vec<Link>,
    },
    SendSelected,
    GetLinks,
    ToggleLink {
        id: String,
    },
    ToggleAll {
        selected: bool,
    },
    RemoveLink {
        id: String,
    },
    ClearLinks,
    TestConnection,
    GetConnectionStatus,
    SettingsChanged {
        #[serde(default)]
        settings: Option<Settings>,
    },
    ProbeSize {
        url: String,
    },
}

impl HostRequest {
    /// The aggregator phase carried by a network request message, if any.
    pub fn into_observation(self) -> Result<Observation, HostRequest> {
        match self {
            HostRequest::RequestStarted {
                request_id,
                tab_id,
                url,
                method,
                resource_type,
            } => Ok(Observation::Started {
                request_id,
                tab_id,
                url,
                method,
                resource_type,
            }),
            HostRequest::RequestHeadersSent {
                request_id,
                headers,
            } => Ok(Observation::HeadersSent {
                request_id,
                headers,
            }),
            HostRequest::ResponseHeadersReceived {
                request_id,
                url,
                headers,
            } => Ok(Observation::HeadersReceived {
                request_id,
                url,
                headers,
            }),
            HostRequest::RequestCompleted { request_id } => {
                Ok(Observation::Completed { request_id })
            }
            HostRequest::RequestFailed { request_id } => Ok(Observation::Errored { request_id }),
            other => Err(other),
        }
    }
}

/// One message to the browser extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    Response {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    LinksCaptured {
        links: Vec<Link>,
    },
}

impl HostEvent {
    pub fn ok(id: Option<u64>, data: Option<Value>) -> Self {
        HostEvent::Response {
            id,
            success: true,
            data,
            error: None,
        }
    }

    pub fn error(id: Option<u64>, error: impl Into<String>) -> Self {
        HostEvent::Response {
            id,
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Announcement of new links; request credentials are stripped.
    pub fn links_captured(links: &[Link]) -> Self {
        HostEvent::LinksCaptured {
            links: links.iter().map(Link::for_storage).collect(),
        }
    }
}
