use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// What the inbox needs to know about a client. The records themselves are
/// owned by the CRM; this is a read-only lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

/// Client id → profile lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientDirectory {
    clients: HashMap<String, ClientProfile>,
}

impl ClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, client_id: impl Into<String>, profile: ClientProfile) {
        self.clients.insert(client_id.into(), profile);
    }

    pub fn get(&self, client_id: &str) -> Option<&ClientProfile> {
        self.clients.get(client_id)
    }

    pub fn display_name(&self, client_id: &str) -> Option<&str> {
        self.clients.get(client_id).map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ClientProfile)> for ClientDirectory {
    fn from_iter<I: IntoIterator<Item = (K, ClientProfile)>>(iter: I) -> Self {
        Self {
            clients: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
