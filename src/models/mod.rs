use crate::error::{MentionError, MentionResult};
use crate::text::utf16_len;
use serde::{Deserialize, Serialize};

/// An inline, non-editable reference to a contact.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MentionToken {
    pub contact_id: String,
    pub display_name: String,
    pub provider: String,
}

impl MentionToken {
    /// Canonical text of the token: `@` followed by the display name.
    pub fn text(&self) -> String {
        format!("@{}", self.display_name)
    }

    /// Logical length in UTF-16 units. A token is never subdivided.
    pub fn logical_len(&self) -> u32 {
        1 + utf16_len(&self.display_name)
    }

    pub fn to_payload(&self) -> MentionPayload {
        MentionPayload {
            contact_id: self.contact_id.clone(),
            contact_name: self.display_name.clone(),
            crm_provider: self.provider.clone(),
        }
    }
}

impl From<&Candidate> for MentionToken {
    fn from(c: &Candidate) -> Self {
        Self {
            contact_id: c.contact_id.clone(),
            display_name: c.display_name.clone(),
            provider: c.provider.clone(),
        }
    }
}

/// Wire shape of one entry in the `mentions` array sent to the remote session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MentionPayload {
    pub contact_id: String,
    pub contact_name: String,
    pub crm_provider: String,
}

/// A selectable suggestion, read from a pre-rendered list item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub contact_id: String,
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub provider: String,
}

/// Contact ids arrive as strings from some CRMs and as integers from others.
#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
enum ContactId {
    Text(String),
    Number(serde_json::Number),
}

/// Raw `data-contact` payload. Every field is optional here; [`Candidate::parse`]
/// decides what is required.
#[derive(Deserialize, Clone, Debug, Default)]
struct CandidatePayload {
    #[serde(default)]
    id: Option<ContactId>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    firstname: Option<String>,
    #[serde(default)]
    lastname: Option<String>,
    #[serde(default)]
    crm_provider: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Candidate {
    /// Parse the serialized candidate attached to a list item.
    ///
    /// Fails closed: an id and some usable name are required.
    pub fn parse(raw: &str) -> MentionResult<Self> {
        let payload: CandidatePayload = serde_json::from_str(raw).map_err(MentionError::malformed)?;

        let contact_id = match payload.id {
            Some(ContactId::Text(s)) if !s.trim().is_empty() => s,
            Some(ContactId::Number(n)) => n.to_string(),
            _ => return Err(MentionError::malformed("missing id")),
        };

        let first_name = non_empty(payload.firstname);
        let last_name = non_empty(payload.lastname);

        let display_name = match non_empty(payload.display_name) {
            Some(name) => name,
            None => {
                let joined = [first_name.as_deref(), last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                if joined.is_empty() {
                    return Err(MentionError::malformed("missing display_name"));
                }
                joined
            }
        };

        Ok(Self {
            contact_id,
            display_name,
            first_name,
            last_name,
            provider: payload.crm_provider.unwrap_or_default(),
        })
    }
}

/// Serialize the structured mention list the remote session expects.
pub fn mentions_json(tokens: &[MentionToken]) -> String {
    let payload = tokens.iter().map(MentionToken::to_payload).collect::<Vec<_>>();
    serde_json::to_string(&payload).unwrap_or_else(|_| "[]".to_string())
}
