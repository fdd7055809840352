use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Result document returned by the SQL execution service. Its schema belongs
/// to that service and is passed through untouched.
pub type QueryResult = Value;

/// A SQL statement together with the fields and datasets it touches, which the
/// authorization service uses to evaluate entitlements.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Query {
    /// The SQL statement to execute
    pub sql: String,
    /// Fields (columns) referenced by the statement
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    /// Datasets (tables) referenced by the statement
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datasets: Vec<String>,
    /// Bound parameters or any additional input the servers expect
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            fields: Vec::new(),
            datasets: Vec::new(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_datasets<I, S>(mut self, datasets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.datasets = datasets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// The keyed document sent as the body of both the validation and the
    /// execution request.
    pub fn to_document(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(document) => Ok(document),
            // A struct always serializes to an object
            other => Err(serde::ser::Error::custom(format!(
                "query serialized to a non-object value: {other}"
            ))),
        }
    }
}

/// Wire shape of a successful validation response.
#[derive(Debug, Deserialize)]
struct DecisionBody {
    /// Outer `None` when the flag is absent, `Some(None)` when it is `null`
    #[serde(
        default,
        alias = "allowed",
        alias = "allow",
        deserialize_with = "present_flag"
    )]
    approved: Option<Option<bool>>,
    #[serde(default)]
    reason: Option<Value>,
    #[serde(flatten)]
    details: Map<String, Value>,
}

fn present_flag<'de, D>(deserializer: D) -> Result<Option<Option<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(Some)
}

/// The authorization service's judgment on a query.
///
/// Any field other than the approval flag and the reason is kept verbatim in
/// `details`.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizationDecision {
    Approved {
        details: Map<String, Value>,
    },
    Denied {
        reason: Option<String>,
        details: Map<String, Value>,
    },
}

impl AuthorizationDecision {
    /// Parse the body of a 2xx validation response.
    ///
    /// A body without an approval flag counts as an approval unless
    /// `require_explicit_approval` is set, in which case it is a denial. A flag
    /// that is present but `null` is always a denial.
    pub fn from_body(
        body: &[u8],
        require_explicit_approval: bool,
    ) -> Result<Self, serde_json::Error> {
        let decision = if body.iter().all(u8::is_ascii_whitespace) {
            DecisionBody {
                approved: None,
                reason: None,
                details: Map::new(),
            }
        } else {
            serde_json::from_slice::<DecisionBody>(body)?
        };

        let reason = decision.reason.map(|reason| match reason {
            Value::String(s) => s,
            other => other.to_string(),
        });

        Ok(match decision.approved {
            Some(Some(true)) => AuthorizationDecision::Approved {
                details: decision.details,
            },
            None if !require_explicit_approval => AuthorizationDecision::Approved {
                details: decision.details,
            },
            Some(Some(false)) => AuthorizationDecision::Denied {
                reason,
                details: decision.details,
            },
            Some(None) => AuthorizationDecision::Denied {
                reason: reason
                    .or_else(|| Some("authorization response carried a null approval".to_string())),
                details: decision.details,
            },
            None => AuthorizationDecision::Denied {
                reason: reason
                    .or_else(|| Some("authorization response carried no approval".to_string())),
                details: decision.details,
            },
        })
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, AuthorizationDecision::Approved { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            AuthorizationDecision::Approved { .. } => None,
            AuthorizationDecision::Denied { reason, .. } => reason.as_deref(),
        }
    }

    pub fn details(&self) -> &Map<String, Value> {
        match self {
            AuthorizationDecision::Approved { details }
            | AuthorizationDecision::Denied { details, .. } => details,
        }
    }
}

impl Serialize for AuthorizationDecision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let details = self.details();
        let reason = self.reason();
        let len = 1 + usize::from(reason.is_some()) + details.len();

        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("approved", &self.is_approved())?;
        if let Some(reason) = reason {
            map.serialize_entry("reason", reason)?;
        }
        for (key, value) in details {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
