//! Wire format for the request/response boundary.
//!
//! A [`Request`] is a JSON object tagged by `"op"`. Every request produces
//! exactly one [`Response`]: `{"ok": true, "result": ...}` on success or
//! `{"ok": false, "error": {"kind": ..., "message": ...}}` on failure.
//! [`serve`] runs this over newline-delimited JSON.

use std::io::{BufRead, Write};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::entry::Submission;
use crate::error::{Error, ErrorKind, Result};
use crate::member::{Identity, NewMember, Region};
use crate::service::StandupService;
use crate::storage::StandupFilter;

/// One operation on the service.
///
/// `Debug` output never includes a credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Members ordered by name.
    ListMembers {
        /// Only members in this region.
        #[serde(default)]
        region: Option<Region>,
    },
    /// Add a member; returns the new id.
    AddMember(NewMember),
    /// Check a credential; returns the member.
    Authenticate(Identity),
    /// Replace a member's credential.
    ChangeCredential {
        /// Member whose credential changes.
        member_id: i64,
        /// The new secret.
        credential: String,
    },
    /// Raw listing of entries.
    ListStandups(StandupFilter),
    /// Create or overwrite an entry.
    SubmitStandup {
        /// Owning member; required.
        #[serde(default)]
        member_id: Option<i64>,
        /// Day of the entry; defaults to today.
        #[serde(default)]
        date: Option<NaiveDate>,
        /// Work done on the previous day.
        #[serde(default)]
        yesterday: Option<String>,
        /// Work planned for the day.
        #[serde(default)]
        today: Option<String>,
        /// Anything in the way.
        #[serde(default)]
        blockers: Option<String>,
    },
    /// Entries visible to the viewer.
    Query(ViewRequest),
    /// The viewer's own status plus the team's entries.
    Board(ViewRequest),
    /// Distinct regions among members.
    ListRegions,
    /// Store statistics.
    Stats,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListMembers { region } => f
                .debug_struct("ListMembers")
                .field("region", region)
                .finish(),
            Self::AddMember(new) => f.debug_tuple("AddMember").field(new).finish(),
            Self::Authenticate(identity) => f.debug_tuple("Authenticate").field(identity).finish(),
            Self::ChangeCredential { member_id, .. } => f
                .debug_struct("ChangeCredential")
                .field("member_id", member_id)
                .field("credential", &"<redacted>")
                .finish(),
            Self::ListStandups(filter) => f.debug_tuple("ListStandups").field(filter).finish(),
            Self::SubmitStandup {
                member_id,
                date,
                yesterday,
                today,
                blockers,
            } => f
                .debug_struct("SubmitStandup")
                .field("member_id", member_id)
                .field("date", date)
                .field("yesterday", yesterday)
                .field("today", today)
                .field("blockers", blockers)
                .finish(),
            Self::Query(view) => f.debug_tuple("Query").field(view).finish(),
            Self::Board(view) => f.debug_tuple("Board").field(view).finish(),
            Self::ListRegions => f.write_str("ListRegions"),
            Self::Stats => f.write_str("Stats"),
        }
    }
}

/// Arguments shared by the read operations that apply visibility rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRequest {
    /// Who is asking; absent for an anonymous viewer.
    #[serde(default)]
    pub viewer: Option<Identity>,
    /// Day to show; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Only entries from members in this region.
    #[serde(default)]
    pub region: Option<Region>,
}

/// Reply to one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Operation result on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Failure details carried in a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Coarse error class.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl Response {
    /// A successful response.
    #[must_use]
    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    /// A failed response describing `err`.
    #[must_use]
    pub fn failure(err: &Error) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(ErrorBody {
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }

    fn from_result<T: Serialize>(result: Result<T>) -> Self {
        match result.and_then(|value| Ok(serde_json::to_value(value)?)) {
            Ok(value) => Self::success(value),
            Err(err) => Self::failure(&err),
        }
    }
}

impl StandupService {
    /// Execute one request.
    pub fn handle(&self, request: Request) -> Response {
        debug!("Handling {:?}", request);
        match request {
            Request::ListMembers { region } => Response::from_result(self.list_members(region)),
            Request::AddMember(new) => {
                Response::from_result(self.add_member(&new).map(|id| serde_json::json!({"id": id})))
            }
            Request::Authenticate(identity) => Response::from_result(self.authenticate(&identity)),
            Request::ChangeCredential {
                member_id,
                credential,
            } => Response::from_result(
                self.change_credential(member_id, &credential)
                    .map(|()| serde_json::json!({"changed": true})),
            ),
            Request::ListStandups(filter) => Response::from_result(self.list_standups(&filter)),
            Request::SubmitStandup {
                member_id,
                date,
                yesterday,
                today,
                blockers,
            } => {
                let Some(member_id) = member_id else {
                    return Response::failure(&Error::invalid_input("member_id is required"));
                };
                let submission = Submission {
                    member_id,
                    date,
                    yesterday,
                    today,
                    blockers,
                };
                Response::from_result(self.submit(&submission))
            }
            Request::Query(view) => {
                Response::from_result(self.query(view.viewer.as_ref(), view.date, view.region))
            }
            Request::Board(view) => {
                Response::from_result(self.board(view.viewer.as_ref(), view.date, view.region))
            }
            Request::ListRegions => Response::from_result(self.regions()),
            Request::Stats => Response::from_result(self.stats()),
        }
    }

    /// Parse and execute one JSON request line.
    ///
    /// Malformed JSON and unknown operations become `invalid_input` responses.
    pub fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!("Rejected request: {}", e);
                Response::failure(&Error::invalid_input(format!("malformed request: {e}")))
            }
        }
    }
}

/// Serve newline-delimited JSON requests until `input` is exhausted.
///
/// Blank lines are skipped. Each response is written and flushed before the
/// next line is read.
///
/// # Errors
///
/// Returns an error only if reading input or writing output fails.
pub fn serve(service: &StandupService, input: impl BufRead, mut output: impl Write) -> Result<()> {
    let mut handled = 0usize;
    for line in input.lines() {
        let line = line?;
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }

        let response = service.handle_line(raw);
        writeln!(output, "{}", serde_json::to_string(&response)?)?;
        output.flush()?;
        handled += 1;
    }
    debug!("Request stream closed after {} requests", handled);
    Ok(())
}
