//! In-process fake of the FYP backend for integration tests
//!
//! Serves the REST surface the client uses from an in-memory model on an
//! ephemeral port. Every request is recorded so tests can assert on what was
//! (or was not) sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveDateTime};
use fyp_common::config::PortalConfig;
use fyp_common::events::PortalEvent;
use fyp_common::models::{
    ChatMessage, ChatSender, Deadline, Document, DocumentKind, DocumentVersion, Grade, NewGrade,
    NewReview, Notification, NotificationType, Review, UserProfile,
};
use fyp_common::time::{Clock, FixedClock};
use fyp_common::transition::evaluate;
use fyp_common::{Action, DocumentStatus, Role};
use fyp_portal::{MemoryStore, Portal};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "secret";

/// Fixed "now" shared by the backend model and test clocks
pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

#[derive(Default)]
pub struct BackendState {
    pub users: Vec<UserProfile>,
    pub tokens: HashMap<String, UserProfile>,
    pub documents: Vec<Document>,
    pub reviews: Vec<Review>,
    pub grades: Vec<Grade>,
    pub notifications: HashMap<i64, Vec<Notification>>,
    pub deadlines: Vec<Deadline>,
    pub chat: HashMap<i64, Vec<ChatMessage>>,
    pub requests: Vec<Recorded>,
    /// Answer the next non-GET request with this status and body
    pub fail_next_mutation: Option<(StatusCode, Value)>,
    /// Raw bodies served for GET paths, bypassing the model
    pub raw: HashMap<String, String>,
    /// GET paths answered with a 500 once any write has been accepted
    pub fail_reads_after_write: Vec<String>,
    wrote: bool,
    next_id: i64,
}

impl BackendState {
    pub fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        1000 + self.next_id
    }

    pub fn document(&self, id: i64) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn document_mut(&mut self, id: i64) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == id)
    }
}

type Shared = Arc<Mutex<BackendState>>;

pub struct FakeBackend {
    pub base_url: String,
    state: Shared,
    task: JoinHandle<()>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{}/api", addr),
            state,
            task,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state().requests.clone()
    }

    /// Recorded requests matching `method` and `path`
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn add_user(&self, user_id: i64, role: Role, full_name: &str) -> UserProfile {
        let user = UserProfile {
            user_id,
            email: format!("user{}@uni.edu", user_id),
            full_name: full_name.to_string(),
            role,
        };
        self.state().users.push(user.clone());
        user
    }

    pub fn add_document(&self, document: Document) {
        self.state().documents.push(document);
    }

    pub fn config(&self) -> PortalConfig {
        PortalConfig {
            api_base_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(5),
            ..PortalConfig::default()
        }
    }

    /// Portal with nobody signed in, clock fixed at [`t0`]
    pub fn portal(&self) -> Portal {
        self.portal_at(Arc::new(FixedClock::new(t0())))
    }

    pub fn portal_at(&self, clock: Arc<dyn Clock>) -> Portal {
        Portal::with_store(self.config(), Box::new(MemoryStore), clock).unwrap()
    }

    pub async fn signed_in(&self, user: &UserProfile) -> Portal {
        let portal = self.portal();
        portal.api.login(&user.email, PASSWORD).await.unwrap();
        portal
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Next event accepted by `want`, failing the test after five seconds
pub async fn wait_for(
    events: &mut broadcast::Receiver<PortalEvent>,
    want: impl Fn(&PortalEvent) -> bool,
) -> PortalEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if want(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

// ========================================
// Fixtures
// ========================================

pub fn draft(id: i64, student_id: i64, kind: DocumentKind) -> Document {
    let mut doc = Document::new_draft(id, student_id, kind, format!("{} draft", kind.label()), t0());
    doc.created_at = t0() - chrono::Duration::days(2);
    doc
}

pub fn with_status(mut document: Document, status: DocumentStatus, supervisor_id: i64) -> Document {
    document.set_status(status);
    document.supervisor_id = Some(supervisor_id);
    document
}

pub fn notification(id: i64, title: &str) -> Notification {
    Notification {
        id,
        title: title.to_string(),
        message: format!("{} message", title),
        kind: NotificationType::ReviewReceived,
        is_read: false,
        created_at: t0(),
        related_entity_type: None,
        related_entity_id: None,
    }
}

pub fn grade(id: i64, document_id: i64, criterion: &str, score: f64, max_score: f64) -> Grade {
    Grade {
        id,
        document_id,
        evaluator_id: Some(5),
        evaluator_name: None,
        rubric_criteria: criterion.to_string(),
        score,
        max_score,
        feedback: None,
        is_released: false,
        graded_at: Some(t0()),
        released_at: None,
    }
}

pub fn deadline(id: i64, label: &str, kind: Option<DocumentKind>, due: NaiveDateTime) -> Deadline {
    Deadline {
        id,
        deadline_type: label.to_string(),
        document_type: kind,
        due,
        description: None,
        is_active: true,
        created_at: Some(t0() - chrono::Duration::days(30)),
    }
}

// ========================================
// Request handling
// ========================================

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn ok<T: serde::Serialize>(value: &T) -> Response {
    Json(json!(value)).into_response()
}

fn id(segment: &str) -> i64 {
    segment.parse().unwrap_or(-1)
}

/// Text value of a multipart field
fn form_field(body: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{}\"", name);
    let start = body.find(&marker)?;
    let rest = &body[start..];
    let value_start = rest.find("\r\n\r\n")? + 4;
    let value = &rest[value_start..];
    let end = value.find("\r\n--")?;
    Some(value[..end].to_string())
}

fn file_name(body: &str) -> Option<String> {
    let start = body.find("filename=\"")? + "filename=\"".len();
    let end = body[start..].find('"')?;
    Some(body[start..start + end].to_string())
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut st = state.lock().unwrap();
    let path = uri.path().trim_start_matches("/api").to_string();
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let authorization = header_text(header::AUTHORIZATION);
    st.requests.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        authorization: authorization.clone(),
        content_type: header_text(header::CONTENT_TYPE),
        body: body.to_vec(),
    });

    if method == Method::POST && path == "/auth/login" {
        let Ok(credentials) = serde_json::from_slice::<Value>(&body) else {
            return error(StatusCode::BAD_REQUEST, "Malformed login");
        };
        let email = credentials["email"].as_str().unwrap_or_default();
        let password = credentials["password"].as_str().unwrap_or_default();
        let Some(user) = st.users.iter().find(|u| u.email == email).cloned() else {
            return error(StatusCode::BAD_REQUEST, "Invalid email or password");
        };
        if password != PASSWORD {
            return error(StatusCode::BAD_REQUEST, "Invalid email or password");
        }
        let token = format!("token-{}", user.user_id);
        st.tokens.insert(token.clone(), user.clone());
        return ok(&json!({
            "token": token,
            "email": user.email,
            "fullName": user.full_name,
            "role": user.role,
            "userId": user.user_id,
        }));
    }

    let user = match authorization.as_deref().and_then(|a| a.strip_prefix("Bearer ")) {
        None => return error(StatusCode::FORBIDDEN, "Access Denied"),
        Some(token) => match st.tokens.get(token) {
            Some(user) => user.clone(),
            None => return error(StatusCode::UNAUTHORIZED, "Invalid or expired token"),
        },
    };

    if method == Method::GET {
        if st.wrote && st.fail_reads_after_write.contains(&path) {
            return error(StatusCode::INTERNAL_SERVER_ERROR, "Read failed");
        }
        if let Some(raw) = st.raw.get(&path) {
            return ([(header::CONTENT_TYPE, "application/json")], raw.clone()).into_response();
        }
    } else if let Some((status, body)) = st.fail_next_mutation.take() {
        return (status, Json(body)).into_response();
    } else {
        st.wrote = true;
    }

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    route(&mut st, &method, &segments, &query, &body, &user)
}

fn route(
    st: &mut BackendState,
    method: &Method,
    segments: &[&str],
    query: &HashMap<String, String>,
    body: &Bytes,
    user: &UserProfile,
) -> Response {
    let now = t0();
    match (method.as_str(), segments) {
        // Documents
        ("GET", ["documents", "student", student]) => {
            let docs: Vec<&Document> =
                st.documents.iter().filter(|d| d.student_id == id(student)).collect();
            ok(&docs)
        }
        ("GET", ["documents", "supervisor", supervisor]) => {
            let docs: Vec<&Document> = st
                .documents
                .iter()
                .filter(|d| d.supervisor_id == Some(id(supervisor)))
                .collect();
            ok(&docs)
        }
        ("GET", ["documents", "submitted"]) => {
            let docs: Vec<&Document> = st.documents.iter().filter(|d| d.is_submitted).collect();
            ok(&docs)
        }
        ("GET", ["documents", "status", status]) => {
            let docs: Vec<&Document> = st
                .documents
                .iter()
                .filter(|d| d.status.as_str() == *status)
                .collect();
            ok(&docs)
        }
        ("GET", ["documents", doc, "versions"]) => match st.document(id(doc)) {
            Some(d) => {
                let versions: Vec<DocumentVersion> = (1..=d.version)
                    .map(|n| DocumentVersion {
                        id: d.id * 100 + i64::from(n),
                        document_id: d.id,
                        version_number: n,
                        file_name: format!("v{}.pdf", n),
                        file_size: Some(1024),
                        change_description: (n > 1).then(|| format!("revision {}", n)),
                        was_submitted: false,
                        uploaded_at: d.created_at,
                    })
                    .collect();
                ok(&versions)
            }
            None => error(StatusCode::NOT_FOUND, "Document not found"),
        },
        ("GET", ["documents", doc]) => match st.document(id(doc)) {
            Some(d) => ok(d),
            None => error(StatusCode::NOT_FOUND, "Document not found"),
        },
        ("POST", ["documents"]) => {
            let text = String::from_utf8_lossy(body).to_string();
            let kind = form_field(&text, "type").and_then(|k| k.parse::<DocumentKind>().ok());
            let (Some(kind), Some(title)) = (kind, form_field(&text, "title")) else {
                return error(StatusCode::BAD_REQUEST, "type and title are required");
            };
            let student_id = form_field(&text, "studentId").map(|s| id(&s)).unwrap_or(-1);
            let doc_id = st.next_id();
            let mut doc = Document::new_draft(doc_id, student_id, kind, title, now);
            doc.file_name = file_name(&text);
            doc.description = form_field(&text, "description");
            st.documents.push(doc.clone());
            ok(&doc)
        }
        ("POST", ["documents", doc, "submit"]) => {
            let Some(d) = st.document_mut(id(doc)) else {
                return error(StatusCode::NOT_FOUND, "Document not found");
            };
            if d.deadline.is_some_and(|due| now > due) {
                return error(StatusCode::BAD_REQUEST, "Submission deadline has passed");
            }
            match evaluate(d.status, Role::Student, Action::Submit) {
                Ok(next) => {
                    d.set_status(next);
                    d.submitted_at = Some(now);
                    ok(&*d)
                }
                Err(_) => error(StatusCode::BAD_REQUEST, "Document cannot be submitted"),
            }
        }
        ("POST", ["documents", doc, "upload-version"]) => {
            let text = String::from_utf8_lossy(body).to_string();
            let Some(d) = st.document_mut(id(doc)) else {
                return error(StatusCode::NOT_FOUND, "Document not found");
            };
            if !d.status.is_editable() {
                return error(StatusCode::BAD_REQUEST, "Document is locked");
            }
            d.version += 1;
            d.file_name = file_name(&text);
            d.updated_at = Some(now);
            ok(&*d)
        }
        ("PATCH", ["documents", doc, "status"]) => {
            let status = query.get("status").and_then(|s| s.parse::<DocumentStatus>().ok());
            let Some(status) = status else {
                return error(StatusCode::BAD_REQUEST, "Unknown status");
            };
            match st.document_mut(id(doc)) {
                Some(d) => {
                    d.set_status(status);
                    ok(&*d)
                }
                None => error(StatusCode::NOT_FOUND, "Document not found"),
            }
        }

        // Reviews
        ("POST", ["reviews"]) => {
            let Ok(review) = serde_json::from_slice::<NewReview>(body) else {
                return error(StatusCode::BAD_REQUEST, "Malformed review");
            };
            let review_id = st.next_id();
            let Some(d) = st.document_mut(review.document_id) else {
                return error(StatusCode::NOT_FOUND, "Document not found");
            };
            let Ok(next) = evaluate(d.status, user.role, review.decision.action()) else {
                return error(StatusCode::FORBIDDEN, "Not your review stage");
            };
            d.set_status(next);
            let stored = Review {
                id: review_id,
                document_id: review.document_id,
                reviewer_id: Some(user.user_id),
                reviewer_name: Some(user.full_name.clone()),
                reviewer_role: Some(user.role),
                comments: review.comments,
                decision: review.decision,
                review_round: review.review_round,
                reviewed_at: now,
            };
            st.reviews.push(stored.clone());
            ok(&stored)
        }
        ("GET", ["reviews", "document", doc]) => {
            let reviews: Vec<&Review> =
                st.reviews.iter().filter(|r| r.document_id == id(doc)).collect();
            ok(&reviews)
        }

        // Grades
        ("GET", ["grades", "document", doc]) => {
            let grades: Vec<&Grade> = st.grades.iter().filter(|g| g.document_id == id(doc)).collect();
            ok(&grades)
        }
        ("GET", ["grades", "document", doc, "released"]) => {
            let grades: Vec<&Grade> = st
                .grades
                .iter()
                .filter(|g| g.document_id == id(doc) && g.is_released)
                .collect();
            ok(&grades)
        }
        ("POST", ["grades"]) => {
            let Ok(grade) = serde_json::from_slice::<NewGrade>(body) else {
                return error(StatusCode::BAD_REQUEST, "Malformed grade");
            };
            let evaluator_id = query.get("evaluatorId").map(|s| id(s));
            let stored = Grade {
                id: st.next_id(),
                document_id: grade.document_id,
                evaluator_id,
                evaluator_name: Some(user.full_name.clone()),
                rubric_criteria: grade.rubric_criteria,
                score: grade.score,
                max_score: grade.max_score,
                feedback: grade.feedback,
                is_released: false,
                graded_at: Some(now),
                released_at: None,
            };
            st.grades.push(stored.clone());
            ok(&stored)
        }
        ("PUT", ["grades", g]) => {
            let Ok(update) = serde_json::from_slice::<NewGrade>(body) else {
                return error(StatusCode::BAD_REQUEST, "Malformed grade");
            };
            match st.grades.iter_mut().find(|grade| grade.id == id(g)) {
                Some(grade) => {
                    grade.score = update.score;
                    grade.max_score = update.max_score;
                    grade.feedback = update.feedback;
                    ok(&*grade)
                }
                None => error(StatusCode::NOT_FOUND, "Grade not found"),
            }
        }
        ("PATCH", ["grades", "document", doc, "release-all"]) => {
            for g in st.grades.iter_mut().filter(|g| g.document_id == id(doc)) {
                g.is_released = true;
                g.released_at = Some(now);
            }
            StatusCode::OK.into_response()
        }

        // Notifications
        ("GET", ["notifications", "user", u]) => {
            ok(&st.notifications.get(&id(u)).cloned().unwrap_or_default())
        }
        ("GET", ["notifications", "user", u, "unread"]) => {
            let unread: Vec<Notification> = st
                .notifications
                .get(&id(u))
                .map(|all| all.iter().filter(|n| !n.is_read).cloned().collect())
                .unwrap_or_default();
            ok(&unread)
        }
        ("GET", ["notifications", "user", u, "unread-count"]) => {
            let count = st
                .notifications
                .get(&id(u))
                .map(|all| all.iter().filter(|n| !n.is_read).count())
                .unwrap_or(0);
            ok(&json!({ "count": count }))
        }
        ("PATCH", ["notifications", "user", u, "mark-all-read"]) => {
            if let Some(all) = st.notifications.get_mut(&id(u)) {
                all.iter_mut().for_each(|n| n.is_read = true);
            }
            StatusCode::OK.into_response()
        }
        ("PATCH", ["notifications", n, "mark-read"]) => {
            let target = id(n);
            for n in st.notifications.values_mut().flatten() {
                if n.id == target {
                    n.is_read = true;
                }
            }
            StatusCode::OK.into_response()
        }
        ("DELETE", ["notifications", n]) => {
            let target = id(n);
            for all in st.notifications.values_mut() {
                all.retain(|n| n.id != target);
            }
            StatusCode::OK.into_response()
        }

        // Deadlines
        ("GET", ["deadlines", "active"]) => {
            let active: Vec<&Deadline> = st.deadlines.iter().filter(|d| d.is_active).collect();
            ok(&active)
        }
        ("GET", ["deadlines"]) => ok(&st.deadlines),
        ("POST", ["deadlines"]) => {
            let due = query
                .get("deadline")
                .and_then(|d| NaiveDateTime::parse_from_str(d, "%Y-%m-%dT%H:%M:%S").ok());
            let (Some(label), Some(due)) = (query.get("deadlineType"), due) else {
                return error(StatusCode::BAD_REQUEST, "deadlineType and deadline are required");
            };
            let created = Deadline {
                id: st.next_id(),
                deadline_type: label.clone(),
                document_type: query
                    .get("documentType")
                    .and_then(|k| k.parse::<DocumentKind>().ok()),
                due,
                description: query.get("description").cloned(),
                is_active: true,
                created_at: Some(now),
            };
            st.deadlines.push(created.clone());
            ok(&created)
        }
        ("PATCH", ["deadlines", d, "deactivate"]) => {
            if let Some(deadline) = st.deadlines.iter_mut().find(|x| x.id == id(d)) {
                deadline.is_active = false;
            }
            StatusCode::OK.into_response()
        }
        ("DELETE", ["deadlines", d]) => {
            let Some(pos) = st.deadlines.iter().position(|x| x.id == id(d)) else {
                return error(StatusCode::NOT_FOUND, "Deadline not found");
            };
            let removed = st.deadlines.remove(pos);
            if let Some(kind) = removed.linked_kind() {
                st.documents.retain(|doc| doc.kind != Some(kind));
            }
            StatusCode::OK.into_response()
        }

        // Chat
        ("GET", ["chat", "group", g]) => ok(&st.chat.get(&id(g)).cloned().unwrap_or_default()),
        ("POST", ["chat", "send"]) => {
            let group_id = query.get("groupId").map(|g| id(g)).unwrap_or(-1);
            let message_id = st.next_id();
            let message = ChatMessage {
                id: message_id,
                sender: Some(ChatSender {
                    id: user.user_id,
                    full_name: Some(user.full_name.clone()),
                }),
                content: String::from_utf8_lossy(body).to_string(),
                sent_at: now,
            };
            st.chat.entry(group_id).or_default().push(message.clone());
            ok(&message)
        }

        _ => error(StatusCode::NOT_FOUND, "No such endpoint"),
    }
}
