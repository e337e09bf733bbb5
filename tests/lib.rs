//! In-memory stand-in for the CRM REST backend, served on loopback so the
//! real `ApiClient` and page controllers can be exercised end to end.

use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use entity::{
    PaginatedResponse, Resource, account, calendar_event, campaign, carepack, deal, email,
    email_template,
    lead, task, user,
};
use platform_api::{ApiClient, ClientConfig};
use serde_json::{Map, Value, json};
use tokio::{net::TcpListener, task::JoinHandle};
use uuid::Uuid;

#[derive(Default)]
struct Store {
    collections: HashMap<String, Vec<Value>>,
    failures: Vec<(String, u16, String)>,
    rejected_moves: HashSet<String>,
    requests: Vec<String>,
}

#[derive(Clone)]
struct Shared {
    store: Arc<Mutex<Store>>,
    token: Option<String>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Store> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub struct FakeBackend {
    shared: Shared,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl FakeBackend {
    pub async fn start() -> Self {
        Self::start_with_token(None).await
    }

    /// Requests without `Authorization: Bearer <token>` get a 401.
    pub async fn start_with_token(token: Option<&str>) -> Self {
        let shared = Shared {
            store: Arc::default(),
            token: token.map(str::to_string),
        };
        let app = Router::new()
            .route("/api/{collection}", get(list).post(create))
            .route(
                "/api/{collection}/{id}",
                get(read).put(update).delete(remove).post(upload),
            )
            .route("/api/{collection}/{id}/{action}", post(action).patch(action))
            .layer(middleware::from_fn_with_state(shared.clone(), gate))
            .with_state(shared.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            shared,
            addr,
            server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn client(&self) -> ApiClient {
        self.client_with_token(self.shared.token.clone())
    }

    pub fn client_with_token(&self, token: Option<String>) -> ApiClient {
        let config = ClientConfig::new(&self.base_url())
            .expect("loopback url")
            .with_token(token);
        ApiClient::new(config).expect("http client")
    }

    pub fn insert<R: Resource>(&self, record: &R) {
        let value = serde_json::to_value(record).expect("record serializes");
        self.shared
            .lock()
            .collections
            .entry(R::PATH.to_string())
            .or_default()
            .push(value);
    }

    pub fn insert_all<R: Resource>(&self, records: &[R]) {
        for record in records {
            self.insert(record);
        }
    }

    pub fn records<R: Resource>(&self) -> Vec<R> {
        self.shared
            .lock()
            .collections
            .get(R::PATH)
            .map(|values| {
                values
                    .iter()
                    .map(|v| serde_json::from_value(v.clone()).expect("stored record decodes"))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn find<R: Resource>(&self, id: Uuid) -> Option<R> {
        self.records::<R>().into_iter().find(|r| r.id() == id)
    }

    /// Every request whose path starts with `/api/<prefix>` answers with
    /// `status` and `body` until [`FakeBackend::recover`] is called.
    pub fn fail(&self, prefix: &str, status: u16, body: &str) {
        self.shared
            .lock()
            .failures
            .push((format!("/api/{prefix}"), status, body.to_string()));
    }

    pub fn recover(&self) {
        self.shared.lock().failures.clear();
    }

    /// Card moves into `status` are refused with a 422.
    pub fn reject_moves_to(&self, status: &str) {
        self.shared.lock().rejected_moves.insert(status.to_string());
    }

    /// `METHOD /path?query` for every request served so far.
    pub fn requests(&self) -> Vec<String> {
        self.shared.lock().requests.clone()
    }

    pub fn request_count(&self, prefix: &str) -> usize {
        self.requests().iter().filter(|r| r.starts_with(prefix)).count()
    }
}

async fn gate(State(shared): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let line = match request.uri().query() {
        Some(query) => format!("{} {path}?{query}", request.method()),
        None => format!("{} {path}", request.method()),
    };
    {
        let mut store = shared.lock();
        store.requests.push(line);
        let failure = store
            .failures
            .iter()
            .find(|(prefix, _, _)| path.starts_with(prefix.as_str()))
            .cloned();
        if let Some((_, status, body)) = failure {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, body).into_response();
        }
    }
    if let Some(token) = &shared.token {
        let expected = format!("Bearer {token}");
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
        }
    }
    next.run(request).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn text(record: &Value, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn status_key(collection: &str) -> &'static str {
    if collection == "deals" { "stage" } else { "status" }
}

fn defaults(collection: &str) -> &'static [(&'static str, &'static str)] {
    match collection {
        "accounts" => &[("status", "prospect")],
        "leads" => &[("status", "new")],
        "deals" => &[("stage", "new")],
        "tasks" => &[("status", "open"), ("priority", "medium")],
        "emails" => &[("status", "draft")],
        "carepacks" => &[("status", "pending")],
        "users" => &[("role", "sales")],
        _ => &[],
    }
}

fn stamp(collection: &str, mut fields: Map<String, Value>) -> Value {
    let now = Utc::now().to_rfc3339();
    fields.insert("id".into(), json!(Uuid::new_v4()));
    fields.insert("created_at".into(), json!(now));
    fields.insert("updated_at".into(), json!(now));
    for (key, value) in defaults(collection) {
        fields.entry(key.to_string()).or_insert_with(|| json!(value));
    }
    Value::Object(fields)
}

fn page_of(all: &[Value], query: &HashMap<String, String>) -> Response {
    let page = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let page_size = query.get("page_size").and_then(|p| p.parse().ok()).unwrap_or(20);
    Json(PaginatedResponse::slice(all, page, page_size)).into_response()
}

const RESERVED: &[&str] = &["page", "page_size", "search", "sort"];

async fn list(
    State(shared): State<Shared>,
    Path(collection): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let store = shared.lock();
    let all = store.collections.get(&collection).cloned().unwrap_or_default();
    if collection == calendar_event::Model::PATH && query.contains_key("from") {
        let bound = |key: &str| {
            query
                .get(key)
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|t| t.with_timezone(&Utc))
        };
        let (Some(from), Some(to)) = (bound("from"), bound("to")) else {
            return detail(StatusCode::UNPROCESSABLE_ENTITY, "from and to must be RFC 3339");
        };
        let events: Vec<Value> = all
            .into_iter()
            .filter(|event| {
                let at = |key: &str| {
                    DateTime::parse_from_rfc3339(&text(event, key))
                        .map(|t| t.with_timezone(&Utc))
                        .ok()
                };
                matches!((at("starts_at"), at("ends_at")), (Some(s), Some(e)) if s < to && e > from)
            })
            .collect();
        return Json(events).into_response();
    }
    let search = query.get("search").map(|s| s.to_lowercase());
    let mut rows: Vec<Value> = all
        .into_iter()
        .filter(|record| {
            let hit = search.as_ref().is_none_or(|needle| {
                ["name", "title", "subject", "email"]
                    .iter()
                    .any(|key| text(record, key).to_lowercase().contains(needle.as_str()))
            });
            hit && query
                .iter()
                .filter(|(key, _)| !RESERVED.contains(&key.as_str()))
                .all(|(key, value)| text(record, key) == *value)
        })
        .collect();
    if let Some(sort) = query.get("sort") {
        let (key, descending) = match sort.strip_prefix('-') {
            Some(key) => (key, true),
            None => (sort.as_str(), false),
        };
        rows.sort_by_key(|record| text(record, key));
        if descending {
            rows.reverse();
        }
    }
    page_of(&rows, &query)
}

async fn read(
    State(shared): State<Shared>,
    Path((collection, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let store = shared.lock();
    if collection == "bulk-export" {
        let rows = store.collections.get(&id).cloned().unwrap_or_default();
        let mut out = String::from("id,name\n");
        for row in &rows {
            let name = match text(row, "name") {
                name if name.is_empty() => text(row, "title"),
                name => name,
            };
            out.push_str(&format!("{},{}\n", text(row, "id"), name));
        }
        return ([(header::CONTENT_TYPE, "text/csv")], out).into_response();
    }
    let all = store.collections.get(&collection).cloned().unwrap_or_default();
    match id.as_str() {
        "all" => Json(all).into_response(),
        "kanban" => {
            let Some(status) = query.get("status") else {
                return detail(StatusCode::UNPROCESSABLE_ENTITY, "status is required");
            };
            let key = status_key(&collection);
            let column: Vec<Value> = all
                .into_iter()
                .filter(|record| text(record, key) == *status)
                .collect();
            page_of(&column, &query)
        }
        "expiring" => {
            let days: i64 = query.get("days").and_then(|d| d.parse().ok()).unwrap_or(30);
            let today = Utc::now().date_naive();
            let horizon = today + Duration::days(days);
            let packs: Vec<Value> = all
                .into_iter()
                .filter(|pack| {
                    let active = !matches!(text(pack, "status").as_str(), "expired" | "cancelled");
                    let ends = NaiveDate::parse_from_str(&text(pack, "end_date"), "%Y-%m-%d").ok();
                    active && ends.is_some_and(|end| end >= today && end <= horizon)
                })
                .collect();
            Json(packs).into_response()
        }
        raw => {
            let found = Uuid::parse_str(raw)
                .ok()
                .and_then(|id| all.into_iter().find(|r| text(r, "id") == id.to_string()));
            match found {
                Some(record) => Json(record).into_response(),
                None => detail(StatusCode::NOT_FOUND, "Not found"),
            }
        }
    }
}

fn blank_required(collection: &str, body: &Map<String, Value>) -> Option<Response> {
    let field = match collection {
        "deals" | "tasks" | "calendar-events" => "title",
        "emails" => "to",
        "users" => "email",
        _ => "name",
    };
    let blank = body
        .get(field)
        .and_then(Value::as_str)
        .is_none_or(|v| v.trim().is_empty());
    blank.then(|| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["body", field], "msg": "field required" }] })),
        )
            .into_response()
    })
}

async fn create(
    State(shared): State<Shared>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Value::Object(fields) = body else {
        return detail(StatusCode::BAD_REQUEST, "expected an object");
    };
    if let Some(rejection) = blank_required(&collection, &fields) {
        return rejection;
    }
    let record = stamp(&collection, fields);
    shared
        .lock()
        .collections
        .entry(collection)
        .or_default()
        .push(record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn update(
    State(shared): State<Shared>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let Value::Object(fields) = body else {
        return detail(StatusCode::BAD_REQUEST, "expected an object");
    };
    if let Some(rejection) = blank_required(&collection, &fields) {
        return rejection;
    }
    let mut store = shared.lock();
    let rows = store.collections.entry(collection).or_default();
    let Some(record) = rows.iter_mut().find(|r| text(r, "id") == id) else {
        return detail(StatusCode::NOT_FOUND, "Not found");
    };
    if let Value::Object(existing) = &mut *record {
        for (key, value) in fields {
            existing.insert(key, value);
        }
        existing.insert("updated_at".into(), json!(Utc::now().to_rfc3339()));
    }
    Json(record.clone()).into_response()
}

async fn remove(
    State(shared): State<Shared>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let mut store = shared.lock();
    let rows = store.collections.entry(collection).or_default();
    let before = rows.len();
    rows.retain(|r| text(r, "id") != id);
    if rows.len() == before {
        return detail(StatusCode::NOT_FOUND, "Not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

/// `POST /bulk-import/{entity}`: naive comma split, first column required.
async fn upload(
    State(shared): State<Shared>,
    Path((collection, entity)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    if collection != "bulk-import" {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let dry_run = query.get("dry_run").is_some_and(|v| v == "true");
    let mut lines = body.lines().filter(|l| !l.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return detail(StatusCode::BAD_REQUEST, "empty file");
    };
    let headers: Vec<String> = header_line
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .collect();
    let mut imported = Vec::new();
    let mut errors = Vec::new();
    let mut total = 0u32;
    for (index, line) in lines.enumerate() {
        total += 1;
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        if cells.first().is_none_or(|c| c.is_empty()) {
            errors.push(json!({
                "row": index + 1,
                "field": headers.first(),
                "message": "value is required",
            }));
            continue;
        }
        let fields: Map<String, Value> = headers
            .iter()
            .zip(cells)
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(key, cell)| (key.clone(), json!(cell)))
            .collect();
        imported.push(stamp(&entity, fields));
    }
    let report = json!({
        "total_rows": total,
        "imported": imported.len(),
        "failed": errors.len(),
        "dry_run": dry_run,
        "errors": errors,
    });
    if !dry_run {
        shared
            .lock()
            .collections
            .entry(entity)
            .or_default()
            .extend(imported);
    }
    Json(report).into_response()
}

async fn action(
    State(shared): State<Shared>,
    Path((collection, id, action)): Path<(String, String, String)>,
    body: String,
) -> Response {
    let mut store = shared.lock();
    match action.as_str() {
        "send" => {
            let rows = store.collections.entry(collection).or_default();
            let Some(record) = rows.iter_mut().find(|r| text(r, "id") == id) else {
                return detail(StatusCode::NOT_FOUND, "Not found");
            };
            if text(record, "status") == "sent" {
                return detail(StatusCode::CONFLICT, "Email already sent");
            }
            if let Value::Object(fields) = &mut *record {
                fields.insert("status".into(), json!("sent"));
                fields.insert("sent_at".into(), json!(Utc::now().to_rfc3339()));
            }
            Json(record.clone()).into_response()
        }
        "move" => {
            let Ok(request) = serde_json::from_str::<Value>(&body) else {
                return detail(StatusCode::BAD_REQUEST, "expected a json body");
            };
            let status = text(&request, "status");
            let position = request.get("position").and_then(Value::as_u64).unwrap_or(0) as usize;
            if store.rejected_moves.contains(&status) {
                return detail(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    &format!("cannot move to {status}"),
                );
            }
            let key = status_key(&collection);
            let rows = store.collections.entry(collection).or_default();
            let Some(index) = rows.iter().position(|r| text(r, "id") == id) else {
                return detail(StatusCode::NOT_FOUND, "Not found");
            };
            let mut record = rows.remove(index);
            if let Value::Object(fields) = &mut record {
                fields.insert(key.into(), json!(status));
                fields.insert("updated_at".into(), json!(Utc::now().to_rfc3339()));
            }
            let slot = rows
                .iter()
                .enumerate()
                .filter(|(_, r)| text(r, key) == status)
                .map(|(i, _)| i)
                .nth(position)
                .unwrap_or(rows.len());
            rows.insert(slot, record.clone());
            Json(record).into_response()
        }
        _ => detail(StatusCode::NOT_FOUND, "Not found"),
    }
}

// Record builders for seeding the backend.

pub fn account(name: &str, status: account::Status) -> account::Model {
    let now = Utc::now();
    account::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        industry: None,
        website: None,
        phone: None,
        email: None,
        status,
        annual_revenue_cents: None,
        currency: None,
        owner_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn user(email: &str, name: &str) -> user::Model {
    user::Model {
        id: Uuid::new_v4(),
        email: email.to_string(),
        display_name: Some(name.to_string()),
        role: user::Role::Sales,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn lead(name: &str, status: lead::Status, value_cents: Option<i64>) -> lead::Model {
    let now = Utc::now();
    lead::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        company: None,
        email: None,
        phone: None,
        source: None,
        status,
        value_cents,
        owner_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn deal(title: &str, stage: deal::Stage, amount_cents: i64) -> deal::Model {
    let now = Utc::now();
    deal::Model {
        id: Uuid::new_v4(),
        title: title.to_string(),
        account_id: None,
        amount_cents: Some(amount_cents),
        currency: Some("EUR".into()),
        stage,
        close_date: None,
        owner_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn task(title: &str, status: task::Status) -> task::Model {
    let now = Utc::now();
    task::Model {
        id: Uuid::new_v4(),
        title: title.to_string(),
        notes: None,
        status,
        priority: task::Priority::Medium,
        due_at: None,
        assigned_user_id: None,
        account_id: None,
        deal_id: None,
        lead_id: None,
        completed_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// An active carepack ending `ends_in_days` from today.
pub fn carepack(name: &str, ends_in_days: i64) -> carepack::Model {
    let now = Utc::now();
    let today = now.date_naive();
    carepack::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        account_id: None,
        product_id: None,
        serial_number: None,
        start_date: today - Duration::days(365),
        end_date: today + Duration::days(ends_in_days),
        status: carepack::Status::Active,
        price_cents: None,
        currency: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn email(to: &str, subject: &str, status: email::Status) -> email::Model {
    email::Model {
        id: Uuid::new_v4(),
        to: to.to_string(),
        cc: Vec::new(),
        subject: subject.to_string(),
        body: String::new(),
        status,
        template_id: None,
        account_id: None,
        lead_id: None,
        sent_at: None,
        created_at: Utc::now(),
    }
}

pub fn template(name: &str, subject: &str, body: &str) -> email_template::Model {
    let now = Utc::now();
    email_template::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn event(title: &str, starts_at: DateTime<Utc>, minutes: i64) -> calendar_event::Model {
    calendar_event::Model {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        location: None,
        starts_at,
        ends_at: starts_at + Duration::minutes(minutes),
        kind: calendar_event::Kind::Meeting,
        attendees: Vec::new(),
        account_id: None,
        deal_id: None,
        created_at: Utc::now(),
    }
}

pub fn campaign(
    name: &str,
    status: campaign::Status,
    sent: u64,
    opens: u64,
    clicks: u64,
) -> campaign::Model {
    campaign::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        status,
        channel: Some("email".into()),
        budget_cents: None,
        starts_on: None,
        ends_on: None,
        sent_count: sent,
        open_count: opens,
        click_count: clicks,
        created_at: Utc::now(),
    }
}
