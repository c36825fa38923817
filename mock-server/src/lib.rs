use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Token every request must carry in `Authorization`.
pub const TOKEN: &str = "Wolke mock-token";

pub const ACCOUNT: &str = "mock-account";

/// Id of a hidden image owned by another account.
pub const PRIVATE_IMAGE: &str = "private-image";

const NOT_FOUND: &str = "No image found for your query";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
    pub hidden: bool,
    pub user: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub base_type: String,
    pub nsfw: bool,
    pub file_type: String,
    pub mime_type: String,
    pub tags: Vec<Tag>,
    pub url: String,
    pub hidden: bool,
    pub source: Option<String>,
    pub account: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub bot_id: String,
    pub reputation: i64,
    pub account_id: String,
    pub cooldown: Vec<DateTime<Utc>>,
    pub given_reputation: Vec<DateTime<Utc>>,
    pub available_reputations: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationSettings {
    pub reputation_per_day: u32,
    pub maximum_reputation: u32,
    pub maximum_reputation_received_day: u32,
    pub reputation_cooldown: u64,
    #[serde(default)]
    pub account_id: String,
}

impl Default for ReputationSettings {
    fn default() -> Self {
        Self {
            reputation_per_day: 2,
            maximum_reputation: 0,
            maximum_reputation_received_day: 0,
            reputation_cooldown: 86400,
            account_id: ACCOUNT.to_string(),
        }
    }
}

pub struct Store {
    pub images: HashMap<String, Image>,
    pub users: HashMap<(String, String), User>,
    pub settings: ReputationSettings,
    pub bot_settings: HashMap<(String, String), Value>,
}

impl Default for Store {
    fn default() -> Self {
        let private = Image {
            id: PRIVATE_IMAGE.to_string(),
            kind: "hug".to_string(),
            base_type: "hug".to_string(),
            nsfw: false,
            file_type: "png".to_string(),
            mime_type: "image/png".to_string(),
            tags: Vec::new(),
            url: format!("https://cdn.weeb.sh/images/{PRIVATE_IMAGE}.png"),
            hidden: true,
            source: None,
            account: "other-account".to_string(),
        };
        Self {
            images: HashMap::from([(PRIVATE_IMAGE.to_string(), private)]),
            users: HashMap::new(),
            settings: ReputationSettings::default(),
            bot_settings: HashMap::new(),
        }
    }
}

/// Whether `image` shows up for this account's queries.
fn visible(image: &Image) -> bool {
    !image.hidden || image.account == ACCOUNT
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Deserialize)]
pub struct UrlUpload {
    pub url: String,
    #[serde(rename = "baseType")]
    pub base_type: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nsfw: bool,
    pub source: Option<String>,
}

#[derive(Deserialize)]
pub struct TagsBody {
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct GiveBody {
    pub source_user: String,
}

/// A JSON error body in the service's format.
fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"status": status.as_u16(), "message": message}))).into_response()
}

fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(TOKEN) => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Unauthorized")),
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/images/upload", post(upload))
        .route("/images/types", get(types))
        .route("/images/tags", get(tags))
        .route("/images/random", get(random))
        .route("/images/list", get(list))
        .route(
            "/images/info/{id}",
            get(image_info).post(add_tags).delete(remove_tags_or_image),
        )
        .route("/auto-image/generate", get(generate))
        .route("/reputation/settings", get(get_settings).post(set_settings))
        .route("/reputation/{bot}/{user}", get(get_user).post(give))
        .route("/reputation/{bot}/{user}/increase", post(increase))
        .route("/reputation/{bot}/{user}/decrease", post(decrease))
        .route("/reputation/{bot}/{user}/reset", post(reset))
        .route(
            "/settings/{kind}/{id}",
            get(get_setting).post(set_setting).delete(delete_setting),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- images ---

/// Extensions the service accepts, with their mime types.
const MIME_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
];

fn unsupported(what: &str) -> Response {
    error(
        StatusCode::BAD_REQUEST,
        &format!("The mimetype of {what} is not supported"),
    )
}

/// An upload after its body has been parsed, whichever form it came in.
#[derive(Default)]
struct NewImage {
    base_type: String,
    file_type: String,
    mime_type: String,
    hidden: bool,
    nsfw: bool,
    tags: Vec<String>,
    source: Option<String>,
}

/// Accepts a JSON `{url, baseType, ...}` body or a `multipart/form-data`
/// body with a `file` part.
async fn upload(State(db): State<Db>, request: Request) -> Response {
    if let Err(resp) = authorize(request.headers()) {
        return resp;
    }
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    let parsed = if is_form {
        form_upload(request, &db).await
    } else {
        url_upload(request, &db).await
    };
    match parsed {
        Ok(input) => store_image(&db, input).await,
        Err(resp) => resp,
    }
}

async fn url_upload(request: Request, db: &Db) -> Result<NewImage, Response> {
    let Json(input) = Json::<UrlUpload>::from_request(request, db)
        .await
        .map_err(|e| error(e.status(), &e.body_text()))?;
    let file_type = input.url.rsplit('.').next().unwrap_or_default().to_string();
    let Some((_, mime_type)) = MIME_TYPES.iter().find(|(ext, _)| *ext == file_type) else {
        return Err(unsupported(&file_type));
    };
    Ok(NewImage {
        base_type: input.base_type,
        file_type,
        mime_type: mime_type.to_string(),
        hidden: input.hidden,
        nsfw: input.nsfw,
        tags: input.tags,
        source: input.source,
    })
}

fn multipart_error(e: MultipartError) -> Response {
    error(e.status(), &e.body_text())
}

async fn form_upload(request: Request, db: &Db) -> Result<NewImage, Response> {
    let mut multipart = Multipart::from_request(request, db)
        .await
        .map_err(|e| error(e.status(), &e.body_text()))?;
    let mut input = NewImage::default();
    let mut file_mime = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let mime = field.content_type().unwrap_or("application/octet-stream").to_string();
            if field.bytes().await.map_err(multipart_error)?.is_empty() {
                return Err(error(StatusCode::BAD_REQUEST, "The file is empty"));
            }
            file_mime = Some(mime);
            continue;
        }
        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            "baseType" => input.base_type = value,
            "hidden" => input.hidden = value == "true",
            "nsfw" => input.nsfw = value == "true",
            "tags" => {
                input.tags = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            "source" => input.source = Some(value),
            _ => {}
        }
    }

    let Some(mime_type) = file_mime else {
        return Err(error(StatusCode::BAD_REQUEST, "Missing file"));
    };
    if input.base_type.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Missing baseType"));
    }
    let Some((ext, _)) = MIME_TYPES.iter().find(|(_, mime)| *mime == mime_type) else {
        return Err(unsupported(&mime_type));
    };
    input.file_type = ext.to_string();
    input.mime_type = mime_type;
    Ok(input)
}

async fn store_image(db: &Db, input: NewImage) -> Response {
    let id = Uuid::new_v4().simple().to_string();
    let image = Image {
        url: format!("https://cdn.weeb.sh/images/{id}.{}", input.file_type),
        id: id.clone(),
        kind: input.base_type.clone(),
        base_type: input.base_type,
        nsfw: input.nsfw,
        file_type: input.file_type,
        mime_type: input.mime_type,
        tags: input
            .tags
            .into_iter()
            .map(|name| Tag {
                name,
                hidden: false,
                user: ACCOUNT.to_string(),
            })
            .collect(),
        hidden: input.hidden,
        source: input.source,
        account: ACCOUNT.to_string(),
    };
    db.write().await.images.insert(id, image.clone());
    Json(json!({"status": 200, "file": image})).into_response()
}

async fn types(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let store = db.read().await;
    let mut types: Vec<String> = store
        .images
        .values()
        .filter(|i| visible(i))
        .map(|i| i.kind.clone())
        .collect();
    types.sort();
    types.dedup();
    Json(json!({"status": 200, "types": types})).into_response()
}

async fn tags(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let store = db.read().await;
    let mut tags: Vec<String> = store
        .images
        .values()
        .filter(|i| visible(i))
        .flat_map(|i| i.tags.iter().map(|t| t.name.clone()))
        .collect();
    tags.sort();
    tags.dedup();
    Json(json!({"status": 200, "tags": tags})).into_response()
}

fn matches_filter(image: &Image, params: &HashMap<String, String>) -> bool {
    if !visible(image) {
        return false;
    }
    if let Some(kind) = params.get("type") {
        if &image.kind != kind {
            return false;
        }
    }
    if let Some(tags) = params.get("tags") {
        if !tags
            .split(',')
            .all(|wanted| image.tags.iter().any(|t| t.name == wanted))
        {
            return false;
        }
    }
    match params.get("nsfw").map(String::as_str) {
        Some("only") => image.nsfw,
        Some("true") => true,
        _ => !image.nsfw,
    }
}

async fn random(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let store = db.read().await;
    let mut candidates: Vec<&Image> = store.images.values().filter(|i| matches_filter(i, &params)).collect();
    candidates.sort_by(|a, b| a.id.cmp(&b.id));
    match candidates.first() {
        Some(image) => {
            let mut body = serde_json::to_value(image).unwrap_or_default();
            body["status"] = json!(200);
            Json(body).into_response()
        }
        None => error(StatusCode::BAD_REQUEST, NOT_FOUND),
    }
}

async fn list(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let store = db.read().await;
    let mut images: Vec<Image> = store
        .images
        .values()
        .filter(|i| matches_filter(i, &params))
        .cloned()
        .collect();
    images.sort_by(|a, b| a.id.cmp(&b.id));
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    Json(json!({"status": 200, "page": page, "images": images})).into_response()
}

async fn image_info(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    match db.read().await.images.get(&id) {
        Some(image) if !visible(image) => {
            error(StatusCode::BAD_REQUEST, "This image is private")
        }
        Some(image) => {
            let mut body = serde_json::to_value(image).unwrap_or_default();
            body["status"] = json!(200);
            Json(body).into_response()
        }
        None => error(StatusCode::BAD_REQUEST, NOT_FOUND),
    }
}

async fn add_tags(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<TagsBody>,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let mut store = db.write().await;
    let Some(image) = store.images.get_mut(&id) else {
        return error(StatusCode::BAD_REQUEST, NOT_FOUND);
    };
    let new: Vec<String> = input
        .tags
        .into_iter()
        .filter(|name| !name.is_empty() && !image.tags.iter().any(|t| &t.name == name))
        .collect();
    if new.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Tags existed already or had no content");
    }
    image.tags.extend(new.iter().map(|name| Tag {
        name: name.clone(),
        hidden: false,
        user: ACCOUNT.to_string(),
    }));
    Json(json!({"status": 200, "image": image, "tags": new})).into_response()
}

/// With a `{"tags": [...]}` body removes those tags; without one deletes
/// the image.
async fn remove_tags_or_image(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: axum::body::Bytes,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let mut store = db.write().await;
    if body.is_empty() {
        return match store.images.remove(&id) {
            Some(image) => Json(json!({"status": 200, "image": image})).into_response(),
            None => error(StatusCode::BAD_REQUEST, NOT_FOUND),
        };
    }
    let Ok(input) = serde_json::from_slice::<TagsBody>(&body) else {
        return error(StatusCode::BAD_REQUEST, "Invalid body");
    };
    let Some(image) = store.images.get_mut(&id) else {
        return error(StatusCode::BAD_REQUEST, NOT_FOUND);
    };
    image.tags.retain(|t| !input.tags.contains(&t.name));
    Json(json!({"status": 200, "image": image})).into_response()
}

// --- auto-image ---

/// Smallest valid PNG header followed by the requested type.
async fn generate(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let Some(kind) = params.get("type") else {
        return error(StatusCode::BAD_REQUEST, "Missing type");
    };
    let mut body = b"\x89PNG\r\n\x1a\n".to_vec();
    body.extend_from_slice(kind.as_bytes());
    ([(header::CONTENT_TYPE, "image/png")], body).into_response()
}

// --- reputation ---

fn fresh_user(bot: &str, user: &str) -> User {
    User {
        user_id: user.to_string(),
        bot_id: bot.to_string(),
        reputation: 0,
        account_id: ACCOUNT.to_string(),
        cooldown: Vec::new(),
        given_reputation: Vec::new(),
        available_reputations: ReputationSettings::default().reputation_per_day,
    }
}

fn user_entry<'a>(store: &'a mut Store, bot: &str, user: &str) -> &'a mut User {
    store
        .users
        .entry((bot.to_string(), user.to_string()))
        .or_insert_with(|| fresh_user(bot, user))
}

async fn get_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((bot, user)): Path<(String, String)>,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let mut store = db.write().await;
    let user = user_entry(&mut store, &bot, &user).clone();
    Json(json!({"status": 200, "user": user})).into_response()
}

async fn give(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((bot, target)): Path<(String, String)>,
    Json(input): Json<GiveBody>,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    if input.source_user == target {
        return error(StatusCode::BAD_REQUEST, "You can't give reputation to yourself");
    }
    let now = Utc::now();
    let mut store = db.write().await;
    let source = user_entry(&mut store, &bot, &input.source_user);
    if source.available_reputations == 0 {
        return error(StatusCode::FORBIDDEN, "This user has no reputation left to give");
    }
    source.available_reputations -= 1;
    source.cooldown.push(now);
    let source = source.clone();

    let target = user_entry(&mut store, &bot, &target);
    target.reputation += 1;
    target.given_reputation.push(now);
    let target = target.clone();

    Json(json!({"status": 200, "sourceUser": source, "targetUser": target})).into_response()
}

#[derive(Deserialize)]
pub struct AmountBody {
    #[serde(alias = "decrease")]
    pub increase: i64,
}

async fn increase(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((bot, user)): Path<(String, String)>,
    Json(input): Json<AmountBody>,
) -> Response {
    adjust(db, headers, bot, user, input.increase).await
}

async fn decrease(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((bot, user)): Path<(String, String)>,
    Json(input): Json<AmountBody>,
) -> Response {
    adjust(db, headers, bot, user, -input.increase).await
}

async fn adjust(db: Db, headers: HeaderMap, bot: String, user: String, delta: i64) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let mut store = db.write().await;
    let user = user_entry(&mut store, &bot, &user);
    user.reputation += delta;
    let user = user.clone();
    Json(json!({"status": 200, "user": user})).into_response()
}

#[derive(Deserialize)]
pub struct ResetBody {
    #[serde(default)]
    pub cooldown: bool,
}

async fn reset(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((bot, user)): Path<(String, String)>,
    Json(input): Json<ResetBody>,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let mut store = db.write().await;
    let user = user_entry(&mut store, &bot, &user);
    user.reputation = 0;
    if input.cooldown {
        user.cooldown.clear();
        user.available_reputations = ReputationSettings::default().reputation_per_day;
    }
    let user = user.clone();
    Json(json!({"status": 200, "user": user})).into_response()
}

async fn get_settings(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let settings = db.read().await.settings.clone();
    Json(json!({"status": 200, "settings": settings})).into_response()
}

async fn set_settings(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(mut input): Json<ReputationSettings>,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    input.account_id = ACCOUNT.to_string();
    db.write().await.settings = input.clone();
    Json(json!({"status": 200, "settings": input})).into_response()
}

// --- bot settings ---

fn setting_body(kind: &str, id: &str, data: &Value) -> Value {
    json!({"type": kind, "id": id, "data": data, "accountId": ACCOUNT})
}

async fn get_setting(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    match db.read().await.bot_settings.get(&(kind.clone(), id.clone())) {
        Some(data) => Json(json!({"status": 200, "setting": setting_body(&kind, &id, data)})).into_response(),
        None => error(StatusCode::NOT_FOUND, "Setting not found"),
    }
}

async fn set_setting(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((kind, id)): Path<(String, String)>,
    Json(data): Json<Value>,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    db.write()
        .await
        .bot_settings
        .insert((kind.clone(), id.clone()), data.clone());
    Json(json!({"status": 200, "setting": setting_body(&kind, &id, &data)})).into_response()
}

async fn delete_setting(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    match db.write().await.bot_settings.remove(&(kind.clone(), id.clone())) {
        Some(data) => Json(json!({"status": 200, "setting": setting_body(&kind, &id, &data)})).into_response(),
        None => error(StatusCode::NOT_FOUND, "Setting not found"),
    }
}
