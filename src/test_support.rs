//! In-process mock of the travel API for tests.
//!
//! An axum router bound to an ephemeral localhost port. It keeps users,
//! issued tokens, places, reviews and route suggestions in memory, counts
//! hits per `"METHOD /route/{pattern}"`, remembers the last query string and
//! JSON body per route, and can be told to fail the next N hits of a route
//! with a 503.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{MatchedPath, Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use parking_lot::Mutex;
use serde_json::{json, Value};
use url::Url;

use crate::auth::credential::{Claims, Credential};
use crate::auth::models::{Address, Role, UserProfile};
use crate::auth::session::SessionManager;
use crate::auth::store::CredentialVault;
use crate::http::{HttpPipeline, RetryPolicy};
use crate::models::{Comment, Coordinates, Location, Place, Review, RouteSuggestion};
use crate::navigation::RecordingNavigator;

/// Serves `router` on `127.0.0.1:0` and returns its base URL.
pub(crate) async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}").parse().unwrap()
}

/// Pipeline against `base` with millisecond retry delays.
pub(crate) fn fast_pipeline(base: Url) -> Arc<HttpPipeline> {
    Arc::new(
        HttpPipeline::new(
            base,
            Duration::from_secs(5),
            RetryPolicy::new(3, Duration::from_millis(5)),
        )
        .unwrap(),
    )
}

const SECRET: &[u8] = b"mock-secret";

struct MockUser {
    profile: UserProfile,
    password: String,
}

#[derive(Default)]
struct Backend {
    users: Vec<MockUser>,
    tokens: HashMap<String, String>,
    token_ttl: Option<chrono::Duration>,
    places: Vec<Place>,
    locations: Vec<Location>,
    reviews: Vec<Review>,
    suggestions: Vec<RouteSuggestion>,
    hits: HashMap<String, usize>,
    failures: HashMap<String, usize>,
    queries: HashMap<String, String>,
    bodies: HashMap<String, Value>,
    last_login_remember: Option<bool>,
    next_id: u64,
}

impl Backend {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn user_by_email(&mut self, email: &str) -> Option<&mut MockUser> {
        self.users.iter_mut().find(|u| u.profile.email == email)
    }

    fn user_by_id(&mut self, id: &str) -> Option<&mut MockUser> {
        self.users.iter_mut().find(|u| u.profile.id == id)
    }

    fn issue(&mut self, user_id: &str, ttl: chrono::Duration) -> Credential {
        let claims = Claims {
            exp: (Utc::now() + ttl).timestamp(),
            user_id: Some(user_id.to_string()),
            sub: None,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap();
        self.tokens.insert(token.clone(), user_id.to_string());
        Credential::new(token)
    }

    fn place(&self, id: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.id == id || p.object_id == id)
    }
}

#[derive(Clone)]
pub(crate) struct MockBackend {
    state: Arc<Mutex<Backend>>,
    url: Url,
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    reply(status, json!({ "error": message }))
}

fn str_field(body: &Value, key: &str) -> String {
    body.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn toggle(liked_by: &mut Vec<String>, user_id: &str) -> bool {
    if let Some(pos) = liked_by.iter().position(|id| id == user_id) {
        liked_by.remove(pos);
        false
    } else {
        liked_by.push(user_id.to_string());
        true
    }
}

fn seed_places() -> Vec<Place> {
    let place = |n: u32, name: &str, location_id: &str, category: &str, rating: f64| Place {
        object_id: format!("seed-obj-{n}"),
        id: format!("p{n}"),
        name: name.to_string(),
        location_id: location_id.to_string(),
        description: format!("{name} description"),
        category: category.to_string(),
        rating,
        coordinates: Coordinates { lat: 13.7, lng: 100.5 },
        ..Default::default()
    };
    vec![
        place(1, "Wat Arun", "1", "temple", 4.7),
        place(2, "Doi Suthep", "2", "temple", 4.8),
        place(3, "Phi Phi Viewpoint", "9", "viewpoint", 4.5),
    ]
}

fn seed_locations() -> Vec<Location> {
    [("1", "Bangkok"), ("2", "Chiang Mai"), ("9", "Krabi")]
        .into_iter()
        .map(|(id, name)| Location {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
        })
        .collect()
}

impl MockBackend {
    pub(crate) async fn start() -> Self {
        let state = Arc::new(Mutex::new(Backend {
            places: seed_places(),
            locations: seed_locations(),
            ..Default::default()
        }));
        // Placeholder until the listener is bound.
        let mut backend = Self {
            state,
            url: "http://127.0.0.1".parse().unwrap(),
        };
        backend.url = serve(backend.router()).await;
        backend
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/change-password", post(change_password))
            .route("/api/profile", get(profile).put(update_profile))
            .route("/api/places", get(list_places))
            .route("/api/places/{id}", get(get_place))
            .route("/api/locations", get(list_locations))
            .route("/api/reviews", get(list_reviews).post(create_review))
            .route(
                "/api/reviews/{id}",
                get(get_review).put(update_review).delete(delete_review),
            )
            .route("/api/reviews/{id}/like", post(like_review))
            .route("/api/reviews/{id}/comments", post(add_comment))
            .route("/api/reviews/{id}/comments/{comment_id}/like", post(like_comment))
            .route("/api/reviews/{id}/report", post(report_review))
            .route("/api/routes/suggest", get(list_suggestions).post(suggest_route))
            .route("/api/routes/cost", get(estimate_cost))
            .route("/api/admin/users", get(admin_users))
            .route(
                "/api/admin/users/{id}",
                get(admin_user).put(admin_update_user).delete(admin_delete_user),
            )
            .route("/api/admin/places", get(admin_places).post(admin_create_place))
            .route(
                "/api/admin/places/{id}",
                put(admin_update_place).delete(admin_delete_place),
            )
            .route("/api/admin/stats", get(admin_stats))
            .route_layer(from_fn_with_state(self.clone(), record))
            .with_state(self.clone())
    }

    pub(crate) fn url(&self) -> Url {
        self.url.clone()
    }

    pub(crate) fn pipeline(&self) -> Arc<HttpPipeline> {
        fast_pipeline(self.url())
    }

    /// Pipeline with a bearer header for `email` already installed.
    pub(crate) fn pipeline_as(&self, email: &str) -> Arc<HttpPipeline> {
        let http = self.pipeline();
        http.auth_header()
            .install(&self.issue_token(email, chrono::Duration::hours(1)));
        http
    }

    /// Session restored from a session-tier credential for `email`.
    pub(crate) async fn signed_in_session(&self, email: &str) -> (Arc<HttpPipeline>, SessionManager) {
        self.signed_in_session_with(email, Arc::new(RecordingNavigator::new()))
            .await
    }

    pub(crate) async fn signed_in_session_with(
        &self,
        email: &str,
        navigator: Arc<RecordingNavigator>,
    ) -> (Arc<HttpPipeline>, SessionManager) {
        let http = self.pipeline();
        let vault = CredentialVault::in_memory();
        vault
            .persist(&self.issue_token(email, chrono::Duration::hours(1)), false)
            .unwrap();
        let session = SessionManager::new(
            http.clone(),
            vault,
            navigator,
            Duration::from_secs(30 * 60),
        );
        assert!(session.initialize().await.authenticated);
        (http, session)
    }

    pub(crate) fn add_user(&self, email: &str, password: &str, name: &str, role: &str) -> String {
        let mut state = self.state.lock();
        let id = state.next_id("user");
        state.users.push(MockUser {
            profile: UserProfile {
                id: id.clone(),
                email: email.to_string(),
                name: name.to_string(),
                role: Role::from_wire(role),
                status: Some("active".to_string()),
                ban_reason: None,
                address: None,
                created_at: Some(Utc::now()),
            },
            password: password.to_string(),
        });
        id
    }

    pub(crate) fn ban(&self, email: &str, reason: &str) {
        let mut state = self.state.lock();
        let user = state.user_by_email(email).unwrap();
        user.profile.status = Some("banned".to_string());
        user.profile.ban_reason = Some(reason.to_string());
    }

    pub(crate) fn set_role(&self, email: &str, role: &str) {
        self.state.lock().user_by_email(email).unwrap().profile.role = Role::from_wire(role);
    }

    pub(crate) fn issue_token(&self, email: &str, ttl: chrono::Duration) -> Credential {
        let mut state = self.state.lock();
        let id = state.user_by_email(email).unwrap().profile.id.clone();
        state.issue(&id, ttl)
    }

    pub(crate) fn revoke_all_tokens(&self) {
        self.state.lock().tokens.clear();
    }

    /// Lifetime of tokens issued by subsequent logins.
    pub(crate) fn set_token_ttl(&self, ttl: chrono::Duration) {
        self.state.lock().token_ttl = Some(ttl);
    }

    pub(crate) fn last_login_remember(&self) -> Option<bool> {
        self.state.lock().last_login_remember
    }

    /// Answers the next `count` hits on `route` with a 503.
    pub(crate) fn fail_next(&self, route: &str, count: usize) {
        self.state.lock().failures.insert(route.to_string(), count);
    }

    pub(crate) fn hits(&self, route: &str) -> usize {
        self.state.lock().hits.get(route).copied().unwrap_or(0)
    }

    pub(crate) fn last_query(&self, route: &str) -> Option<String> {
        self.state.lock().queries.get(route).cloned()
    }

    pub(crate) fn last_body(&self, route: &str) -> Option<Value> {
        self.state.lock().bodies.get(route).cloned()
    }

    pub(crate) fn place(&self, id: &str) -> Option<Place> {
        self.state.lock().place(id).cloned()
    }

    /// Resolves the bearer header to a user, or the 401 the API would send.
    fn authenticate(&self, headers: &HeaderMap) -> Result<UserProfile, Response> {
        let Some(token) = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        else {
            return Err(error(StatusCode::UNAUTHORIZED, "Authorization header is required"));
        };
        if Credential::new(token).is_expired() {
            return Err(error(StatusCode::UNAUTHORIZED, "token expired"));
        }
        let mut state = self.state.lock();
        let Some(user_id) = state.tokens.get(token).cloned() else {
            return Err(error(StatusCode::UNAUTHORIZED, "invalid token"));
        };
        state
            .user_by_id(&user_id)
            .map(|u| u.profile.clone())
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "user not found"))
    }

    fn authenticate_admin(&self, headers: &HeaderMap) -> Result<UserProfile, Response> {
        let user = self.authenticate(headers)?;
        if user.role.can_administer() {
            Ok(user)
        } else {
            Err(error(StatusCode::FORBIDDEN, "admin access required"))
        }
    }
}

async fn record(
    State(backend): State<MockBackend>,
    matched: MatchedPath,
    request: Request,
    next: Next,
) -> Response {
    let key = format!("{} {}", request.method(), matched.as_str());
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    {
        let mut state = backend.state.lock();
        *state.hits.entry(key.clone()).or_default() += 1;
        if let Some(query) = parts.uri.query() {
            state.queries.insert(key.clone(), query.to_string());
        }
        if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
            state.bodies.insert(key.clone(), value);
        }
        if let Some(remaining) = state.failures.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return error(StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable");
            }
        }
    }
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 7 && password.chars().any(char::is_alphabetic)
}

async fn login(State(b): State<MockBackend>, Json(body): Json<Value>) -> Response {
    let email = str_field(&body, "email");
    let password = str_field(&body, "password");
    let remember = body.get("remember_me").and_then(Value::as_bool).unwrap_or(false);

    let mut state = b.state.lock();
    state.last_login_remember = Some(remember);
    let ttl = state.token_ttl.unwrap_or(if remember {
        chrono::Duration::days(7)
    } else {
        chrono::Duration::hours(24)
    });
    let Some(user) = state.user_by_email(&email) else {
        return error(StatusCode::UNAUTHORIZED, "invalid credentials");
    };
    if user.profile.status.as_deref() == Some("banned") {
        return reply(
            StatusCode::FORBIDDEN,
            json!({
                "error": "Your account has been banned",
                "banReason": user.profile.ban_reason,
            }),
        );
    }
    if user.password != password {
        return error(StatusCode::UNAUTHORIZED, "invalid credentials");
    }
    let profile = user.profile.clone();
    let token = state.issue(&profile.id, ttl);
    reply(StatusCode::OK, json!({ "token": token, "user": profile }))
}

async fn register(State(b): State<MockBackend>, Json(body): Json<Value>) -> Response {
    let email = str_field(&body, "email");
    let password = str_field(&body, "password");
    if b.state.lock().user_by_email(&email).is_some() {
        return error(StatusCode::BAD_REQUEST, "Email already exists");
    }
    if !is_valid_password(&password) {
        return error(
            StatusCode::BAD_REQUEST,
            "Password must be at least 7 characters and contain at least one letter",
        );
    }
    b.add_user(&email, &password, &str_field(&body, "name"), "user");
    reply(StatusCode::CREATED, json!({ "message": "User registered successfully" }))
}

async fn change_password(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = match b.authenticate(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut state = b.state.lock();
    let Some(account) = state.user_by_id(&user.id) else {
        return error(StatusCode::NOT_FOUND, "user not found");
    };
    if account.password != str_field(&body, "currentPassword") {
        return error(StatusCode::BAD_REQUEST, "current password is incorrect");
    }
    let new_password = str_field(&body, "newPassword");
    if !is_valid_password(&new_password) {
        return error(
            StatusCode::BAD_REQUEST,
            "Password must be at least 7 characters and contain at least one letter",
        );
    }
    account.password = new_password;
    reply(StatusCode::OK, json!({ "message": "Password changed successfully" }))
}

async fn profile(State(b): State<MockBackend>, headers: HeaderMap) -> Response {
    match b.authenticate(&headers) {
        Ok(user) => reply(StatusCode::OK, json!({ "user": user })),
        Err(response) => response,
    }
}

async fn update_profile(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = match b.authenticate(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut state = b.state.lock();
    if let Some(account) = state.user_by_id(&user.id) {
        account.profile.name = str_field(&body, "name");
        if let Some(address) = body.get("address") {
            account.profile.address = serde_json::from_value::<Address>(address.clone()).ok();
        }
    }
    reply(StatusCode::OK, json!({ "message": "profile updated successfully" }))
}

async fn list_places(State(b): State<MockBackend>) -> Response {
    reply(StatusCode::OK, json!({ "places": b.state.lock().places }))
}

async fn get_place(State(b): State<MockBackend>, Path(id): Path<String>) -> Response {
    match b.state.lock().place(&id) {
        Some(place) => reply(StatusCode::OK, json!({ "place": place })),
        None => error(StatusCode::NOT_FOUND, "Place not found"),
    }
}

async fn list_locations(State(b): State<MockBackend>) -> Response {
    reply(StatusCode::OK, json!({ "locations": b.state.lock().locations }))
}

async fn list_reviews(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    axum::extract::Query(query): axum::extract::Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = b.authenticate(&headers) {
        return response;
    }
    let state = b.state.lock();
    let reviews: Vec<Review> = state
        .reviews
        .iter()
        .filter(|r| query.get("placeId").is_none_or(|id| &r.place_id == id))
        .map(|r| {
            let mut r = r.clone();
            let resolved = state.place(&r.place_id).map(|p| p.name.clone());
            r.listed_place_name = Some(resolved.unwrap_or_else(|| r.place_name.clone()));
            r
        })
        .collect();
    reply(StatusCode::OK, json!({ "reviews": reviews }))
}

async fn create_review(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = match b.authenticate(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut state = b.state.lock();
    let place_id = str_field(&body, "placeId");
    let mut place_name = str_field(&body, "placeName");
    if place_name.is_empty() {
        place_name = state.place(&place_id).map(|p| p.name.clone()).unwrap_or_default();
    }
    let id = state.next_id("review");
    state.reviews.push(Review {
        id: id.clone(),
        user_id: user.id,
        username: user.name,
        place_id,
        place_name: place_name.clone(),
        rating: body.get("rating").and_then(Value::as_u64).unwrap_or(0) as u8,
        comment: str_field(&body, "comment"),
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
        ..Default::default()
    });
    reply(
        StatusCode::OK,
        json!({ "message": "review created successfully", "id": id, "placeName": place_name }),
    )
}

/// Runs `f` on the review with `id`, or answers 404.
fn with_review(
    b: &MockBackend,
    headers: &HeaderMap,
    id: &str,
    f: impl FnOnce(&mut Review, &UserProfile) -> Response,
) -> Response {
    let user = match b.authenticate(headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut state = b.state.lock();
    match state.reviews.iter_mut().find(|r| r.id == id) {
        Some(review) => f(review, &user),
        None => error(StatusCode::NOT_FOUND, "review not found"),
    }
}

async fn get_review(State(b): State<MockBackend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    with_review(&b, &headers, &id, |review, _| {
        reply(StatusCode::OK, json!({ "review": review }))
    })
}

async fn update_review(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    with_review(&b, &headers, &id, |review, _| {
        if let Some(rating) = body.get("rating").and_then(Value::as_u64) {
            review.rating = rating as u8;
        }
        if let Some(comment) = body.get("comment").and_then(Value::as_str) {
            review.comment = comment.to_string();
        }
        review.updated_at = Some(Utc::now());
        reply(StatusCode::OK, json!({ "message": "review updated successfully" }))
    })
}

async fn delete_review(State(b): State<MockBackend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(response) = b.authenticate(&headers) {
        return response;
    }
    b.state.lock().reviews.retain(|r| r.id != id);
    reply(StatusCode::OK, json!({ "message": "review deleted successfully" }))
}

async fn like_review(State(b): State<MockBackend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    with_review(&b, &headers, &id, |review, user| {
        let liked = toggle(&mut review.liked_by, &user.id);
        review.likes = review.liked_by.len() as u32;
        reply(StatusCode::OK, json!({ "message": "like toggled", "liked": liked }))
    })
}

async fn add_comment(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let comment_id = b.state.lock().next_id("comment");
    with_review(&b, &headers, &id, |review, user| {
        let comment = Comment {
            id: comment_id,
            user_id: user.id.clone(),
            username: user.name.clone(),
            text: str_field(&body, "text"),
            created_at: Some(Utc::now()),
            ..Default::default()
        };
        review.comments.push(comment.clone());
        reply(StatusCode::OK, json!({ "message": "comment added", "comment": comment }))
    })
}

async fn like_comment(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Path((id, comment_id)): Path<(String, String)>,
) -> Response {
    with_review(&b, &headers, &id, |review, user| {
        match review.comments.iter_mut().find(|c| c.id == comment_id) {
            Some(comment) => {
                let liked = toggle(&mut comment.liked_by, &user.id);
                comment.likes = comment.liked_by.len() as u32;
                reply(StatusCode::OK, json!({ "message": "like toggled", "liked": liked }))
            }
            None => error(StatusCode::NOT_FOUND, "comment not found"),
        }
    })
}

async fn report_review(State(b): State<MockBackend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    with_review(&b, &headers, &id, |_, _| {
        reply(StatusCode::OK, json!({ "message": "report submitted" }))
    })
}

async fn suggest_route(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = match b.authenticate(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut state = b.state.lock();
    let id = state.next_id("route");
    state.suggestions.push(RouteSuggestion {
        id: id.clone(),
        user_id: user.id,
        start_location: str_field(&body, "start_location"),
        end_location: str_field(&body, "end_location"),
        description: str_field(&body, "description"),
        created_at: Some(Utc::now()),
    });
    reply(
        StatusCode::OK,
        json!({ "message": "route suggestion saved successfully", "id": id }),
    )
}

async fn list_suggestions(State(b): State<MockBackend>, headers: HeaderMap) -> Response {
    let user = match b.authenticate(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let state = b.state.lock();
    let mine: Vec<&RouteSuggestion> = state.suggestions.iter().filter(|s| s.user_id == user.id).collect();
    reply(StatusCode::OK, json!({ "suggestions": mine }))
}

async fn estimate_cost(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = b.authenticate(&headers) {
        return response;
    }
    reply(
        StatusCode::OK,
        json!({ "message": "cost estimation endpoint", "input": body }),
    )
}

async fn admin_users(State(b): State<MockBackend>, headers: HeaderMap) -> Response {
    if let Err(response) = b.authenticate_admin(&headers) {
        return response;
    }
    let users: Vec<UserProfile> = b.state.lock().users.iter().map(|u| u.profile.clone()).collect();
    reply(StatusCode::OK, json!({ "users": users }))
}

async fn admin_user(State(b): State<MockBackend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(response) = b.authenticate_admin(&headers) {
        return response;
    }
    match b.state.lock().user_by_id(&id) {
        Some(user) => reply(StatusCode::OK, json!({ "user": user.profile })),
        None => error(StatusCode::NOT_FOUND, "user not found"),
    }
}

async fn admin_update_user(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = b.authenticate_admin(&headers) {
        return response;
    }
    let mut state = b.state.lock();
    let Some(user) = state.user_by_id(&id) else {
        return error(StatusCode::NOT_FOUND, "user not found");
    };
    if let Some(name) = body.get("name").and_then(Value::as_str) {
        user.profile.name = name.to_string();
    }
    if let Some(role) = body.get("role").and_then(Value::as_str) {
        user.profile.role = Role::from_wire(role);
    }
    if let Some(status) = body.get("status").and_then(Value::as_str) {
        user.profile.status = Some(status.to_string());
        if status != "banned" {
            user.profile.ban_reason = None;
        }
    }
    if let Some(reason) = body.get("ban_reason").and_then(Value::as_str) {
        user.profile.ban_reason = Some(reason.to_string());
    }
    reply(StatusCode::OK, json!({ "message": "user updated successfully" }))
}

async fn admin_delete_user(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = b.authenticate_admin(&headers) {
        return response;
    }
    b.state.lock().users.retain(|u| u.profile.id != id);
    reply(StatusCode::OK, json!({ "message": "user deleted successfully" }))
}

async fn admin_places(State(b): State<MockBackend>, headers: HeaderMap) -> Response {
    if let Err(response) = b.authenticate_admin(&headers) {
        return response;
    }
    reply(StatusCode::OK, json!({ "places": b.state.lock().places }))
}

fn apply_place_input(place: &mut Place, body: &Value) {
    place.name = str_field(body, "name");
    place.description = str_field(body, "description");
    place.location_id = str_field(body, "location_id");
    place.category = str_field(body, "category");
    place.address = str_field(body, "address");
    place.phone = str_field(body, "phone");
    place.website = str_field(body, "website");
    place.hours = str_field(body, "hours");
    place.cover_image = str_field(body, "cover_image");
    place.highlight_images = body
        .get("highlights")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    place.coordinates = body
        .get("coordinates")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    place.updated_at = Some(Utc::now());
}

async fn admin_create_place(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = b.authenticate_admin(&headers) {
        return response;
    }
    let mut state = b.state.lock();
    let n = state.next_id("obj");
    let mut place = Place {
        id: n.replacen("obj", "place", 1),
        object_id: n,
        created_at: Some(Utc::now()),
        ..Default::default()
    };
    apply_place_input(&mut place, &body);
    state.places.push(place.clone());
    reply(StatusCode::CREATED, json!({ "place": place }))
}

async fn admin_update_place(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = b.authenticate_admin(&headers) {
        return response;
    }
    let mut state = b.state.lock();
    match state.places.iter_mut().find(|p| p.object_id == id) {
        Some(place) => {
            apply_place_input(place, &body);
            reply(StatusCode::OK, json!({ "message": "place updated successfully" }))
        }
        None => error(StatusCode::NOT_FOUND, "place not found"),
    }
}

async fn admin_delete_place(
    State(b): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = b.authenticate_admin(&headers) {
        return response;
    }
    let mut state = b.state.lock();
    let before = state.places.len();
    state.places.retain(|p| p.object_id != id);
    if state.places.len() == before {
        return error(StatusCode::NOT_FOUND, "place not found");
    }
    reply(StatusCode::OK, json!({ "message": "place deleted successfully" }))
}

async fn admin_stats(State(b): State<MockBackend>, headers: HeaderMap) -> Response {
    if let Err(response) = b.authenticate_admin(&headers) {
        return response;
    }
    let state = b.state.lock();
    reply(
        StatusCode::OK,
        json!({
            "total_users": state.users.len(),
            "total_reviews": state.reviews.len(),
            "total_routes": state.suggestions.len(),
            "last_updated": Utc::now(),
        }),
    )
}
