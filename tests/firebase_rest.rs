// tests/firebase_rest.rs
//
// Firestore and Firebase Storage adapters against a local fake of both
// REST APIs, driven through the movie service.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};

use moviehub::{
    AppError, AppState, BlobStore, CreateMovieRequest, DocumentStore, ErrorKind, FirebaseSettings,
    FirebaseStorageBlobStore, FirestoreDocumentStore, MovieFields, MovieId, PosterImage,
    UpdateMovieRequest,
};

const API_KEY: &str = "test-key";
const PAGE_SIZE: usize = 2;

type Params = Vec<(String, String)>;

#[derive(Default)]
struct FakeFirebase {
    /// (collection, id, typed fields) in insertion order
    documents: Vec<(String, String, Map<String, Value>)>,
    /// key -> (bytes, content type, token)
    objects: HashMap<String, (Vec<u8>, String, String)>,
    next_id: usize,
}

type Shared = Arc<Mutex<FakeFirebase>>;

fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn firebase_error(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "error": { "code": status.as_u16(), "message": message, "status": "ERROR" }
    });
    (status, Json(body)).into_response()
}

fn authorized(params: &Params) -> Result<(), Response> {
    match param(params, "key") {
        Some(API_KEY) => Ok(()),
        _ => Err(firebase_error(StatusCode::FORBIDDEN, "API key not valid")),
    }
}

// Firebase answers this way when the project, database or bucket does not exist
async fn unknown_resource() -> Response {
    firebase_error(
        StatusCode::NOT_FOUND,
        "The database (default) does not exist for project wrong-project",
    )
}

fn rest_document(project: &str, collection: &str, id: &str, fields: &Map<String, Value>) -> Value {
    json!({
        "name": format!("projects/{}/databases/(default)/documents/{}/{}", project, collection, id),
        "fields": fields,
    })
}

async fn list_documents(
    State(fake): State<Shared>,
    Path((project, _db, collection)): Path<(String, String, String)>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(denied) = authorized(&params) {
        return denied;
    }
    let fake = fake.lock().unwrap();
    let offset: usize = param(&params, "pageToken")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);

    let matching: Vec<_> = fake
        .documents
        .iter()
        .filter(|(c, _, _)| *c == collection)
        .collect();
    let page: Vec<Value> = matching
        .iter()
        .skip(offset)
        .take(PAGE_SIZE)
        .map(|(c, id, fields)| rest_document(&project, c, id, fields))
        .collect();

    let mut body = json!({ "documents": page });
    if offset + PAGE_SIZE < matching.len() {
        body["nextPageToken"] = json!((offset + PAGE_SIZE).to_string());
    }
    Json(body).into_response()
}

async fn create_document(
    State(fake): State<Shared>,
    Path((project, _db, collection)): Path<(String, String, String)>,
    Query(params): Query<Params>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorized(&params) {
        return denied;
    }
    let mut fake = fake.lock().unwrap();
    fake.next_id += 1;
    let id = format!("doc{}", fake.next_id);
    let fields = body["fields"].as_object().cloned().unwrap_or_default();
    let doc = rest_document(&project, &collection, &id, &fields);
    fake.documents.push((collection, id, fields));
    Json(doc).into_response()
}

async fn get_document(
    State(fake): State<Shared>,
    Path((project, _db, collection, id)): Path<(String, String, String, String)>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(denied) = authorized(&params) {
        return denied;
    }
    let fake = fake.lock().unwrap();
    match fake
        .documents
        .iter()
        .find(|(c, i, _)| *c == collection && *i == id)
    {
        Some((c, i, fields)) => Json(rest_document(&project, c, i, fields)).into_response(),
        None => firebase_error(StatusCode::NOT_FOUND, "Document not found"),
    }
}

async fn patch_document(
    State(fake): State<Shared>,
    Path((project, _db, collection, id)): Path<(String, String, String, String)>,
    Query(params): Query<Params>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorized(&params) {
        return denied;
    }
    assert_eq!(param(&params, "currentDocument.exists"), Some("true"));

    let mut fake = fake.lock().unwrap();
    let Some((_, _, stored)) = fake
        .documents
        .iter_mut()
        .find(|(c, i, _)| *c == collection && *i == id)
    else {
        return firebase_error(StatusCode::NOT_FOUND, "No document to update");
    };

    let incoming = body["fields"].as_object().cloned().unwrap_or_default();
    for (_, mask) in params.iter().filter(|(k, _)| k == "updateMask.fieldPaths") {
        match incoming.get(mask) {
            Some(value) => {
                stored.insert(mask.clone(), value.clone());
            }
            None => {
                stored.remove(mask);
            }
        }
    }
    Json(rest_document(&project, &collection, &id, stored)).into_response()
}

async fn delete_document(
    State(fake): State<Shared>,
    Path((_project, _db, collection, id)): Path<(String, String, String, String)>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(denied) = authorized(&params) {
        return denied;
    }
    fake.lock()
        .unwrap()
        .documents
        .retain(|(c, i, _)| !(*c == collection && *i == id));
    Json(json!({})).into_response()
}

async fn upload_object(
    State(fake): State<Shared>,
    Path(bucket): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    assert_eq!(param(&params, "uploadType"), Some("media"));
    let Some(name) = param(&params, "name").map(str::to_string) else {
        return firebase_error(StatusCode::BAD_REQUEST, "name is required");
    };
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let mut fake = fake.lock().unwrap();
    let token = format!("token-{}", fake.objects.len() + 1);
    fake.objects
        .insert(name.clone(), (body.to_vec(), content_type.clone(), token.clone()));

    Json(json!({
        "name": name,
        "bucket": bucket,
        "contentType": content_type,
        "downloadTokens": token,
    }))
    .into_response()
}

async fn get_object(
    State(fake): State<Shared>,
    Path((bucket, object)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> Response {
    let fake = fake.lock().unwrap();
    let Some((bytes, content_type, token)) = fake.objects.get(&object) else {
        return firebase_error(StatusCode::NOT_FOUND, "Not Found.");
    };

    if param(&params, "alt") == Some("media") {
        if param(&params, "token") != Some(token.as_str()) {
            return firebase_error(StatusCode::FORBIDDEN, "Permission denied.");
        }
        return ([("content-type", content_type.clone())], bytes.clone()).into_response();
    }

    Json(json!({
        "name": object,
        "bucket": bucket,
        "contentType": content_type,
        "downloadTokens": token,
    }))
    .into_response()
}

struct Fixture {
    addr: SocketAddr,
    fake: Shared,
}

impl Fixture {
    fn settings(&self) -> FirebaseSettings {
        FirebaseSettings::new("demo-project", API_KEY, "demo.appspot.com").with_roots(
            &format!("http://{}/v1/", self.addr),
            &format!("http://{}/v0/", self.addr),
        )
    }

    /// Settings whose roots the fake does not serve.
    fn unknown_settings(&self) -> FirebaseSettings {
        self.settings().with_roots(
            &format!("http://{}/v1beta/", self.addr),
            &format!("http://{}/v0beta/", self.addr),
        )
    }

    fn state(&self) -> AppState {
        state_for(&self.settings())
    }


    fn stored_fields(&self, id: &str) -> Map<String, Value> {
        self.fake
            .lock()
            .unwrap()
            .documents
            .iter()
            .find(|(_, i, _)| i == id)
            .map(|(_, _, f)| f.clone())
            .unwrap()
    }
}

fn state_for(settings: &FirebaseSettings) -> AppState {
    AppState::new(
        Arc::new(FirestoreDocumentStore::new(settings).unwrap()),
        Arc::new(FirebaseStorageBlobStore::new(settings).unwrap()),
    )
}

async fn start_fake() -> Fixture {
    let fake: Shared = Arc::new(Mutex::new(FakeFirebase::default()));

    let app = Router::new()
        .route(
            "/v1/projects/:project/databases/:db/documents/:collection",
            get(list_documents).post(create_document),
        )
        .route(
            "/v1/projects/:project/databases/:db/documents/:collection/:id",
            get(get_document).patch(patch_document).delete(delete_document),
        )
        .route("/v0/b/:bucket/o", post(upload_object))
        .route("/v0/b/:bucket/o/:object", get(get_object))
        .fallback(unknown_resource)
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Fixture { addr, fake }
}

fn fields(title: &str) -> MovieFields {
    MovieFields {
        title: title.to_string(),
        director: "Villeneuve".to_string(),
        year: 2021,
        genre: "Sci-Fi".to_string(),
        rating: 8.5,
        description: "...".to_string(),
    }
}

#[tokio::test]
async fn test_create_with_poster_round_trip() {
    let fixture = start_fake().await;
    let state = fixture.state();

    let created = state
        .movie_service
        .create_movie(CreateMovieRequest {
            fields: fields("Dune"),
            image: PosterImage::pending(vec![0xFF, 0xD8, 0xFF, 0xE0], "dune.jpg"),
        })
        .await
        .unwrap();

    let url = created.image_url.clone().unwrap();
    assert!(url.contains("/v0/b/demo.appspot.com/o/movies%2F"));
    assert!(url.contains("alt=media"));
    assert!(url.contains("token=token-1"));

    let poster = reqwest::get(&url).await.unwrap();
    assert_eq!(poster.status(), 200);
    assert_eq!(poster.bytes().await.unwrap().to_vec(), vec![0xFF, 0xD8, 0xFF, 0xE0]);

    let stored = fixture.stored_fields(created.id.as_str());
    assert_eq!(stored["title"], json!({ "stringValue": "Dune" }));
    assert_eq!(stored["year"], json!({ "integerValue": "2021" }));
    assert_eq!(stored["rating"], json!({ "doubleValue": 8.5 }));
    assert_eq!(stored["imageUrl"], json!({ "stringValue": url }));

    let fetched = state
        .movie_service
        .get_movie(&created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.title, "Dune");
    assert_eq!(fetched.year, 2021);
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn test_list_follows_page_tokens() {
    let fixture = start_fake().await;
    let state = fixture.state();

    for title in ["A", "B", "C", "D", "E"] {
        state
            .movie_service
            .create_movie(CreateMovieRequest {
                fields: fields(title),
                image: PosterImage::None,
            })
            .await
            .unwrap();
    }

    let titles: Vec<String> = state
        .movie_service
        .list_movies()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.title)
        .collect();

    assert_eq!(titles, vec!["A", "B", "C", "D", "E"]);
}

#[tokio::test]
async fn test_update_keeps_created_at_and_clears_image() {
    let fixture = start_fake().await;
    let state = fixture.state();

    let created = state
        .movie_service
        .create_movie(CreateMovieRequest {
            fields: fields("Arrival"),
            image: PosterImage::ExistingUrl("https://img.example/arrival.jpg".to_string()),
        })
        .await
        .unwrap();
    let created_at = fixture.stored_fields(created.id.as_str())["createdAt"].clone();

    state
        .movie_service
        .update_movie(UpdateMovieRequest {
            id: created.id.clone(),
            fields: MovieFields {
                rating: 9.0,
                ..fields("Arrival")
            },
            image: PosterImage::None,
        })
        .await
        .unwrap();

    let stored = fixture.stored_fields(created.id.as_str());
    assert_eq!(stored["createdAt"], created_at);
    assert_eq!(stored["rating"], json!({ "doubleValue": 9.0 }));
    assert_eq!(stored["imageUrl"], json!({ "nullValue": null }));
    assert!(stored.contains_key("updatedAt"));
}

#[tokio::test]
async fn test_missing_documents() {
    let fixture = start_fake().await;
    let state = fixture.state();

    let err = state
        .movie_service
        .get_movie(&MovieId::new("ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = state
        .movie_service
        .update_movie(UpdateMovieRequest {
            id: MovieId::new("ghost"),
            fields: fields("Ghost"),
            image: PosterImage::None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Deleting a missing document succeeds
    let deleted = state
        .movie_service
        .delete_movie(&MovieId::new("ghost"))
        .await
        .unwrap();
    assert_eq!(deleted.as_str(), "ghost");
}

#[tokio::test]
async fn test_delete_removes_document_only() {
    let fixture = start_fake().await;
    let state = fixture.state();

    let created = state
        .movie_service
        .create_movie(CreateMovieRequest {
            fields: fields("Sicario"),
            image: PosterImage::pending(vec![1, 2, 3], "sicario.png"),
        })
        .await
        .unwrap();

    state.movie_service.delete_movie(&created.id).await.unwrap();

    assert!(state.movie_service.list_movies().await.unwrap().is_empty());
    let fake = fixture.fake.lock().unwrap();
    assert_eq!(fake.objects.len(), 1);
    let (_, content_type, _) = fake.objects.values().next().unwrap();
    assert_eq!(content_type, "image/png");
}

#[tokio::test]
async fn test_remote_errors_carry_status_and_message() {
    let fixture = start_fake().await;
    let settings = FirebaseSettings {
        api_key: "wrong".to_string(),
        ..fixture.settings()
    };
    let store = FirestoreDocumentStore::new(&settings).unwrap();

    let err = store.list("movies").await.unwrap_err();

    match err {
        AppError::Remote { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

fn assert_remote_404(err: AppError) {
    assert_eq!(err.kind(), ErrorKind::RemoteFailure);
    match err {
        AppError::Remote { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("does not exist"), "message: {}", message);
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_database_is_a_remote_failure() {
    let fixture = start_fake().await;
    let settings = fixture.unknown_settings();
    let store = FirestoreDocumentStore::new(&settings).unwrap();

    assert_remote_404(store.list("movies").await.unwrap_err());

    let state = state_for(&settings);
    assert_remote_404(state.movie_service.list_movies().await.unwrap_err());
    assert_remote_404(
        state
            .movie_service
            .create_movie(CreateMovieRequest {
                fields: fields("Arrival"),
                image: PosterImage::None,
            })
            .await
            .unwrap_err(),
    );
}

#[tokio::test]
async fn test_delete_against_unknown_database_fails() {
    let fixture = start_fake().await;
    let state = state_for(&fixture.unknown_settings());
    let events_before = state.event_bus.get_event_log().len();

    let err = state
        .movie_service
        .delete_movie(&MovieId::new("m1"))
        .await
        .unwrap_err();

    assert_remote_404(err);
    assert_eq!(state.event_bus.get_event_log().len(), events_before);
}

#[tokio::test]
async fn test_upload_to_unknown_bucket_fails() {
    let fixture = start_fake().await;
    let blobs = FirebaseStorageBlobStore::new(&fixture.unknown_settings()).unwrap();

    let err = blobs
        .upload("images/poster.png", vec![1, 2, 3], "image/png")
        .await
        .unwrap_err();

    assert_remote_404(err);
    assert!(fixture.fake.lock().unwrap().objects.is_empty());
}
