//! Port fakes shared by the service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::oneshot;

use crate::domain::{
    Comment, NewComment, NewPost, ObjectUpload, Post, PostFilter, PostPatch, PostStatus,
    StoredObject,
};
use crate::error::RepoError;
use crate::ports::{
    Cache, CacheError, CommentRepository, FunctionInvoker, ObjectStore, PostRepository,
};

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 21, 12, minute, 0).unwrap()
}

pub fn post(slug: &str, minute: u32) -> Post {
    Post {
        slug: slug.to_string(),
        title: format!("Post {slug}"),
        content: "<p>body</p>".to_string(),
        featured_image: None,
        status: PostStatus::Active,
        user_id: "u1".to_string(),
        created_at: at(minute),
        updated_at: None,
    }
}

/// List responses handed out in call order; optionally parks the first call.
#[derive(Default)]
pub struct ScriptedListRepo {
    responses: Mutex<VecDeque<Result<Vec<Post>, RepoError>>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    calls: AtomicUsize,
}

impl ScriptedListRepo {
    pub fn new(responses: Vec<Result<Vec<Post>, RepoError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    /// The first `list` call waits until the returned sender fires.
    pub fn gate_first_call(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostRepository for ScriptedListRepo {
    async fn create(&self, _post: NewPost) -> Result<Post, RepoError> {
        unimplemented!("listing tests only list")
    }

    async fn get(&self, _slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(None)
    }

    async fn update(&self, _slug: &str, _patch: PostPatch) -> Result<Post, RepoError> {
        unimplemented!("listing tests only list")
    }

    async fn delete(&self, _slug: &str) -> Result<(), RepoError> {
        Ok(())
    }

    async fn list(&self, _filter: &PostFilter) -> Result<Vec<Post>, RepoError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));
        if call == 0 {
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
        }
        response
    }
}

/// Map-backed post store with switchable failures.
#[derive(Default)]
pub struct MapPostRepo {
    pub posts: Mutex<HashMap<String, Post>>,
    pub fail_delete: Mutex<Option<RepoError>>,
}

impl MapPostRepo {
    pub fn with(posts: Vec<Post>) -> Self {
        let repo = Self::default();
        for p in posts {
            repo.posts.lock().unwrap().insert(p.slug.clone(), p);
        }
        repo
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.posts.lock().unwrap().contains_key(slug)
    }
}

#[async_trait]
impl PostRepository for MapPostRepo {
    async fn create(&self, input: NewPost) -> Result<Post, RepoError> {
        let mut posts = self.posts.lock().unwrap();
        if posts.contains_key(&input.slug) {
            return Err(RepoError::Conflict(format!("document {} exists", input.slug)));
        }
        let stored = Post {
            slug: input.slug.clone(),
            title: input.title,
            content: input.content,
            featured_image: input.featured_image,
            status: input.status,
            user_id: input.user_id,
            created_at: at(30),
            updated_at: None,
        };
        posts.insert(input.slug, stored.clone());
        Ok(stored)
    }

    async fn get(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.lock().unwrap().get(slug).cloned())
    }

    async fn update(&self, slug: &str, patch: PostPatch) -> Result<Post, RepoError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts.get_mut(slug).ok_or(RepoError::NotFound)?;
        patch.apply_to(post);
        Ok(post.clone())
    }

    async fn delete(&self, slug: &str) -> Result<(), RepoError> {
        if let Some(err) = self.fail_delete.lock().unwrap().clone() {
            return Err(err);
        }
        self.posts
            .lock()
            .unwrap()
            .remove(slug)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, RepoError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }
}

/// Object store that records ids and can be told to fail.
#[derive(Default)]
pub struct MapObjectStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_upload: Mutex<bool>,
    pub fail_delete: Mutex<bool>,
    next: AtomicUsize,
}

impl MapObjectStore {
    pub fn with_object(id: &str) -> Self {
        let store = Self::default();
        store.objects.lock().unwrap().insert(id.to_string(), vec![1]);
        store
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.lock().unwrap().contains_key(id)
    }
}

#[async_trait]
impl ObjectStore for MapObjectStore {
    async fn upload(&self, upload: ObjectUpload) -> Result<StoredObject, RepoError> {
        if *self.fail_upload.lock().unwrap() {
            return Err(RepoError::Transport("bucket unavailable".into()));
        }
        let id = format!("obj{}", self.next.fetch_add(1, Ordering::SeqCst));
        let size = upload.bytes.len() as u64;
        self.objects.lock().unwrap().insert(id.clone(), upload.bytes);
        Ok(StoredObject {
            id,
            name: upload.file_name,
            mime_type: upload.mime_type,
            size,
        })
    }

    async fn delete(&self, object_id: &str) -> Result<(), RepoError> {
        if *self.fail_delete.lock().unwrap() {
            return Err(RepoError::Transport("bucket unavailable".into()));
        }
        self.objects
            .lock()
            .unwrap()
            .remove(object_id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    fn preview_url(&self, object_id: &str) -> String {
        format!("mem://{object_id}/preview")
    }

    fn view_url(&self, object_id: &str) -> String {
        format!("mem://{object_id}/view")
    }

    fn download_url(&self, object_id: &str) -> String {
        format!("mem://{object_id}/download")
    }
}

/// Comment store stamping sequential ids.
#[derive(Default)]
pub struct VecCommentRepo {
    pub comments: Mutex<Vec<Comment>>,
    pub fail_create: Mutex<bool>,
}

#[async_trait]
impl CommentRepository for VecCommentRepo {
    async fn create(&self, input: NewComment) -> Result<Comment, RepoError> {
        if *self.fail_create.lock().unwrap() {
            return Err(RepoError::Permission("missing create permission".into()));
        }
        let mut comments = self.comments.lock().unwrap();
        let comment = Comment {
            id: format!("c{}", comments.len() + 1),
            post_id: input.post_id,
            user_id: input.user_id,
            user_name: input.user_name,
            content: input.content,
            created_at: input.created_at,
        };
        comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: &str) -> Result<Vec<Comment>, RepoError> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }
}

/// Invoker returning canned envelopes and recording payloads.
#[derive(Default)]
pub struct CannedInvoker {
    pub replies: Mutex<HashMap<String, Result<String, RepoError>>>,
    pub payloads: Mutex<Vec<String>>,
}

impl CannedInvoker {
    pub fn reply(self, user_id: &str, envelope: Result<String, RepoError>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(user_id.to_string(), envelope);
        self
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }
}

#[async_trait]
impl FunctionInvoker for CannedInvoker {
    async fn execute(&self, _function_id: &str, body: String) -> Result<String, RepoError> {
        self.payloads.lock().unwrap().push(body.clone());
        let user_id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["userId"].as_str().map(String::from))
            .unwrap_or_default();
        self.replies
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| Err(RepoError::NotFound))
    }
}

/// Durable store stand-in; optionally parks the next write.
#[derive(Default)]
pub struct MapCache {
    pub entries: Mutex<HashMap<String, String>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    parked: AtomicUsize,
}

impl MapCache {
    /// The next `set` waits until the returned sender fires.
    pub fn gate_next_set(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Writes that reached the gate so far.
    pub fn parked(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cache for MapCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> Result<(), CacheError> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            self.parked.fetch_add(1, Ordering::SeqCst);
            let _ = gate.await;
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
