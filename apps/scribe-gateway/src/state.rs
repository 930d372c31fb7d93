//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use scribe_core::domain::PostFilter;
use scribe_core::ports::{
    Cache, Clock, CommentRepository, FunctionInvoker, ObjectStore, PostRepository, SystemClock,
};
use scribe_core::services::{AuthorResolver, CommentService, ContentService, ListingCache, MediaLibrary};
use scribe_infra::{
    BackendClient, BucketObjectStore, DocumentCommentRepository, DocumentPostRepository, FileCache,
    HttpFunctionInvoker, InMemoryCache, InMemoryCommentRepository, InMemoryObjectStore,
    InMemoryPostRepository, InMemoryUserDirectory,
};

use crate::config::{CacheBackend, GatewayConfig};

/// Function id used by the in-memory user directory.
const LOCAL_AUTHOR_FUNCTION: &str = "get-author";

/// The ports a gateway instance talks to.
pub struct Backend {
    pub kind: &'static str,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub objects: Arc<dyn ObjectStore>,
    pub invoker: Arc<dyn FunctionInvoker>,
    pub author_function_id: String,
}

impl Backend {
    pub fn remote(client: BackendClient) -> Self {
        let author_function_id = client.config().author_function_id.clone();
        let client = Arc::new(client);
        Self {
            kind: "remote",
            posts: Arc::new(DocumentPostRepository::new(client.clone())),
            comments: Arc::new(DocumentCommentRepository::new(client.clone())),
            objects: Arc::new(BucketObjectStore::new(client.clone())),
            invoker: Arc::new(HttpFunctionInvoker::new(client)),
            author_function_id,
        }
    }

    /// Process-local backend; `users` answers author lookups.
    pub fn in_memory(users: Arc<InMemoryUserDirectory>) -> Self {
        Self {
            kind: "memory",
            posts: Arc::new(InMemoryPostRepository::new()),
            comments: Arc::new(InMemoryCommentRepository::new()),
            objects: Arc::new(InMemoryObjectStore::new("memory://files")),
            invoker: users,
            author_function_id: LOCAL_AUTHOR_FUNCTION.to_string(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub backend_kind: &'static str,
    pub content: Arc<ContentService>,
    pub listing: Arc<ListingCache>,
    pub authors: Arc<AuthorResolver>,
    pub comments: Arc<CommentService>,
}

impl AppState {
    /// Wire services over `backend`, persisting listings into `snapshots`.
    pub fn assemble(
        backend: Backend,
        snapshots: Arc<dyn Cache>,
        clock: Arc<dyn Clock>,
        listing_ttl: Duration,
        author_ttl: Duration,
    ) -> Self {
        let listing = Arc::new(ListingCache::new(
            backend.posts.clone(),
            snapshots,
            clock.clone(),
            listing_ttl,
        ));
        let media = Arc::new(MediaLibrary::new(backend.objects));
        let content = ContentService::new(backend.posts, media).with_listing(listing.clone());
        let authors = AuthorResolver::new(
            backend.invoker,
            backend.author_function_id,
            clock.clone(),
            author_ttl,
        );

        Self {
            backend_kind: backend.kind,
            content: Arc::new(content),
            listing,
            authors: Arc::new(authors),
            comments: Arc::new(CommentService::new(backend.comments, clock)),
        }
    }

    /// Build the state from configuration, falling back to in-memory
    /// implementations where the configured ones are unavailable.
    pub async fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let backend = match &config.backend {
            Some(backend_config) => Backend::remote(BackendClient::new(backend_config.clone())?),
            None => {
                tracing::warn!("BACKEND_URL not set. Running on the in-memory backend.");
                Backend::in_memory(Arc::new(InMemoryUserDirectory::new()))
            }
        };
        let snapshots = snapshot_store(config).await;

        let state = Self::assemble(
            backend,
            snapshots,
            Arc::new(SystemClock),
            config.listing_ttl,
            config.author_ttl,
        );

        if state.listing.hydrate(&PostFilter::default()).await {
            tracing::info!("Restored last listing snapshot");
        }
        tracing::info!(backend = state.backend_kind, "Application state initialized");
        Ok(state)
    }
}

async fn snapshot_store(config: &GatewayConfig) -> Arc<dyn Cache> {
    match config.cache_backend {
        CacheBackend::Memory => Arc::new(InMemoryCache::new()),
        CacheBackend::File => match FileCache::open(&config.cache_dir).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                tracing::error!(error = %e, "File cache unavailable. Using in-memory snapshots.");
                Arc::new(InMemoryCache::new())
            }
        },
        CacheBackend::Redis => redis_store().await,
    }
}

#[cfg(feature = "redis")]
async fn redis_store() -> Arc<dyn Cache> {
    use scribe_infra::{RedisCache, RedisConfig};

    match RedisCache::connect(RedisConfig::from_env()).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            tracing::error!(error = %e, "Redis unavailable. Using in-memory snapshots.");
            Arc::new(InMemoryCache::new())
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn redis_store() -> Arc<dyn Cache> {
    tracing::warn!("CACHE_BACKEND=redis but the redis feature is disabled. Using in-memory snapshots.");
    Arc::new(InMemoryCache::new())
}
