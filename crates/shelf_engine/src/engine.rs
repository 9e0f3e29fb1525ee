use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use shelf_core::{ArticleId, ArticleStatus, ListingTag, RequestId, StatusFilter};
use shelf_logging::{shelf_debug, shelf_info};

use crate::fetch::{FetchSettings, ReqwestFetcher};
use crate::records::{FileRecordStore, MemoryRecordStore, RecordStore};
use crate::{
    system_clock, ArticleStore, AuthContext, Clock, EngineEvent, FetchError,
    HtmlMetadataExtractor, MetadataSource, StoreError, TimerRegistry,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    /// JSON snapshot at the given path.
    File(PathBuf),
}

#[derive(Clone)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub store: StoreBackend,
    pub auth: AuthContext,
    pub clock: Clock,
}

impl EngineConfig {
    pub fn new(auth: AuthContext, store: StoreBackend) -> Self {
        Self {
            fetch: FetchSettings::default(),
            store,
            auth,
            clock: system_clock(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to build http client: {0}")]
    Client(#[from] FetchError),
}

/// Work the engine runs on its runtime; each command answers with exactly
/// one [`EngineEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    List { tag: ListingTag, filter: StatusFilter },
    Search { request: RequestId, query: String },
    Preview { request: RequestId, url: String },
    Create {
        url: String,
        status: ArticleStatus,
        memo: String,
    },
    Update {
        id: ArticleId,
        memo: String,
        status: ArticleStatus,
    },
    Delete { id: ArticleId },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

struct Services {
    store: ArticleStore,
    metadata: Arc<dyn MetadataSource>,
    auth: AuthContext,
}

/// Owns the tokio runtime and runs commands concurrently. In-flight commands
/// are never aborted; stale answers are for the caller to discard.
pub struct EngineHandle {
    runtime: tokio::runtime::Runtime,
    services: Arc<Services>,
    sink: Arc<dyn EventSink>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let metadata: Arc<dyn MetadataSource> =
            Arc::new(HtmlMetadataExtractor::new(ReqwestFetcher::new(config.fetch)?));
        let records: Arc<dyn RecordStore> = match &config.store {
            StoreBackend::Memory => Arc::new(MemoryRecordStore::new()),
            StoreBackend::File(path) => Arc::new(FileRecordStore::open(path.clone())?),
        };
        Self::with_services(config.auth, records, metadata, config.clock, sink)
    }

    /// Build an engine over explicit collaborators.
    pub fn with_services(
        auth: AuthContext,
        records: Arc<dyn RecordStore>,
        metadata: Arc<dyn MetadataSource>,
        clock: Clock,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("shelf-engine")
            .enable_all()
            .build()?;
        let services = Arc::new(Services {
            store: ArticleStore::new(records, metadata.clone(), clock),
            metadata,
            auth,
        });
        shelf_info!("Engine started");
        Ok(Self {
            runtime,
            services,
            sink,
        })
    }

    /// Timers bound to the engine runtime.
    pub fn timers(&self) -> TimerRegistry {
        TimerRegistry::new(self.runtime.handle().clone())
    }

    pub fn submit(&self, command: EngineCommand) {
        shelf_debug!("submit {:?}", command);
        let services = self.services.clone();
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            let event = run_command(&services, command).await;
            sink.emit(event);
        });
    }
}

async fn run_command(services: &Services, command: EngineCommand) -> EngineEvent {
    let auth = &services.auth;
    let store = &services.store;
    match command {
        EngineCommand::List { tag, filter } => EngineEvent::ListingLoaded {
            tag,
            result: store.list_by_status(auth, filter).await,
        },
        EngineCommand::Search { request, query } => EngineEvent::SearchLoaded {
            request,
            result: store.search(auth, &query).await,
        },
        EngineCommand::Preview { request, url } => EngineEvent::PreviewLoaded {
            request,
            result: services.metadata.extract(&url).await,
        },
        EngineCommand::Create { url, status, memo } => EngineEvent::Created {
            result: store.create(auth, &url, status, Some(memo)).await,
        },
        EngineCommand::Update { id, memo, status } => {
            let result = store.update(auth, &id, memo, status).await;
            EngineEvent::Updated { id, result }
        }
        EngineCommand::Delete { id } => {
            let result = store.delete(auth, &id).await;
            EngineEvent::Deleted { id, result }
        }
    }
}
