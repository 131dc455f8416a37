// Downloader module - client-side orchestration for the download service

pub mod catalog;
pub mod client;
pub mod controller;
pub mod display;
pub mod errors;
pub mod models;
pub mod poller;
pub mod session;
pub mod traits;

pub use catalog::{AudioNote, CatalogEntry, FormatCatalog};
pub use client::{default_save_dir, JobClient};
pub use controller::{DownloadController, Presenter};
pub use errors::DownloadError;
pub use models::{
    ClientConfig, DownloadJob, FormatDescriptor, FormatKind, ProgressSnapshot,
    ProgressStatus, RemoteFile, VideoMetadata,
};
pub use poller::{PollOutcome, PollerConfig, ProgressPoller};
pub use session::{is_supported_url, Effect, Session, SessionEvent, SessionPhase};
pub use traits::{JobService, ProgressSink};
