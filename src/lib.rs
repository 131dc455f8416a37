// Client library for the Facebook video extraction/download service

pub mod downloader;

pub use downloader::{
    ClientConfig, DownloadController, DownloadError, FormatCatalog, JobClient, JobService,
    PollerConfig, Presenter, Session, SessionEvent, SessionPhase, VideoMetadata,
};
