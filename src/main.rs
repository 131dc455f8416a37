// Interactive command-line front end for the download service client

use std::io::{self, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use facebook_downloader::downloader::{
    default_save_dir, AudioNote, CatalogEntry, ClientConfig, DownloadController,
    FormatCatalog, JobClient, JobService, PollerConfig, Presenter, ProgressStatus,
    RemoteFile, Session, SessionEvent, SessionPhase,
};
use facebook_downloader::downloader::display::{
    format_count, format_duration, format_file_size,
};

struct ConsolePresenter;

impl ConsolePresenter {
    fn render_entry(&self, index: usize, entry: &CatalogEntry) {
        let mut details = vec![entry.ext.clone(), entry.size.clone()];
        match entry.audio {
            AudioNote::Included => details.push("Audio".to_string()),
            AudioNote::Missing => details.push("No Audio".to_string()),
            AudioNote::NotApplicable => {}
        }
        if let Some(fps) = entry.fps {
            details.push(format!("{}fps", fps));
        }
        if let Some(abr) = entry.bitrate {
            details.push(format!("{}kbps", abr));
        }
        let badge = if entry.recommended { "  [RECOMMENDED]" } else { "" };
        println!(
            "  {}. {}{}\n     {}",
            index,
            entry.quality,
            badge,
            details.join(" | ")
        );
    }
}

impl Presenter for ConsolePresenter {
    fn render(&self, session: &Session) {
        match session.phase {
            SessionPhase::Idle => {}
            SessionPhase::Loading => println!("Extracting video information..."),
            SessionPhase::ShowingInfo => {
                let video = match &session.video {
                    Some(video) => video,
                    None => return,
                };
                println!();
                println!("{}", video.title);
                println!(
                    "by {} | {} | {} views",
                    video.uploader,
                    format_duration(video.duration),
                    format_count(video.view_count)
                );
                if let Some(description) = &video.description {
                    if !description.is_empty() {
                        println!("{}", description);
                    }
                }
                match FormatCatalog::build(&video.formats) {
                    Ok(catalog) => {
                        println!("\nAvailable formats:");
                        for (index, entry) in catalog.entries().enumerate() {
                            self.render_entry(index + 1, entry);
                        }
                    }
                    Err(error) => println!("{}", error),
                }
            }
            SessionPhase::Downloading => {
                let progress = session.job.as_ref().and_then(|job| job.progress.as_ref());
                let progress = match progress {
                    Some(progress) => progress,
                    None => {
                        println!("Starting download...");
                        return;
                    }
                };
                match progress.status {
                    ProgressStatus::Starting | ProgressStatus::Preparing => {
                        let message = progress
                            .message
                            .as_deref()
                            .unwrap_or("Preparing download...");
                        println!("{}", message);
                    }
                    _ => {
                        print!(
                            "\r{:>5.1}%  speed {}  eta {}  ({} / {})   ",
                            progress.percent_or_zero(),
                            progress.speed.as_deref().unwrap_or("N/A"),
                            progress.eta.as_deref().unwrap_or("N/A"),
                            format_file_size(progress.downloaded),
                            format_file_size(progress.total)
                        );
                        let _ = io::stdout().flush();
                    }
                }
            }
            SessionPhase::Complete => {
                if let Some(filename) = &session.completed_file {
                    println!("\nDownload completed: {}", filename);
                }
            }
            SessionPhase::Error => {
                if let Some(message) = &session.error {
                    println!("\nError: {}", message);
                }
            }
        }
    }

    fn show_validation(&self, message: &str) {
        println!("{}", message);
    }

    fn show_files(&self, files: &[RemoteFile]) {
        if files.is_empty() {
            return;
        }
        println!("\nRecent downloads:");
        for file in files {
            println!("  {} ({})", file.name, format_file_size(Some(file.size)));
        }
    }
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let mut config = ClientConfig::default();
    if let Ok(base_url) = std::env::var("FB_DOWNLOADER_URL") {
        config = config.with_base_url(base_url);
    }
    if let Ok(proxy) = std::env::var("FB_DOWNLOADER_PROXY") {
        config = config.with_proxy(Some(proxy));
    }

    let client = Arc::new(JobClient::new(&config)?);
    let mut controller = DownloadController::new(
        Arc::clone(&client) as Arc<dyn JobService>,
        PollerConfig::default(),
        Arc::new(ConsolePresenter),
    );

    println!("Facebook Video Downloader (service at {})", config.base_url);

    loop {
        let url = prompt("\nVideo URL (blank to quit): ")?;
        if url.is_empty() {
            break;
        }

        controller.dispatch(SessionEvent::Submit { url }).await;
        if controller.session().phase != SessionPhase::ShowingInfo {
            controller.dispatch(SessionEvent::Reset).await;
            continue;
        }

        let video = match &controller.session().video {
            Some(video) => video.clone(),
            None => continue,
        };
        let catalog = match FormatCatalog::build(&video.formats) {
            Ok(catalog) => catalog,
            Err(error) => {
                println!("{}", error);
                controller.dispatch(SessionEvent::Reset).await;
                continue;
            }
        };

        let choice = prompt("Format number (blank to cancel): ")?;
        if choice.is_empty() {
            controller.dispatch(SessionEvent::Reset).await;
            continue;
        }
        let format_id = match choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| catalog.entries().nth(n))
        {
            Some(entry) => entry.format_id.clone(),
            None => {
                println!("No such format");
                continue;
            }
        };

        controller
            .dispatch(SessionEvent::FormatSelected { format_id })
            .await;
        controller.run_until_settled().await;

        if let Some(filename) = controller.session().completed_file.clone() {
            match client.fetch_file(&filename).await {
                Ok(bytes) => {
                    let destination = default_save_dir().join(&filename);
                    tokio::fs::write(&destination, &bytes).await?;
                    println!("Saved to {}", destination.display());
                }
                Err(error) => println!("Could not fetch the file: {}", error),
            }
        }

        controller.dispatch(SessionEvent::Reset).await;
    }

    Ok(())
}
