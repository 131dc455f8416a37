// Format catalog - maps raw extraction formats into display buckets
//
// Splits the service's format list into a video bucket (combined,
// best_combined, video_only) and an audio bucket (audio_only), preserving
// input order within each bucket, and precomputes the per-entry details
// the presentation layer shows.

use super::display::format_file_size;
use super::errors::DownloadError;
use super::models::{FormatDescriptor, FormatKind};

/// Audio annotation for a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioNote {
    /// Video-bearing format that carries an audio track
    Included,
    /// Video-only format; worth warning the user about
    Missing,
    /// Plain audio format; the annotation does not apply
    NotApplicable,
}

/// One selectable entry with precomputed display details
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub format_id: String,
    pub kind: FormatKind,
    /// Display string from the service, e.g. "720p (Video + Audio)"
    pub quality: String,
    /// Upper-cased container extension, e.g. "MP4"
    pub ext: String,
    /// Human-readable size; "Unknown" when the service omitted it
    pub size: String,
    /// Frame rate, only for video-bearing formats that report one
    pub fps: Option<f64>,
    pub audio: AudioNote,
    /// Audio bitrate in kbps, only for audio-only formats
    pub bitrate: Option<f64>,
    /// combined/best_combined entries are highlighted as the safe choice;
    /// a styling hint only, any entry may be picked
    pub recommended: bool,
}

impl CatalogEntry {
    fn from_descriptor(descriptor: &FormatDescriptor) -> Self {
        let kind = descriptor.kind;
        let audio = if !kind.has_video() {
            AudioNote::NotApplicable
        } else if kind == FormatKind::VideoOnly {
            AudioNote::Missing
        } else {
            AudioNote::Included
        };
        Self {
            format_id: descriptor.format_id.clone(),
            kind,
            quality: descriptor.quality.clone(),
            ext: descriptor.ext.to_uppercase(),
            // The service reports unknown sizes as zero
            size: format_file_size(descriptor.filesize.filter(|s| *s > 0)),
            fps: if kind.has_video() {
                descriptor.fps.filter(|f| *f > 0.0)
            } else {
                None
            },
            audio,
            bitrate: if kind == FormatKind::AudioOnly {
                descriptor.abr.filter(|b| *b > 0.0)
            } else {
                None
            },
            recommended: kind.is_recommended(),
        }
    }
}

/// The two ordered buckets shown to the user
#[derive(Debug, Clone)]
pub struct FormatCatalog {
    pub video: Vec<CatalogEntry>,
    pub audio: Vec<CatalogEntry>,
}

impl FormatCatalog {
    /// Build the catalog from an extraction response.
    ///
    /// An empty format list is an error: callers must render an explicit
    /// "no formats available" message, never a silently empty page.
    pub fn build(formats: &[FormatDescriptor]) -> Result<Self, DownloadError> {
        if formats.is_empty() {
            return Err(DownloadError::NoFormats);
        }

        let mut video = Vec::new();
        let mut audio = Vec::new();
        for descriptor in formats {
            let entry = CatalogEntry::from_descriptor(descriptor);
            match descriptor.kind {
                FormatKind::AudioOnly => audio.push(entry),
                _ => video.push(entry),
            }
        }
        Ok(Self { video, audio })
    }

    pub fn len(&self) -> usize {
        self.video.len() + self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in display order: video bucket first, then audio.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.video.iter().chain(self.audio.iter())
    }

    /// Look up an entry by format id across both buckets.
    pub fn find(&self, format_id: &str) -> Option<&CatalogEntry> {
        self.entries().find(|e| e.format_id == format_id)
    }
}
