// ============================================================================
// cropper-cli/src/server/webhook.rs
// ============================================================================
//
// SONARR / RADARR EVENTS: Payload model and classification
//
// Only the fields the queue needs are modelled; everything else in the
// payload is ignored. Imports become enqueue requests, file deletions become
// cancellations.

use cropper_core::EnqueueRequest;
use serde::Deserialize;
use std::fmt;

/// Media manager that sent the event, taken from the route it arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    Sonarr,
    Radarr,
}

impl Program {
    pub fn name(self) -> &'static str {
        match self {
            Program::Sonarr => "Sonarr",
            Program::Radarr => "Radarr",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the queue does with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Import,
    Delete,
    Test,
    Other,
}

impl EventKind {
    /// Classifies an `eventType`, ignoring the case of its first letter.
    pub fn classify(event_type: &str) -> Self {
        let mut chars = event_type.chars();
        let normalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        match normalized.as_str() {
            "Download" | "DownloadFolderImported" => EventKind::Import,
            "EpisodeFileDelete" | "EpisodeFileDeleted" | "MovieFileDelete" | "MovieFileDeleted" => {
                EventKind::Delete
            }
            "Test" => EventKind::Test,
            _ => EventKind::Other,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub network: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub studio: Option<String>,
}

/// `episodeFile` / `movieFile`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub path: Option<String>,
    pub scene_name: Option<String>,
    pub release_group: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub release_group: Option<String>,
}

/// `data` block of folder import events.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportData {
    pub imported_path: Option<String>,
}

/// A Sonarr or Radarr webhook payload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrEvent {
    #[serde(default)]
    pub event_type: String,
    pub series: Option<Series>,
    pub movie: Option<Movie>,
    pub episode_file: Option<MediaFile>,
    pub movie_file: Option<MediaFile>,
    pub release: Option<Release>,
    pub data: Option<ImportData>,
    pub source_title: Option<String>,
}

impl ArrEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::classify(&self.event_type)
    }

    fn media_file(&self) -> Option<&MediaFile> {
        self.episode_file.as_ref().or(self.movie_file.as_ref())
    }

    fn media_file_path(&self) -> Option<&str> {
        non_empty(self.media_file().and_then(|file| file.path.as_deref()))
    }

    /// Path of the file an import event brought in.
    pub fn imported_path(&self) -> Option<&str> {
        self.media_file_path()
            .or_else(|| non_empty(self.data.as_ref().and_then(|data| data.imported_path.as_deref())))
    }

    /// Path of the file a delete event removed.
    pub fn deleted_path(&self) -> Option<&str> {
        self.media_file_path()
            .or_else(|| non_empty(self.source_title.as_deref()))
    }

    /// Network for series, studio for movies.
    fn remote_source(&self) -> Option<String> {
        self.series
            .as_ref()
            .and_then(|s| s.network.clone())
            .or_else(|| self.movie.as_ref().and_then(|m| m.studio.clone()))
    }

    fn remote_group(&self) -> Option<String> {
        self.media_file()
            .and_then(|file| file.release_group.clone())
            .or_else(|| self.release.as_ref().and_then(|r| r.release_group.clone()))
    }

    fn display_name(&self) -> String {
        self.media_file()
            .and_then(|file| file.scene_name.clone())
            .unwrap_or_default()
    }

    /// Enqueue request for an import event, or `None` without a file path.
    pub fn import_request(&self, program: Program) -> Option<EnqueueRequest> {
        let path = self.imported_path()?;
        Some(
            EnqueueRequest::new(self.display_name(), path)
                .local_source(program.name())
                .remote_source(self.remote_source())
                .remote_group(self.remote_group()),
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
