//! Frame source implementations.
//!
//! A source returns the raw frames (at most one per sensor is used) for one
//! date and region. It must keep "nothing exists for this date" apart from
//! "the service failed": only the latter is retried.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use albedo_common::{BoundingBox, Frame, Sensor};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use crate::error::SourceError;

/// Trait for services that deliver raw frames.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Fetch all frames covering `region` on `date`.
    ///
    /// An empty vector is equivalent to [`SourceError::NoData`].
    async fn get_frames(&self, date: NaiveDate, region: &BoundingBox)
        -> Result<Vec<Frame>, SourceError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Drop frames of the wrong date or whose extent misses the region.
fn keep_relevant(frames: Vec<Frame>, date: NaiveDate, region: &BoundingBox) -> Vec<Frame> {
    frames
        .into_iter()
        .filter(|frame| {
            if frame.date() != date {
                warn!(
                    sensor = %frame.sensor(),
                    expected = %date,
                    actual = %frame.date(),
                    "Dropping frame for a different date"
                );
                return false;
            }
            if !frame.spec().bbox().intersects(region) {
                debug!(sensor = %frame.sensor(), date = %date, "Frame does not cover region");
                return false;
            }
            true
        })
        .collect()
}

fn non_empty(frames: Vec<Frame>) -> Result<Vec<Frame>, SourceError> {
    if frames.is_empty() {
        Err(SourceError::NoData)
    } else {
        Ok(frames)
    }
}

// ============================================================================
// In-memory source
// ============================================================================

/// Frames held in memory, keyed by date.
#[derive(Debug, Default, Clone)]
pub struct StaticFrameSource {
    frames: HashMap<NaiveDate, Vec<Frame>>,
}

impl StaticFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.insert(frame);
        self
    }

    pub fn insert(&mut self, frame: Frame) {
        self.frames.entry(frame.date()).or_default().push(frame);
    }
}

impl FromIterator<Frame> for StaticFrameSource {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        let mut source = Self::new();
        for frame in iter {
            source.insert(frame);
        }
        source
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn get_frames(
        &self,
        date: NaiveDate,
        region: &BoundingBox,
    ) -> Result<Vec<Frame>, SourceError> {
        let frames = self.frames.get(&date).cloned().unwrap_or_default();
        non_empty(keep_relevant(frames, date, region))
    }

    fn name(&self) -> &str {
        "static"
    }
}

// ============================================================================
// Directory source
// ============================================================================

/// Frames stored as JSON files: `{root}/{sensor}/{YYYY-MM-DD}.json`.
#[derive(Debug, Clone)]
pub struct DirectoryFrameSource {
    root: PathBuf,
}

impl DirectoryFrameSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn frame_path(&self, sensor: Sensor, date: NaiveDate) -> PathBuf {
        self.root
            .join(sensor.as_str())
            .join(format!("{}.json", date.format("%Y-%m-%d")))
    }
}

#[async_trait]
impl FrameSource for DirectoryFrameSource {
    #[instrument(skip(self, region), fields(root = %self.root.display()))]
    async fn get_frames(
        &self,
        date: NaiveDate,
        region: &BoundingBox,
    ) -> Result<Vec<Frame>, SourceError> {
        let mut frames = Vec::new();

        for sensor in Sensor::ALL {
            let path = self.frame_path(sensor, date);
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(sensor = %sensor, path = %path.display(), "No frame file");
                    continue;
                }
                Err(e) => {
                    return Err(SourceError::Transient(format!(
                        "failed to read {}: {}",
                        path.display(),
                        e
                    )))
                }
            };

            let frame = Frame::from_json(&bytes)
                .map_err(|e| SourceError::Invalid(format!("{}: {}", path.display(), e)))?;
            frames.push(frame);
        }

        non_empty(keep_relevant(frames, date, region))
    }

    fn name(&self) -> &str {
        "directory"
    }
}

// ============================================================================
// HTTP source
// ============================================================================

/// Frames served over HTTP as JSON:
/// `GET {base_url}/frames/{sensor}/{YYYY-MM-DD}?bbox=minx,miny,maxx,maxy`.
#[derive(Debug, Clone)]
pub struct HttpFrameSource {
    client: Client,
    base_url: String,
}

impl HttpFrameSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Invalid(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn frame_url(&self, sensor: Sensor, date: NaiveDate, region: &BoundingBox) -> String {
        format!(
            "{}/frames/{}/{}?bbox={}",
            self.base_url,
            sensor.as_str(),
            date.format("%Y-%m-%d"),
            region.to_param_string()
        )
    }

    async fn fetch_one(
        &self,
        sensor: Sensor,
        date: NaiveDate,
        region: &BoundingBox,
    ) -> Result<Option<Frame>, SourceError> {
        let url = self.frame_url(sensor, date, region);
        debug!(url = %url, "Requesting frame");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Transient(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if is_transient_status(status) {
            return Err(SourceError::Transient(format!("{} returned {}", url, status)));
        }
        if !status.is_success() {
            return Err(SourceError::Invalid(format!("{} returned {}", url, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Transient(format!("{}: {}", url, e)))?;
        Frame::from_json(&bytes)
            .map(Some)
            .map_err(|e| SourceError::Invalid(format!("{}: {}", url, e)))
    }
}

/// Statuses worth retrying: timeouts, throttling and server errors.
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

#[async_trait]
impl FrameSource for HttpFrameSource {
    #[instrument(skip(self, region), fields(base_url = %self.base_url))]
    async fn get_frames(
        &self,
        date: NaiveDate,
        region: &BoundingBox,
    ) -> Result<Vec<Frame>, SourceError> {
        let mut frames = Vec::new();
        for sensor in Sensor::ALL {
            if let Some(frame) = self.fetch_one(sensor, date, region).await? {
                frames.push(frame);
            }
        }
        non_empty(keep_relevant(frames, date, region))
    }

    fn name(&self) -> &str {
        "http"
    }
}
