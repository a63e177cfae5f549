//! Session layer: current-image state, navigation, and backend round trips.
//!
//! [`Session`] owns the image list, the current index, the per-image
//! metadata, and an [`EngineCore`]. It forwards host input to the engine and
//! services the engine's [`Action`]s that need the backend — persists,
//! rectangle extraction, navigation — translating everything else into
//! host-facing [`Effect`]s. All backend calls happen at explicit await
//! points; navigation always completes the outgoing image's persist before
//! the incoming load starts, so marks are never silently dropped.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::backend::{Backend, GeoInfo};
use crate::engine::{Action, EngineCore, NoticeLevel};
use crate::input::InputEvent;
use crate::marks::MarkList;

/// How long the best-effort shutdown notification may take before being
/// abandoned.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Host-facing outcome of a session operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Redraw the scene.
    RenderNeeded,
    /// Show a transient message.
    Notice { level: NoticeLevel, message: String },
    /// Ask the user for a label; resume via [`Session::submit_label`] or
    /// [`Session::cancel_label`].
    LabelPrompt,
    /// Per-label mark counts for the outgoing image. The host presents the
    /// summary; only an explicit [`Session::confirm_next`] proceeds.
    ConfirmNext { tally: BTreeMap<u8, usize> },
    /// Switch the pointer cursor.
    SetCursor(&'static str),
    /// Suppress the platform default for the triggering event.
    SuppressDefault,
    /// A backend round trip started (show the spinner).
    BusyOn,
    /// The backend round trip finished (hide the spinner).
    BusyOff,
    /// Show the empty-state placeholder instead of an image.
    ShowPlaceholder,
    /// The user asked to quit; the host confirms and tears down.
    QuitRequested,
}

fn notice(level: NoticeLevel, message: impl Into<String>) -> Effect {
    Effect::Notice { level, message: message.into() }
}

/// One annotation session against a backend store.
pub struct Session<B: Backend> {
    backend: B,
    images: Vec<String>,
    index: usize,
    image_data: Option<String>,
    geo_info: GeoInfo,
    header_lines: Vec<String>,
    pub engine: EngineCore,
}

impl<B: Backend> Session<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            images: Vec::new(),
            index: 0,
            image_data: None,
            geo_info: GeoInfo::default(),
            header_lines: Vec::new(),
            engine: EngineCore::new(),
        }
    }

    // --- Queries ---

    /// Number of images served by the backend.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Zero-based index of the current image.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Filename of the current image, if any.
    #[must_use]
    pub fn current_name(&self) -> Option<&str> {
        self.images.get(self.index).map(String::as_str)
    }

    /// Base64 image bytes for the renderer, once a load has succeeded.
    #[must_use]
    pub fn image_data(&self) -> Option<&str> {
        self.image_data.as_deref()
    }

    /// Geolocation metadata for the current image.
    #[must_use]
    pub fn geo_info(&self) -> &GeoInfo {
        &self.geo_info
    }

    // --- Lifecycle ---

    /// Fetch the image list and load the first image.
    pub async fn init(&mut self) -> Vec<Effect> {
        match self.backend.list_images().await {
            Ok(images) if images.is_empty() => {
                info!("backend has no images");
                vec![
                    notice(NoticeLevel::Info, "no images found; add images to the store"),
                    Effect::ShowPlaceholder,
                ]
            }
            Ok(images) => {
                self.images = images;
                self.load_image(0).await
            }
            Err(e) => {
                error!(error = %e, "image list fetch failed");
                vec![
                    notice(NoticeLevel::Error, format!("failed to fetch the image list: {e}")),
                    Effect::ShowPlaceholder,
                ]
            }
        }
    }

    /// Load the image at `index`, wrapping out-of-range indices around.
    ///
    /// The fetched payload is committed atomically: a failed fetch leaves
    /// the previous image, marks, and viewport untouched (only the already
    /// normalized index stands), and surfaces a notice plus placeholder.
    pub async fn load_image(&mut self, index: i64) -> Vec<Effect> {
        if self.images.is_empty() {
            return vec![
                notice(NoticeLevel::Info, "no images found; add images to the store"),
                Effect::ShowPlaceholder,
            ];
        }
        self.index = self.normalize_index(index);

        let mut effects = vec![Effect::BusyOn];
        match self.backend.fetch_image(self.index).await {
            Ok(payload) => {
                let dims = payload.original_dimensions;
                self.image_data = Some(payload.image_data);
                self.geo_info = payload.geo_info;
                self.header_lines = payload.header_lines;
                self.engine
                    .load_image((dims.width, dims.height), MarkList::from_persisted(payload.coordinates));
                info!(index = self.index, name = self.current_name(), "image loaded");
                effects.push(Effect::RenderNeeded);
                effects.push(notice(NoticeLevel::Success, "image loaded"));
            }
            Err(e) => {
                error!(error = %e, index = self.index, "image load failed");
                effects.push(notice(NoticeLevel::Error, format!("failed to load image data: {e}")));
                effects.push(Effect::ShowPlaceholder);
            }
        }
        effects.push(Effect::BusyOff);
        effects
    }

    /// Persist the current image's header lines and marks.
    ///
    /// Failures surface as an error notice; the in-memory marks stay the
    /// source of truth and are not rolled back or retried.
    pub async fn persist(&mut self) -> Vec<Effect> {
        if self.images.is_empty() {
            return Vec::new();
        }

        let coordinates = self.engine.marks.to_persisted();
        let mut effects = vec![Effect::BusyOn];
        match self
            .backend
            .save_coordinates(self.index, &self.header_lines, &coordinates)
            .await
        {
            Ok(()) => debug!(index = self.index, marks = self.engine.marks.len(), "coordinates saved"),
            Err(e) => {
                error!(error = %e, index = self.index, "saving coordinates failed");
                effects.push(notice(NoticeLevel::Error, format!("failed to save coordinates: {e}")));
            }
        }
        effects.push(Effect::BusyOff);
        effects
    }

    /// Navigate to the previous image: persist, then load the neighbor.
    pub async fn navigate_prev(&mut self) -> Vec<Effect> {
        if self.images.is_empty() {
            return Vec::new();
        }
        let mut effects = self.persist().await;
        let target = self.index as i64 - 1;
        effects.extend(self.load_image(target).await);
        effects
    }

    /// Start next-image navigation: hand the host a per-label summary to
    /// confirm. Cancelling is simply never calling [`Session::confirm_next`].
    #[must_use]
    pub fn request_next(&self) -> Vec<Effect> {
        if self.images.is_empty() {
            return Vec::new();
        }
        vec![Effect::ConfirmNext { tally: self.engine.marks.label_tally() }]
    }

    /// Confirmed next-image navigation: persist, then load the neighbor.
    pub async fn confirm_next(&mut self) -> Vec<Effect> {
        if self.images.is_empty() {
            return Vec::new();
        }
        let mut effects = self.persist().await;
        let target = self.index as i64 + 1;
        effects.extend(self.load_image(target).await);
        effects
    }

    // --- Input plumbing ---

    /// Feed a host input event through the engine and service the results.
    pub async fn dispatch(&mut self, event: InputEvent) -> Vec<Effect> {
        let actions = self.engine.handle(event);
        self.process_actions(actions).await
    }

    /// Resume a pending label prompt with the user's input.
    pub async fn submit_label(&mut self, text: &str) -> Vec<Effect> {
        let actions = self.engine.submit_label(text);
        self.process_actions(actions).await
    }

    /// Dismiss a pending label prompt.
    pub fn cancel_label(&mut self) -> Vec<Effect> {
        self.engine
            .cancel_label()
            .into_iter()
            .filter_map(Self::host_effect)
            .collect()
    }

    /// Clear every mark on the current image and persist the sentinel.
    pub async fn clear_all(&mut self) -> Vec<Effect> {
        let actions = self.engine.clear_all();
        self.process_actions(actions).await
    }

    /// Best-effort shutdown notification; errors are logged and dropped.
    /// Hosts typically spawn this during teardown without awaiting it.
    pub async fn shutdown(&self) {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.backend.shutdown()).await {
            Ok(Ok(())) => debug!("backend shutdown requested"),
            Ok(Err(e)) => debug!(error = %e, "backend shutdown request failed"),
            Err(_) => debug!("backend shutdown request timed out"),
        }
    }

    // --- Internals ---

    fn normalize_index(&self, index: i64) -> usize {
        if index < 0 {
            self.images.len() - 1
        } else if index as usize >= self.images.len() {
            0
        } else {
            index as usize
        }
    }

    /// Translate a pure engine action into its host effect, if it has one.
    fn host_effect(action: Action) -> Option<Effect> {
        match action {
            Action::RenderNeeded => Some(Effect::RenderNeeded),
            Action::Notice { level, message } => Some(Effect::Notice { level, message }),
            Action::LabelPrompt => Some(Effect::LabelPrompt),
            Action::SetCursor(cursor) => Some(Effect::SetCursor(cursor)),
            Action::SuppressDefault => Some(Effect::SuppressDefault),
            Action::QuitRequested => Some(Effect::QuitRequested),
            _ => None,
        }
    }

    async fn process_actions(&mut self, actions: Vec<Action>) -> Vec<Effect> {
        let mut queue = std::collections::VecDeque::from(actions);
        let mut effects = Vec::new();

        while let Some(action) = queue.pop_front() {
            match action {
                Action::PersistNeeded => effects.extend(self.persist().await),
                Action::ProcessRectangle { corners, label } => {
                    effects.push(Effect::BusyOn);
                    match self.backend.process_rectangle(corners).await {
                        Ok(points) => {
                            debug!(count = points.len(), label, "rectangle expanded into points");
                            queue.extend(self.engine.apply_rectangle_points(&points, label));
                        }
                        Err(e) => {
                            error!(error = %e, "rectangle processing failed");
                            effects.push(notice(
                                NoticeLevel::Error,
                                format!("failed to process the rectangle: {e}"),
                            ));
                        }
                    }
                    effects.push(Effect::BusyOff);
                }
                Action::NavigatePrev => effects.extend(self.navigate_prev().await),
                Action::NavigateNext => effects.extend(self.request_next()),
                other => effects.extend(Self::host_effect(other)),
            }
        }

        effects
    }
}
