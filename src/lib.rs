//! Annotation engine and session layer for the pointlab image labeler.
//!
//! A user pages through a set of drone images served by a small backend
//! store, places labeled point marks on each (directly, or in bulk via a
//! rectangle that the backend expands into points), and the marks persist
//! keyed by image index. This crate owns everything between raw host input
//! events and the backend wire: the view-to-image coordinate transform, the
//! mark list and its edit operations, the pointer/keyboard state machine,
//! and the load/save sequencing across navigation. The host layer is
//! responsible only for feeding [`input::InputEvent`]s in, rendering when
//! asked, and reacting to the resulting [`session::Effect`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Current-image session, navigation, and backend round trips |
//! | [`engine`] | Input-driven [`engine::EngineCore`] emitting [`engine::Action`]s |
//! | [`marks`] | Ordered mark list and its persisted sentinel form |
//! | [`viewport`] | Pan/zoom viewport and the image/canvas affine transform |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`backend`] | Backend contract, wire payloads, and the HTTP client |
//! | [`consts`] | Shared numeric constants (zoom limits, label range) |

pub mod backend;
pub mod consts;
pub mod engine;
pub mod input;
pub mod marks;
pub mod session;
pub mod viewport;
