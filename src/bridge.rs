use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::control::{ControlKind, ControlSink};
use crate::error::OverlayError;
use crate::monitor::{Display, MonitorSelection, resolve, snapshot_or_synthetic};
use crate::overlay::{OverlayManager, RingParameters, RingPatch, SurfaceBackend, clamp_percent};

/// Outcome of a bridge call. Failures carry a reason string and are never
/// raised into the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum BridgeResult<T> {
    Success(T),
    Failure { error: String },
}

impl<T> BridgeResult<T> {
    pub fn failure(error: impl ToString) -> Self {
        BridgeResult::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BridgeResult::Success(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            BridgeResult::Success(payload) => Some(payload),
            BridgeResult::Failure { .. } => None,
        }
    }
}

impl<T> From<Result<T, OverlayError>> for BridgeResult<T> {
    fn from(result: Result<T, OverlayError>) -> Self {
        match result {
            Ok(payload) => BridgeResult::Success(payload),
            Err(e) => BridgeResult::failure(e),
        }
    }
}

/// `{"success": true, ...payload}` or `{"success": false, "error": "..."}`.
impl<T: Serialize> Serialize for BridgeResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, T> {
            success: bool,
            #[serde(flatten)]
            payload: Option<&'a T>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
        }

        let tagged = match self {
            BridgeResult::Success(payload) => Tagged {
                success: true,
                payload: Some(payload),
                error: None,
            },
            BridgeResult::Failure { error } => Tagged {
                success: false,
                payload: None,
                error: Some(error),
            },
        };
        tagged.serialize(serializer)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayList {
    pub displays: Vec<Display>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Created {
    pub count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Updated {
    pub updated: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Acknowledged {}

/// A bridge call in its serialized form.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BridgeRequest {
    ListDisplays,
    CreateOverlays {
        #[serde(default)]
        monitor: MonitorSelection,
        /// Missing fields take the panel defaults.
        #[serde(default)]
        params: RingPatch,
    },
    DestroyOverlays,
    BroadcastParameters {
        params: RingPatch,
    },
    SetMouseTransparent {
        transparent: bool,
    },
    ApplyExternalControl {
        kind: ControlKind,
        value: f32,
    },
}

/// The request/response boundary between the control state machine and the
/// overlay surfaces.
pub struct CommandBridge<B: SurfaceBackend> {
    overlays: Arc<OverlayManager<B>>,
    sink: Arc<dyn ControlSink>,
}

impl<B: SurfaceBackend> Clone for CommandBridge<B> {
    fn clone(&self) -> Self {
        Self {
            overlays: self.overlays.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<B: SurfaceBackend> CommandBridge<B> {
    pub fn new(overlays: Arc<OverlayManager<B>>, sink: Arc<dyn ControlSink>) -> Self {
        Self { overlays, sink }
    }

    pub fn overlays(&self) -> &Arc<OverlayManager<B>> {
        &self.overlays
    }

    pub async fn list_displays(&self) -> BridgeResult<DisplayList> {
        BridgeResult::Success(DisplayList {
            displays: snapshot_or_synthetic(self.overlays.displays()),
        })
    }

    pub async fn create_overlays(
        &self,
        selection: MonitorSelection,
        params: RingParameters,
    ) -> BridgeResult<Created> {
        let displays = snapshot_or_synthetic(self.overlays.displays());
        let targets = resolve(selection, &displays);
        info!(
            "Creating ring overlay for monitor selection {} ({} target(s))",
            selection,
            targets.len()
        );

        self.overlays
            .create_all(&targets, params)
            .await
            .map(|outcome| Created {
                count: outcome.count,
            })
            .inspect_err(|e| warn!("Failed to create ring overlay: {}", e))
            .into()
    }

    pub async fn destroy_overlays(&self) -> BridgeResult<Acknowledged> {
        self.overlays.destroy_all().map(|()| Acknowledged {}).into()
    }

    pub async fn broadcast_parameters(&self, patch: RingPatch) -> BridgeResult<Updated> {
        if patch.is_empty() {
            return BridgeResult::Success(Updated { updated: 0 });
        }
        self.overlays
            .broadcast(&patch)
            .map(|updated| Updated { updated })
            .into()
    }

    pub async fn set_mouse_transparent(&self, transparent: bool) -> BridgeResult<Acknowledged> {
        self.overlays
            .set_mouse_transparent(transparent)
            .map(|()| Acknowledged {})
            .into()
    }

    /// Forward a settled value to the external control sink, rounded to a
    /// whole percent.
    pub async fn apply_external_control(
        &self,
        kind: ControlKind,
        value: f32,
    ) -> BridgeResult<Acknowledged> {
        let percent = clamp_percent(value).round() as u8;
        debug!("Applying external {} control: {}%", kind, percent);
        self.sink
            .apply(kind, percent)
            .map(|()| Acknowledged {})
            .map_err(|e| OverlayError::ExternalControl {
                kind,
                reason: e.to_string(),
            })
            .into()
    }

    /// Run a serialized request and return its serialized response.
    pub async fn dispatch(&self, request: BridgeRequest) -> serde_json::Value {
        let response = match request {
            BridgeRequest::ListDisplays => serde_json::to_value(self.list_displays().await),
            BridgeRequest::CreateOverlays { monitor, params } => {
                let params = RingParameters::default().merged(&params);
                serde_json::to_value(self.create_overlays(monitor, params).await)
            }
            BridgeRequest::DestroyOverlays => serde_json::to_value(self.destroy_overlays().await),
            BridgeRequest::BroadcastParameters { params } => {
                serde_json::to_value(self.broadcast_parameters(params).await)
            }
            BridgeRequest::SetMouseTransparent { transparent } => {
                serde_json::to_value(self.set_mouse_transparent(transparent).await)
            }
            BridgeRequest::ApplyExternalControl { kind, value } => {
                serde_json::to_value(self.apply_external_control(kind, value).await)
            }
        };

        response.unwrap_or_else(|e| serde_json::json!({ "success": false, "error": e.to_string() }))
    }
}
