use super::sequencer::{RequestSequencer, RequestToken, SequencingPolicy};
use crate::{
    diagnostics::{Component, Diagnostics, SharedSink},
    error::{ControlError, TransportError},
    transport::Transport,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use urbanpulse_schemas::{
    camera::CameraSelection,
    simulation::{SimulationRequest, SimulationResponse},
};

pub const DEFAULT_REDUCTION_PCT: f64 = 30.0;
pub const MIN_REDUCTION_PCT: f64 = 0.0;
pub const MAX_REDUCTION_PCT: f64 = 100.0;

/// Clamps a reduction percentage to `[0, 100]`. `NaN` maps to 0.
pub fn clamp_reduction(value: f64) -> f64 {
    if value.is_nan() {
        MIN_REDUCTION_PCT
    } else {
        value.clamp(MIN_REDUCTION_PCT, MAX_REDUCTION_PCT)
    }
}

/// Holds one unit of the panel's in-flight count until dropped.
#[derive(Debug)]
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An issued simulation request awaiting its response.
///
/// The panel stays busy while the ticket is alive, so an abandoned request
/// releases the run button when its ticket is dropped.
#[derive(Debug)]
pub struct SimulationTicket {
    token: RequestToken,
    request: SimulationRequest,
    _in_flight: InFlight,
}

impl SimulationTicket {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn request(&self) -> &SimulationRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    /// The response should replace the displayed result.
    Applied(SimulationResponse),
    /// The request failed; the panel now shows this message as its error.
    Failed(String),
    /// A newer result is already displayed; the response was dropped.
    Stale,
}

/// Reduction slider, run/reset buttons and inline error line.
#[derive(Debug)]
pub struct ControlPanel {
    reduction_pct: f64,
    in_flight: Arc<AtomicUsize>,
    error: Option<String>,
    sequencer: RequestSequencer,
    diagnostics: Diagnostics,
}

impl ControlPanel {
    pub fn new(policy: SequencingPolicy, sink: SharedSink) -> Self {
        Self {
            reduction_pct: DEFAULT_REDUCTION_PCT,
            in_flight: Arc::new(AtomicUsize::new(0)),
            error: None,
            sequencer: RequestSequencer::new(policy),
            diagnostics: Diagnostics::new(sink, Component::Control),
        }
    }

    pub fn reduction_pct(&self) -> f64 {
        self.reduction_pct
    }

    /// Moves the slider; the stored value is always within `[0, 100]`.
    pub fn set_reduction(&mut self, value: f64) -> f64 {
        self.reduction_pct = clamp_reduction(value);
        self.reduction_pct
    }

    /// True while at least one request is in flight; the run button is disabled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn policy(&self) -> SequencingPolicy {
        self.sequencer.policy()
    }

    /// Checks the camera precondition and issues a request ticket.
    ///
    /// Does not consult the busy flag, so overlapping tickets are possible;
    /// their responses are reconciled by the sequencing policy in [`Self::settle`].
    pub fn begin_simulation(&mut self, cameras: &[CameraSelection]) -> Result<SimulationTicket, ControlError> {
        if cameras.is_empty() {
            let err = ControlError::NoCameraSelected;
            self.error = Some(err.to_string());
            self.diagnostics.warn(err.to_string());
            return Err(err);
        }

        let in_flight = InFlight::enter(&self.in_flight);
        self.error = None;

        let request = SimulationRequest {
            vehicle_reduction: clamp_reduction(self.reduction_pct),
            cameras: cameras.to_vec(),
        };
        let token = self.sequencer.issue();
        self.diagnostics.info(format!(
            "Sending request #{}: vehicle_reduction={} cameras={}",
            token.value(),
            request.vehicle_reduction,
            request.cameras.len()
        ));
        Ok(SimulationTicket {
            token,
            request,
            _in_flight: in_flight,
        })
    }

    /// Applies the outcome of a ticket and releases its share of the busy flag.
    ///
    /// An outcome is stale when the sequencer has already seen a newer request
    /// settle; stale successes and failures are both dropped.
    pub fn settle(
        &mut self,
        ticket: SimulationTicket,
        outcome: Result<SimulationResponse, TransportError>,
    ) -> SimulationOutcome {
        let token = ticket.token;
        drop(ticket);

        if !self.sequencer.settle(token) {
            match &outcome {
                Ok(_) => self
                    .diagnostics
                    .warn(format!("Discarding stale simulation result #{}", token.value())),
                Err(e) => self
                    .diagnostics
                    .warn(format!("Ignoring failure of stale request #{}: {}", token.value(), e)),
            }
            return SimulationOutcome::Stale;
        }

        match outcome {
            Ok(response) => {
                self.diagnostics
                    .info(format!("Simulation result #{} received", token.value()));
                self.error = None;
                SimulationOutcome::Applied(response)
            }
            Err(e) => {
                let message = e.to_string();
                self.diagnostics.error(format!("Simulation error: {}", message));
                self.error = Some(message.clone());
                SimulationOutcome::Failed(message)
            }
        }
    }

    /// The run button: rejected while busy, otherwise one request end to end.
    pub async fn run_simulation<T: Transport>(
        &mut self,
        transport: &T,
        cameras: &[CameraSelection],
    ) -> Result<SimulationOutcome, ControlError> {
        if self.is_busy() {
            return Err(ControlError::Busy);
        }
        let ticket = self.begin_simulation(cameras)?;
        let outcome = transport.simulate(ticket.request()).await;
        Ok(self.settle(ticket, outcome))
    }

    /// Restores the default percentage and clears the error.
    ///
    /// In-flight requests are not cancelled.
    pub fn reset(&mut self) {
        self.reduction_pct = DEFAULT_REDUCTION_PCT;
        self.error = None;
    }
}
