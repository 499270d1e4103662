//! Background calibration sequence.
//!
//! The worker owns the flow controller while it runs. Each step is planned,
//! commanded, reported over a channel and then held for the stabilization
//! period. The stop flag is polled during the hold so a cancel takes effect
//! within one poll interval. Whatever happens, every instrument is commanded
//! to zero before the controller is handed back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gb_blend::AllocationRequest;
use gb_core::Address;
use gb_instruments::{FlowController, InstrumentDriver};
use gb_project::Settings;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::plan::{BlendPlan, plan_blend};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceConfig {
    pub targets: Vec<f64>,
    pub diluent_ppm: f64,
    pub source_ppm: f64,
    /// ln/min
    pub max_flow_per_channel: f64,
    pub step_duration: Duration,
}

impl SequenceConfig {
    /// Sequence over `targets` with the calibration defaults of `settings`.
    pub fn from_settings(settings: &Settings, targets: Vec<f64>) -> AppResult<Self> {
        let cal = &settings.calibration;
        let step_duration = Duration::try_from_secs_f64(cal.step_duration_s).map_err(|_| {
            AppError::InvalidInput(format!(
                "step duration {} s is not a valid duration",
                cal.step_duration_s
            ))
        })?;
        Ok(Self {
            targets,
            diluent_ppm: settings.blend.diluent_ppm,
            source_ppm: cal.source_ppm,
            max_flow_per_channel: cal.max_flow_per_channel,
            step_duration,
        })
    }

    fn request(&self, target_ppm: f64) -> AllocationRequest {
        AllocationRequest {
            target_ppm,
            source1_ppm: self.diluent_ppm,
            source2_ppm: self.source_ppm,
            max_flow_per_channel: self.max_flow_per_channel,
        }
    }
}

/// What was commanded for one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// 1-based.
    pub index: usize,
    pub total: usize,
    pub timestamp: String,
    pub plan: BlendPlan,
    /// Measured diluent flow right after commanding, ln/min.
    pub diluent_reading: Option<f64>,
    /// Measured source flow right after commanding, ln/min.
    pub source_reading: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum SequenceMessage {
    Step(StepRecord),
    Complete { steps: usize },
    Cancelled { completed: usize },
    Error { message: String },
}

enum Outcome {
    Completed(usize),
    Cancelled(usize),
}

pub struct SequenceWorker<D> {
    pub progress_rx: Receiver<SequenceMessage>,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<FlowController<D>>,
}

impl<D: InstrumentDriver + 'static> SequenceWorker<D> {
    pub fn start(controller: FlowController<D>, config: SequenceConfig) -> Self {
        let (tx, rx) = channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let mut controller = controller;
            let outcome = run_steps(&mut controller, &config, &stop_flag, &tx);
            let stopped = controller.stop_all();

            let message = match (outcome, stopped) {
                (Ok(Outcome::Completed(steps)), Ok(())) => {
                    info!("Calibration sequence finished after {} steps", steps);
                    SequenceMessage::Complete { steps }
                }
                (Ok(Outcome::Cancelled(completed)), Ok(())) => {
                    warn!("Calibration sequence cancelled after {} steps", completed);
                    SequenceMessage::Cancelled { completed }
                }
                (Err(e), _) => {
                    warn!("Calibration sequence failed: {}", e);
                    SequenceMessage::Error {
                        message: e.to_string(),
                    }
                }
                (Ok(_), Err(e)) => {
                    warn!("Failed to stop instruments: {}", e);
                    SequenceMessage::Error {
                        message: format!("failed to stop instruments: {e}"),
                    }
                }
            };
            let _ = tx.send(message);
            controller
        });

        Self {
            progress_rx: rx,
            stop,
            handle,
        }
    }

    /// Ask the worker to stop at the next poll.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and take the controller back.
    pub fn join(self) -> AppResult<FlowController<D>> {
        self.handle
            .join()
            .map_err(|_| AppError::Worker("sequence thread panicked".to_string()))
    }
}

fn run_steps<D: InstrumentDriver>(
    controller: &mut FlowController<D>,
    config: &SequenceConfig,
    stop: &AtomicBool,
    tx: &Sender<SequenceMessage>,
) -> AppResult<Outcome> {
    let total = config.targets.len();
    for (i, &target) in config.targets.iter().enumerate() {
        if stop.load(Ordering::Relaxed) {
            return Ok(Outcome::Cancelled(i));
        }

        let plan = plan_blend(&config.request(target), controller.registry())?;
        apply_plan(controller, &plan)?;

        let diluent_reading = controller.readings(plan.diluent.address)?.flow;
        let source_reading = match plan.source {
            Some(source) => controller.readings(source.address)?.flow,
            None => None,
        };
        info!(
            "Step {}/{}: {} ppm ({})",
            i + 1,
            total,
            target,
            plan.concentration_display()
        );
        let _ = tx.send(SequenceMessage::Step(StepRecord {
            index: i + 1,
            total,
            timestamp: chrono::Utc::now().to_rfc3339(),
            plan,
            diluent_reading,
            source_reading,
        }));

        if !hold(config.step_duration, stop) {
            return Ok(Outcome::Cancelled(i + 1));
        }
    }
    Ok(Outcome::Completed(total))
}

/// Command a plan. Source instruments the plan does not use are zeroed first.
pub fn apply_plan<D: InstrumentDriver>(
    controller: &mut FlowController<D>,
    plan: &BlendPlan,
) -> AppResult<()> {
    let selected = plan.source.map(|s| s.address);
    let idle: Vec<Address> = controller
        .registry()
        .sources()
        .map(|s| s.address)
        .filter(|a| Some(*a) != selected && controller.setpoint(*a) != 0.0)
        .collect();
    for address in idle {
        controller.stop(address)?;
    }

    controller.set_flow(plan.diluent.address, plan.diluent.flow)?;
    if let Some(source) = plan.source {
        controller.set_flow(source.address, source.flow)?;
    }
    Ok(())
}

/// Sleep for `duration` unless stopped; false when stopped.
fn hold(duration: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(POLL_INTERVAL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gb_instruments::SimulatedDriver;

    fn controller() -> FlowController<SimulatedDriver> {
        let registry = Settings::default().to_registry().unwrap();
        let driver = SimulatedDriver::for_registry(&registry);
        FlowController::new(driver, registry)
    }

    fn request(target: f64) -> AllocationRequest {
        AllocationRequest {
            target_ppm: target,
            source1_ppm: 0.0,
            source2_ppm: 5000.0,
            max_flow_per_channel: 1.0,
        }
    }

    #[test]
    fn switching_source_zeroes_the_previous_one() {
        let mut c = controller();

        let low = plan_blend(&request(5.0), c.registry()).unwrap();
        assert_eq!(low.source.unwrap().address, Address::new(8));
        apply_plan(&mut c, &low).unwrap();
        assert!(c.setpoint(Address::new(8)) > 0.0);

        let medium = plan_blend(&request(50.0), c.registry()).unwrap();
        assert_eq!(medium.source.unwrap().address, Address::new(5));
        apply_plan(&mut c, &medium).unwrap();
        assert_eq!(c.setpoint(Address::new(8)), 0.0);
        assert!(c.setpoint(Address::new(5)) > 0.0);
        assert_eq!(c.setpoint(Address::new(20)), 1.0);
    }

    #[test]
    fn diluent_only_step_closes_sources() {
        let mut c = controller();
        let plan = plan_blend(&request(50.0), c.registry()).unwrap();
        apply_plan(&mut c, &plan).unwrap();
        let plan = plan_blend(&request(0.0), c.registry()).unwrap();
        apply_plan(&mut c, &plan).unwrap();
        assert_eq!(c.setpoint(Address::new(5)), 0.0);
        assert_eq!(c.setpoint(Address::new(20)), 1.0);
    }

    #[test]
    fn hold_returns_early_when_stopped() {
        let stop = AtomicBool::new(true);
        let started = Instant::now();
        assert!(!hold(Duration::from_secs(10), &stop));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(hold(Duration::ZERO, &AtomicBool::new(false)));
    }

    #[test]
    fn config_rejects_negative_duration() {
        let mut settings = Settings::default();
        settings.calibration.step_duration_s = -1.0;
        assert!(SequenceConfig::from_settings(&settings, vec![1.0]).is_err());
    }
}
