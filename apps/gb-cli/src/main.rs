use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use gb_app::{
    AppError, AppResult, BlendPlan, DurationUnit, SequenceConfig, SequenceMessage, SequenceWorker,
    StepMode, build_registry, estimated_duration, generate_steps, list_instruments, load_settings,
    plan_blend, save_settings, simulated_controller, validate_settings,
};
use gb_blend::{
    AllocationRequest, allocate_two_gas_flows, format_with_uncertainty, propagate_uncertainty,
    required_flow_with_uncertainty, select_instrument, tank_fill_times,
};
use gb_core::{Address, FlowUnit};
use gb_project::Settings;
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "gb-cli")]
#[command(about = "gasblend CLI - gas blending with mass-flow controllers", long_about = None)]
struct Cli {
    /// Settings YAML file (built-in laboratory defaults when omitted)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a per-channel flow cap between two gases for a target concentration
    Allocate {
        /// Target concentration, ppm
        #[arg(long)]
        target: Option<f64>,
        /// Gas 1 concentration, ppm
        #[arg(long)]
        c1: Option<f64>,
        /// Gas 2 concentration, ppm
        #[arg(long)]
        c2: Option<f64>,
        /// Maximum flow per channel, ln/min
        #[arg(long)]
        max_flow: Option<f64>,
    },
    /// Pick the source instrument for a flow
    Select {
        /// Required flow
        flow: f64,
        /// Unit of the flow (ln/min, l/min, mln/min, ml/min)
        #[arg(long, default_value = "ln/min")]
        unit: FlowUnit,
    },
    /// Concentration uncertainty for two metered flows (mL/min)
    Uncertainty {
        #[arg(long)]
        c1: f64,
        #[arg(long)]
        flow1: f64,
        /// Address of the instrument carrying gas 1
        #[arg(long)]
        addr1: u8,
        #[arg(long)]
        c2: f64,
        #[arg(long)]
        flow2: f64,
        /// Address of the instrument carrying gas 2
        #[arg(long)]
        addr2: u8,
    },
    /// Gas 2 flow (mL/min) that brings a fixed gas 1 flow to a target
    RequiredFlow {
        #[arg(long)]
        target: f64,
        #[arg(long)]
        c1: f64,
        /// Fixed gas 1 flow, mL/min
        #[arg(long)]
        flow1: f64,
        #[arg(long)]
        addr1: u8,
        #[arg(long)]
        c2: f64,
        #[arg(long)]
        addr2: u8,
    },
    /// Allocate, select instruments and estimate the error bar
    Plan {
        /// Target concentration, ppm
        #[arg(long)]
        target: Option<f64>,
        /// Source gas concentration, ppm
        #[arg(long)]
        source: Option<f64>,
        /// Diluent concentration, ppm
        #[arg(long)]
        diluent: Option<f64>,
        /// Maximum flow per channel, ln/min
        #[arg(long)]
        max_flow: Option<f64>,
    },
    /// Minutes each gas must flow to fill a tank to a concentration
    TankTimes {
        /// Gas 1 flow, ln/min
        #[arg(long)]
        q1: f64,
        /// Gas 2 flow, ln/min
        #[arg(long)]
        q2: f64,
        /// Tank volume, liters
        #[arg(long)]
        volume: f64,
        /// Tank concentration, ppm
        #[arg(long)]
        target: f64,
        #[arg(long)]
        c1: f64,
        #[arg(long)]
        c2: f64,
    },
    /// Preview calibration steps and the run time
    Steps(StepArgs),
    /// Run a calibration sequence against the simulated bus
    Simulate {
        #[command(flatten)]
        args: StepArgs,
    },
    /// Manage the settings file
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Args)]
struct StepArgs {
    /// First target, ppm
    #[arg(long)]
    initial: Option<f64>,
    /// Last target, ppm
    #[arg(long = "final")]
    last: Option<f64>,
    /// Number of steps
    #[arg(long)]
    steps: Option<usize>,
    /// Append the way back down
    #[arg(long)]
    back_and_forth: bool,
    /// Explicit targets instead of a linear ramp
    #[arg(long, value_delimiter = ',')]
    manual: Option<Vec<f64>>,
    /// Duration of each step
    #[arg(long)]
    duration: Option<f64>,
    /// Unit of the step duration (seconds, minutes, hours)
    #[arg(long, default_value = "seconds")]
    duration_unit: DurationUnit,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Write the default settings to a file
    Init {
        path: PathBuf,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check a settings file
    Validate { path: PathBuf },
    /// Print the instrument table
    Show,
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = match &cli.command {
        // these work on their own file
        Commands::Settings(SettingsCommands::Validate { .. } | SettingsCommands::Init { .. }) => {
            Settings::default()
        }
        _ => load_settings(cli.settings.as_deref())?,
    };
    let json = cli.json;

    match cli.command {
        Commands::Allocate {
            target,
            c1,
            c2,
            max_flow,
        } => {
            let request = AllocationRequest {
                target_ppm: target.unwrap_or(settings.blend.target_ppm),
                source1_ppm: c1.unwrap_or(settings.blend.diluent_ppm),
                source2_ppm: c2.unwrap_or(settings.blend.source_ppm),
                max_flow_per_channel: max_flow.unwrap_or(settings.blend.max_flow_per_channel),
            };
            cmd_allocate(&request, json)
        }
        Commands::Select { flow, unit } => cmd_select(&settings, flow, unit, json),
        Commands::Uncertainty {
            c1,
            flow1,
            addr1,
            c2,
            flow2,
            addr2,
        } => cmd_uncertainty(&settings, (c1, flow1, addr1), (c2, flow2, addr2), json),
        Commands::RequiredFlow {
            target,
            c1,
            flow1,
            addr1,
            c2,
            addr2,
        } => cmd_required_flow(&settings, target, (c1, flow1, addr1), (c2, addr2), json),
        Commands::Plan {
            target,
            source,
            diluent,
            max_flow,
        } => {
            let request = AllocationRequest {
                target_ppm: target.unwrap_or(settings.blend.target_ppm),
                source1_ppm: diluent.unwrap_or(settings.blend.diluent_ppm),
                source2_ppm: source.unwrap_or(settings.blend.source_ppm),
                max_flow_per_channel: max_flow.unwrap_or(settings.blend.max_flow_per_channel),
            };
            cmd_plan(&settings, &request, json)
        }
        Commands::TankTimes {
            q1,
            q2,
            volume,
            target,
            c1,
            c2,
        } => cmd_tank_times(q1, q2, volume, target, c1, c2, json),
        Commands::Steps(args) => cmd_steps(&settings, &args, json),
        Commands::Simulate { args } => cmd_simulate(&settings, &args, json),
        Commands::Settings(cmd) => match cmd {
            SettingsCommands::Init { path, force } => cmd_settings_init(&path, force),
            SettingsCommands::Validate { path } => cmd_settings_validate(&path),
            SettingsCommands::Show => cmd_settings_show(&settings, json),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{}", text);
    Ok(())
}

fn cmd_allocate(request: &AllocationRequest, json: bool) -> AppResult<()> {
    let result = allocate_two_gas_flows(request)?;
    if json {
        return print_json(&result);
    }
    println!(
        "Target {} ppm from {} ppm and {} ppm (cap {} ln/min)",
        request.target_ppm, request.source1_ppm, request.source2_ppm, request.max_flow_per_channel
    );
    println!("  r1 = {:.6}, r2 = {:.6}", result.ratio.r1, result.ratio.r2);
    println!("  Q1 = {:.6} ln/min", result.flow1);
    println!("  Q2 = {:.6} ln/min", result.flow2);
    Ok(())
}

fn cmd_select(settings: &Settings, flow: f64, unit: FlowUnit, json: bool) -> AppResult<()> {
    let registry = build_registry(settings)?;
    let flow_lpm = unit.convert(flow, FlowUnit::CANONICAL);
    let selection = select_instrument(flow_lpm, registry.sources())?;
    if json {
        return print_json(&selection);
    }
    let spec = registry.get(selection.address)?;
    println!(
        "Address {} ({}) at {:.1}% of full scale",
        selection.address,
        spec.name,
        selection.utilization * 100.0
    );
    Ok(())
}

fn cmd_uncertainty(
    settings: &Settings,
    (c1, flow1, addr1): (f64, f64, u8),
    (c2, flow2, addr2): (f64, f64, u8),
    json: bool,
) -> AppResult<()> {
    let registry = build_registry(settings)?;
    let spec1 = registry.get(Address::new(addr1))?;
    let spec2 = registry.get(Address::new(addr2))?;
    let result = propagate_uncertainty(c1, flow1, c2, flow2, spec1, spec2);
    if json {
        return print_json(&result);
    }
    println!(
        "C = {}",
        format_with_uncertainty(
            result.expected_concentration_ppm,
            result.u_concentration_ppm,
            "ppm"
        )
    );
    println!("  relative: {:.3}%", result.relative_pct());
    println!("  u(F1) = {:.4} mL/min, u(F2) = {:.4} mL/min", result.u_flow1, result.u_flow2);
    println!(
        "  dC/dF1 = {:.4e}, dC/dF2 = {:.4e} ppm per mL/min",
        result.sensitivity_dc_df1, result.sensitivity_dc_df2
    );
    Ok(())
}

fn cmd_required_flow(
    settings: &Settings,
    target: f64,
    (c1, flow1, addr1): (f64, f64, u8),
    (c2, addr2): (f64, u8),
    json: bool,
) -> AppResult<()> {
    let registry = build_registry(settings)?;
    let spec1 = registry.get(Address::new(addr1))?;
    let spec2 = registry.get(Address::new(addr2))?;
    let result = required_flow_with_uncertainty(target, c1, flow1, c2, spec1, spec2)?;
    if json {
        return print_json(&result);
    }
    println!("F2 = {:.4} mL/min", result.flow2_ml_per_min);
    println!(
        "C = {} ({:.3}%)",
        format_with_uncertainty(
            result.achieved_concentration_ppm,
            result.uncertainty.u_concentration_ppm,
            "ppm"
        ),
        result.relative_error_pct
    );
    Ok(())
}

fn print_plan(plan: &BlendPlan) {
    println!(
        "  Diluent: address {} at {:.6} ln/min ({:.1}% FS)",
        plan.diluent.address,
        plan.diluent.flow,
        plan.diluent.utilization * 100.0
    );
    match plan.source {
        Some(source) => println!(
            "  Source:  address {} at {:.6} ln/min ({:.1}% FS)",
            source.address,
            source.flow,
            source.utilization * 100.0
        ),
        None => println!("  Source:  closed"),
    }
    println!(
        "  C = {} ({:.3}%)",
        plan.concentration_display(),
        plan.uncertainty.relative_pct()
    );
}

fn cmd_plan(settings: &Settings, request: &AllocationRequest, json: bool) -> AppResult<()> {
    let registry = build_registry(settings)?;
    let plan = plan_blend(request, &registry)?;
    if json {
        return print_json(&plan);
    }
    println!("Plan for {} ppm:", request.target_ppm);
    print_plan(&plan);
    Ok(())
}

fn cmd_tank_times(
    q1: f64,
    q2: f64,
    volume: f64,
    target: f64,
    c1: f64,
    c2: f64,
    json: bool,
) -> AppResult<()> {
    let times = tank_fill_times(q1, q2, volume, target, c1, c2)?;
    if json {
        return print_json(&times);
    }
    println!("t1 = {:.2} min (both gases)", times.t1_min);
    println!("t2 = {:.2} min (gas 2 only)", times.t2_min);
    println!("total = {:.2} min", times.total_min());
    Ok(())
}

fn step_mode(settings: &Settings, args: &StepArgs) -> StepMode {
    match &args.manual {
        Some(values) => StepMode::Manual(values.clone()),
        None => StepMode::Automatic {
            initial_ppm: args.initial.unwrap_or(settings.calibration.initial_ppm),
            final_ppm: args.last.unwrap_or(settings.calibration.final_ppm),
            steps: args.steps.unwrap_or(settings.calibration.steps),
            back_and_forth: args.back_and_forth || settings.calibration.back_and_forth,
        },
    }
}

/// Step duration in `args.duration_unit`, and the same in seconds.
fn step_duration(settings: &Settings, args: &StepArgs) -> (f64, f64) {
    match args.duration {
        Some(d) => (d, d * args.duration_unit.seconds_per_unit()),
        None => {
            let s = settings.calibration.step_duration_s;
            (s / args.duration_unit.seconds_per_unit(), s)
        }
    }
}

#[derive(Serialize)]
struct StepPreview {
    targets: Vec<f64>,
    estimated_duration: String,
    total_seconds: f64,
}

fn cmd_steps(settings: &Settings, args: &StepArgs, json: bool) -> AppResult<()> {
    let targets = generate_steps(&step_mode(settings, args))?;
    let (duration, _) = step_duration(settings, args);
    let estimate = estimated_duration(targets.len(), duration, args.duration_unit);

    if json {
        return print_json(&StepPreview {
            estimated_duration: estimate.to_string(),
            total_seconds: estimate.total_seconds(),
            targets,
        });
    }
    for (i, step) in targets.iter().enumerate() {
        println!("Step {:3}: {:8.2} ppm", i + 1, step);
    }
    println!(
        "Total: {} steps | Estimated time: {}",
        estimate.steps, estimate
    );
    Ok(())
}

fn cmd_simulate(settings: &Settings, args: &StepArgs, json: bool) -> AppResult<()> {
    let targets = generate_steps(&step_mode(settings, args))?;
    let (_, seconds) = step_duration(settings, args);

    let mut config = SequenceConfig::from_settings(settings, targets)?;
    config.step_duration = Duration::try_from_secs_f64(seconds)
        .map_err(|_| AppError::InvalidInput(format!("invalid step duration {seconds} s")))?;

    let controller = simulated_controller(settings)?;
    info!(
        "Simulating {} steps of {:?} each",
        config.targets.len(),
        config.step_duration
    );
    let worker = SequenceWorker::start(controller, config);

    let mut failure = None;
    for message in worker.progress_rx.iter() {
        match message {
            SequenceMessage::Step(record) => {
                if json {
                    print_json(&record)?;
                } else {
                    println!(
                        "[{}] Step {}/{}: {} ppm",
                        record.timestamp, record.index, record.total, record.plan.request.target_ppm
                    );
                    print_plan(&record.plan);
                }
            }
            SequenceMessage::Complete { steps } => {
                if !json {
                    println!("✓ Sequence completed ({} steps)", steps);
                }
            }
            SequenceMessage::Cancelled { completed } => {
                println!("Sequence cancelled after {} steps", completed);
            }
            SequenceMessage::Error { message } => failure = Some(message),
        }
    }
    let _controller = worker.join()?;

    match failure {
        Some(message) => Err(AppError::Worker(message)),
        None => Ok(()),
    }
}

fn cmd_settings_init(path: &Path, force: bool) -> AppResult<()> {
    save_settings(path, &Settings::default(), force)?;
    println!("✓ Wrote default settings to {}", path.display());
    Ok(())
}

fn cmd_settings_validate(path: &Path) -> AppResult<()> {
    println!("Validating settings: {}", path.display());
    let settings = load_settings(Some(path))?;
    validate_settings(&settings)?;
    println!("✓ Settings are valid");
    Ok(())
}

fn cmd_settings_show(settings: &Settings, json: bool) -> AppResult<()> {
    let registry = build_registry(settings)?;
    let rows = list_instruments(&registry);
    if json {
        return print_json(&rows);
    }
    println!(
        "Connection: {} @ {} baud",
        settings.connection.port, settings.connection.baud_rate
    );
    println!("Instruments:");
    for row in rows {
        println!(
            "  {:>3}  {:<12} {:<9} {:<22} {}",
            row.address, row.name, row.role, row.range, row.accuracy
        );
    }
    Ok(())
}
