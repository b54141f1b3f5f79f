use motionkit::{
    cancel_channel, init_logging, AbortReason, CartesianPosition, HomingReport, KinematicsRegistry,
    MachineConfig, MotionGateway, MotionRequest, SafetyInputs, SimulatedMachine,
    SimulationSettings,
};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => MachineConfig::load_from_file(&path)?,
        None => {
            let path = MachineConfig::default_path()?;
            if path.exists() {
                MachineConfig::load_from_file(&path)?
            } else {
                tracing::info!("No machine description at {}, using defaults", path.display());
                MachineConfig::default()
            }
        }
    };

    let registry = KinematicsRegistry::new();
    let gateway = MotionGateway::from_config(&config, &registry)?;
    let mut machine = SimulatedMachine::new(gateway, SimulationSettings::new(config.n_axis()));

    let (cancel_tx, cancel_rx) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(Some(AbortReason::Cancelled));
        }
    });

    match machine.home("", &SafetyInputs::clear(), cancel_rx).await? {
        HomingReport::Homed(axes) => tracing::info!("Homed {}", axes),
        HomingReport::Aborted { axes, reason, .. } => {
            anyhow::bail!("homing of {} aborted: {}", axes, reason)
        }
    }

    // Short square below the home pose
    let home = machine.gateway().position();
    let corners = [(-10.0, -10.0), (10.0, -10.0), (10.0, 10.0), (-10.0, 10.0), (0.0, 0.0)];
    for (dx, dy) in corners {
        let mut target = home.clone();
        target[0] += dx;
        if target.len() > 1 {
            target[1] += dy;
        }
        if target.len() > 2 {
            target[2] -= 20.0;
        }
        let segments = machine.execute(MotionRequest::linear(target.clone(), 1200.0))?;
        tracing::info!("Move to {}: {} segments", target, segments);
    }

    let jog_target = CartesianPosition::new(vec![1.0e4; config.n_axis()]);
    match machine.execute(MotionRequest::jog(jog_target, 3000.0)) {
        Ok(segments) => tracing::info!(
            "Jog stopped at {} after {} segments",
            machine.gateway().position(),
            segments
        ),
        Err(e) => tracing::warn!("Jog rejected: {}", e),
    }

    tracing::info!(
        "Done: {} segments executed",
        machine.executed_segments()
    );
    Ok(())
}
