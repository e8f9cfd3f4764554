use anyhow::Result;
use log::info;

use trajectory_gradients::{demo, DemoConfig, Report};

fn main() -> Result<()> {
    env_logger::init();

    let config = DemoConfig::from_env()?;
    let history = demo::run(&config)?;

    let norms = history.norms();
    for (iter, (w, b)) in norms.weight.iter().zip(&norms.bias).enumerate() {
        info!("iter {iter}: |grad_v| = {w:.6}, |grad_b| = {b:.6}");
    }

    println!("{}", Report::new(&config, &history).to_json()?);
    Ok(())
}
