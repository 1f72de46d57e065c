use std::{env, fs, path::PathBuf};

use color_eyre::eyre::{self, eyre, WrapErr};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod jobs;

use jobs::Jobs;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let path: PathBuf = env::args_os()
        .nth(1)
        .ok_or_else(|| eyre!("usage: kepcore <jobs.toml>"))?
        .into();
    let text = fs::read_to_string(&path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let jobs = Jobs::parse(&text).wrap_err_with(|| format!("failed to parse {}", path.display()))?;
    debug!(
        lambert = jobs.lambert.len(),
        anomaly = jobs.anomaly.len(),
        "loaded jobs"
    );

    let report = jobs.run()?;
    println!(
        "{}",
        ron::ser::to_string_pretty(&report, ron::ser::PrettyConfig::default())?
    );
    Ok(())
}
