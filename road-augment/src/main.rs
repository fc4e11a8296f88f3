use clap::Parser;
use road_augment::cli::Cli;

fn main() -> anyhow::Result<()> {
    road_augment::init_logger();

    let outcomes = road_augment::run(Cli::parse())?;
    let failed: usize = outcomes.iter().map(|o| o.report.failed_count()).sum();
    if failed > 0 {
        log::warn!("{failed} files could not be processed");
    }

    Ok(())
}
