use anyhow::Result;

mod app;
mod surface;
mod ui;

fn main() -> Result<()> {
    // Logs share the terminal with the charts, keep them quiet by default.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    app::run::run()
}
