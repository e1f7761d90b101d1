use tracing::error;

mod app;

fn main() {
    let wiring = match app::bootstrap::build_app() {
        Ok(wiring) => wiring,
        Err(err) => {
            error!(error = %err, "startup_failed");
            std::process::exit(1);
        }
    };

    if let Err(err) = app::loop_runner::run(wiring) {
        error!(error = %err, "app_failed");
        std::process::exit(1);
    }
}
