use eframe::egui;
use gw_alert_filter::app::GwFilterApp;
use gw_alert_filter::config::AppConfig;
use gw_alert_filter::state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let (config, config_error) = match AppConfig::from_env() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Invalid configuration: {e:#}");
            (AppConfig::default(), Some(format!("Error: {e:#}")))
        }
    };
    let mut state = AppState::new(config);
    if config_error.is_some() {
        state.status_message = config_error;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Gravitational Wave Alert Filtering",
        options,
        Box::new(|_cc| Ok(Box::new(GwFilterApp::new(state)))),
    )
}
