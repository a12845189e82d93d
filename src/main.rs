use std::path::Path;

use eframe::egui;
use rusty_automl::app::AutoMlApp;
use rusty_automl::config;
use rusty_automl::session::SessionKey;
use rusty_automl::workflow::Workflow;

fn main() -> eframe::Result {
    env_logger::init();

    let workflow = match Workflow::open(Path::new(config::WORKSPACE_DIR), SessionKey::default()) {
        Ok(wf) => wf,
        Err(e) => {
            log::error!("Cannot open session: {e}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        config::APP_TITLE,
        options,
        Box::new(|_cc| Ok(Box::new(AutoMlApp::new(workflow)))),
    )
}
