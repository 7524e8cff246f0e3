//! Enrollment dashboard entry point

use anyhow::Result;
use eframe::egui;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ed_data::{FileRegistry, ShadowStore, TabularDecoder};

mod files_page;
mod settings;

use files_page::FilesPage;
use settings::DashboardSettings;

struct DashboardApp {
    files_page: FilesPage,
}

impl DashboardApp {
    fn new(_cc: &eframe::CreationContext<'_>, settings: DashboardSettings) -> Self {
        let registry = FileRegistry::open(ShadowStore::new(settings.store));
        let decoder = TabularDecoder::new(settings.decoder);

        Self {
            files_page: FilesPage::new(registry, decoder, settings.preview_rows),
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.files_page.ui(ui);
        });
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = DashboardSettings::from_env();
    info!("Starting enrollment dashboard, files stored in {}", settings.store.root.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        persist_window: false,
        ..Default::default()
    };

    eframe::run_native(
        "Enrollment Dashboard",
        options,
        Box::new(move |cc| Box::new(DashboardApp::new(cc, settings))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
