//! Upload, overview and details of the files used by the dashboard

use std::path::PathBuf;
use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use eframe::egui::{self, Ui};
use tracing::{info, warn};

use ed_core::{Category, Upload};
use ed_data::{ColumnOverview, FileRegistry, FileSummary, TabularDecoder};

/// Extensions offered by the upload dialog
const UPLOAD_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Decoded view of the file picked in the details section
struct FileDetails {
    name: String,
    category: Category,
    /// Column overview and leading rows, or the message to show instead
    content: Result<Option<(Vec<ColumnOverview>, RecordBatch)>, String>,
}

pub struct FilesPage {
    registry: FileRegistry,
    decoder: TabularDecoder,
    preview_rows: usize,

    selected_category: Category,
    selected_file: Option<String>,

    /// Cleared whenever the registry changes
    summaries: Option<Vec<FileSummary>>,
    details: Option<FileDetails>,
    status: Option<String>,
}

impl FilesPage {
    pub fn new(registry: FileRegistry, decoder: TabularDecoder, preview_rows: usize) -> Self {
        Self {
            registry,
            decoder,
            preview_rows,
            selected_category: Category::Descriptive,
            selected_file: None,
            summaries: None,
            details: None,
            status: None,
        }
    }

    /// Register local files under `category`, returning how many were new
    pub fn register_paths(&mut self, paths: Vec<PathBuf>, category: Category) -> usize {
        let uploads: Vec<Upload> = paths
            .iter()
            .filter_map(|path| match Upload::from_path(path) {
                Ok(upload) => Some(upload),
                Err(err) => {
                    warn!("Could not read {}: {}", path.display(), err);
                    None
                }
            })
            .collect();

        let added = self.registry.register(uploads, category);
        self.status = Some(format!("{} file(s) added to {}", added, category.label()));
        self.invalidate();
        added
    }

    pub fn remove(&mut self, name: &str, category: Category) {
        self.registry.remove(name, category);
        if self.selected_file.as_deref() == Some(name) && self.selected_category == category {
            self.selected_file = None;
        }
        self.status = Some(format!("{} removed", name));
        self.invalidate();
    }

    pub fn clear(&mut self, category: Category) {
        self.registry.clear(Some(category));
        if self.selected_category == category {
            self.selected_file = None;
        }
        self.status = Some(format!("All {} files removed", category.label()));
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.summaries = None;
        self.details = None;
    }

    fn summaries(&mut self) -> &[FileSummary] {
        if self.summaries.is_none() {
            let summaries = self
                .registry
                .list(None)
                .into_iter()
                .map(|mut handle| FileSummary::describe(&self.decoder, &mut handle))
                .collect();
            self.summaries = Some(summaries);
        }
        self.summaries.as_deref().unwrap_or_default()
    }

    fn load_details(&self, name: &str, category: Category) -> FileDetails {
        let content = match self.registry.get(name, category) {
            Some(mut handle) => self
                .decoder
                .read_table(&mut handle, name)
                .map(|table| table.map(|t| (t.overview(), t.head(self.preview_rows))))
                .map_err(|err| err.to_string()),
            None => Err(format!("{} is no longer available", name)),
        };

        FileDetails {
            name: name.to_string(),
            category,
            content,
        }
    }

    fn details(&mut self) -> Option<&FileDetails> {
        let name = self.selected_file.clone()?;
        let category = self.selected_category;
        let stale = self
            .details
            .as_ref()
            .map_or(true, |d| d.name != name || d.category != category);
        if stale {
            info!("Loading details for {}", name);
            self.details = Some(self.load_details(&name, category));
        }
        self.details.as_ref()
    }

    pub fn ui(&mut self, ui: &mut Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            self.upload_ui(ui);
            ui.separator();
            self.overview_ui(ui);
            ui.separator();
            self.details_ui(ui);
        });
    }

    fn upload_ui(&mut self, ui: &mut Ui) {
        ui.heading("Upload files");

        for category in Category::ALL {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(category.label()).strong());

                if ui.button("📁 Add files...").clicked() {
                    if let Some(paths) = rfd::FileDialog::new()
                        .add_filter("CSV or Excel", &UPLOAD_EXTENSIONS)
                        .pick_files()
                    {
                        self.register_paths(paths, category);
                    }
                }

                if ui.button("🗑 Remove all").clicked() {
                    self.clear(category);
                }
            });
        }

        if let Some(status) = &self.status {
            ui.label(status);
        }
    }

    fn overview_ui(&mut self, ui: &mut Ui) {
        ui.heading("Uploaded files");

        let summaries = self.summaries().to_vec();
        if summaries.is_empty() {
            ui.label("No files uploaded yet.");
            return;
        }

        let or_dash = |value: Option<usize>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
        egui::Grid::new("uploaded_files")
            .striped(true)
            .num_columns(6)
            .show(ui, |ui| {
                for title in ["Category", "Format", "Size", "Columns", "Rows", "File name"] {
                    ui.strong(title);
                }
                ui.end_row();

                for summary in &summaries {
                    ui.label(summary.category.label());
                    ui.label(summary.format);
                    ui.label(summary.size_label());
                    ui.label(or_dash(summary.columns));
                    ui.label(or_dash(summary.rows));
                    ui.label(&summary.name);
                    ui.end_row();
                }
            });
    }

    fn details_ui(&mut self, ui: &mut Ui) {
        ui.heading("File details");

        ui.horizontal(|ui| {
            let before = self.selected_category;
            egui::ComboBox::from_id_source("details_category")
                .selected_text(self.selected_category.label())
                .show_ui(ui, |ui| {
                    for category in Category::ALL {
                        ui.selectable_value(&mut self.selected_category, category, category.label());
                    }
                });
            if before != self.selected_category {
                self.selected_file = None;
            }

            let names: Vec<String> = self
                .registry
                .files(self.selected_category)
                .iter()
                .map(|h| h.name().to_string())
                .collect();
            egui::ComboBox::from_id_source("details_file")
                .selected_text(self.selected_file.as_deref().unwrap_or("Select a file"))
                .show_ui(ui, |ui| {
                    for name in names {
                        let label = name.clone();
                        ui.selectable_value(&mut self.selected_file, Some(name), label);
                    }
                });
        });

        let Some(details) = self.details() else {
            return;
        };

        let mut remove_clicked = false;
        match &details.content {
            Ok(Some((overview, preview))) => {
                ui.label(egui::RichText::new("Column overview").strong());
                overview_table(ui, overview);
                ui.add_space(8.0);
                ui.label(egui::RichText::new(format!("First {} rows", preview.num_rows())).strong());
                preview_table(ui, preview);
            }
            Ok(None) => {
                ui.label(format!("{} is not a CSV or Excel file.", details.name));
            }
            Err(message) => {
                ui.colored_label(ui.visuals().error_fg_color, message);
            }
        }

        ui.add_space(8.0);
        if ui.button(format!("🗑 Remove {}", details.name)).clicked() {
            remove_clicked = true;
        }

        if remove_clicked {
            let (name, category) = (details.name.clone(), details.category);
            self.remove(&name, category);
        }
    }
}

fn overview_table(ui: &mut Ui, overview: &[ColumnOverview]) {
    use egui_extras::{Column, TableBuilder};

    ui.push_id("column_overview", |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::initial(160.0).at_least(80.0))
            .columns(Column::initial(90.0).at_least(60.0), 4)
            .header(20.0, |mut header| {
                for title in ["Column", "Type", "Values", "Missing", "Unique"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for column in overview {
                    body.row(18.0, |mut row| {
                        row.col(|ui| { ui.label(&column.name); });
                        row.col(|ui| { ui.label(column.data_type); });
                        row.col(|ui| { ui.label(column.count.to_string()); });
                        row.col(|ui| { ui.label(column.missing.to_string()); });
                        row.col(|ui| { ui.label(column.distinct.to_string()); });
                    });
                }
            });
    });
}

fn preview_table(ui: &mut Ui, batch: &RecordBatch) {
    use egui_extras::{Column, TableBuilder};

    let schema = batch.schema();
    ui.push_id("file_preview", |ui| {
        egui::ScrollArea::horizontal().show(ui, |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .columns(Column::initial(120.0).at_least(60.0).clip(true), batch.num_columns())
                .header(20.0, |mut header| {
                    for field in schema.fields() {
                        header.col(|ui| {
                            ui.strong(field.name());
                        });
                    }
                })
                .body(|mut body| {
                    for row_idx in 0..batch.num_rows() {
                        body.row(18.0, |mut row| {
                            for column in batch.columns() {
                                row.col(|ui| {
                                    if column.is_valid(row_idx) {
                                        ui.label(array_value_to_string(column, row_idx).unwrap_or_default());
                                    }
                                });
                            }
                        });
                    }
                });
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed_data::{ShadowStore, StoreConfig};

    fn page(dir: &tempfile::TempDir) -> FilesPage {
        let registry = FileRegistry::open(ShadowStore::new(StoreConfig::at(dir.path().join("store"))));
        FilesPage::new(registry, TabularDecoder::default(), 5)
    }

    #[test]
    fn test_register_and_summarize() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("aanmeldingen.csv");
        std::fs::write(&csv, "id;waarde\n1;10\n2;20\n").unwrap();

        let mut page = page(&dir);
        let missing = dir.path().join("missing.csv");
        assert_eq!(page.register_paths(vec![csv.clone(), missing], Category::Descriptive), 1);
        assert_eq!(page.register_paths(vec![csv], Category::Descriptive), 0);

        let summaries = page.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].columns, Some(2));
        assert_eq!(summaries[0].rows, Some(2));
    }

    #[test]
    fn test_details_follow_removal() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("a.csv");
        std::fs::write(&csv, "x,y\n1,2\n3,4\n5,6\n7,8\n9,10\n11,12\n").unwrap();

        let mut page = page(&dir);
        page.register_paths(vec![csv], Category::Descriptive);
        page.selected_file = Some("a.csv".to_string());

        let details = page.details().unwrap();
        let Ok(Some((overview, preview))) = &details.content else {
            panic!("expected a decoded table");
        };
        assert_eq!(overview.len(), 2);
        assert_eq!(preview.num_rows(), 5);

        page.remove("a.csv", Category::Descriptive);
        assert!(page.selected_file.is_none());
        assert!(page.details().is_none());
        assert!(page.summaries().is_empty());
    }
}
