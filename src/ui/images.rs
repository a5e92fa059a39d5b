use eframe::egui::{self, RichText, ScrollArea, Ui};

use volumen_dashboard::config::ReportImage;

// ---------------------------------------------------------------------------
// Static report images
// ---------------------------------------------------------------------------

/// URI for egui's file loader, or `None` when the image is not on disk.
pub fn image_uri(image: &ReportImage) -> Option<String> {
    if !image.path.is_file() {
        return None;
    }
    let abs = std::fs::canonicalize(&image.path).unwrap_or_else(|_| image.path.clone());
    Some(format!("file://{}", abs.display()))
}

/// Show a report image unmodified, or a note when it is absent.
pub fn report_image(ui: &mut Ui, image: &ReportImage) {
    ui.heading(image.title.as_str());
    ui.separator();

    let Some(uri) = image_uri(image) else {
        ui.label(
            RichText::new(format!(
                "The report image {} is not available yet.",
                image.path.display()
            ))
            .italics(),
        );
        return;
    };

    ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.add(egui::Image::new(uri).fit_to_original_size(1.0));
        });
}
