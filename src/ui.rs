use crate::conf::WindowConf;
use crate::journal::Journal;
use crate::runner::Dispatcher;
use anyhow::{Result, anyhow};
use log::{debug, info};

const TITLE: &str = "People Detection System";

/// Lowest height the log panel can be squeezed to.
const MIN_HEIGHT: f32 = 300.;
const MAX_HEIGHT: f32 = 10_000.;

pub struct PeopleCountApp {
    dispatcher: Dispatcher,
    journal: Journal,
}

impl PeopleCountApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        mut dispatcher: Dispatcher,
        journal: Journal,
    ) -> Self {
        // Process wide, applied once
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let ctx = cc.egui_ctx.clone();
        dispatcher.set_notifier(move || ctx.request_repaint());

        Self {
            dispatcher,
            journal,
        }
    }
}

impl eframe::App for PeopleCountApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.dispatcher.poll(&mut self.journal) > 0 {
            debug!("Log panel holds {} entries", self.journal.len());
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(40.);
                ui.label(egui::RichText::new(TITLE).size(24.).strong());
                ui.add_space(40.);

                let run = egui::Button::new(egui::RichText::new("Run").size(16.))
                    .min_size(egui::vec2(140., 40.));
                if ui.add_enabled(!self.dispatcher.is_busy(), run).clicked() {
                    self.dispatcher.trigger();
                }
                ui.add_space(40.);
            });

            egui::Frame::group(ui.style()).show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        // A `&str` buffer keeps the text selectable but not editable
                        let mut text = self.journal.as_str();
                        ui.add(
                            egui::TextEdit::multiline(&mut text)
                                .font(egui::FontId::proportional(20.))
                                .desired_width(f32::INFINITY),
                        );
                    });
            });
        });
    }
}

/// Fixed width, free height.
fn viewport(window: &WindowConf) -> egui::ViewportBuilder {
    let viewport = egui::ViewportBuilder::default()
        .with_title(TITLE)
        .with_inner_size([window.width, window.height])
        .with_min_inner_size([window.width, MIN_HEIGHT.min(window.height)])
        .with_max_inner_size([window.width, MAX_HEIGHT])
        .with_resizable(true);

    if window.always_on_top {
        viewport.with_always_on_top()
    } else {
        viewport
    }
}

/// Blocks until the window is closed.
pub fn run(window: &WindowConf, dispatcher: Dispatcher, journal: Journal) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: viewport(window),
        centered: true,
        ..Default::default()
    };

    info!("Opening window");
    eframe::run_native(
        TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(PeopleCountApp::new(cc, dispatcher, journal)))),
    )
    .map_err(|e| anyhow!("Application error: {}", e))
}
