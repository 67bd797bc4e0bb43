// src/app.rs
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use eframe::egui;
use tracing::{error, info, warn};

use crate::command::Command;
use crate::config::AppConfig;
use crate::data::DataExporter;
use crate::geometry::HandChirality;
use crate::gesture::{FingersUp, GestureLabel, OkPolicy};
use crate::headless::{forward_command, open_sink};
use crate::mediapipe_bridge::{LandmarkProvider, MediaPipeWrapper};
use crate::tracking::{GestureTracker, TrackingResult};
use crate::transport::{list_ports, pick_port, CommandSink, PortEntry};
use crate::ui::{draw_hand_skeleton, Theme, VideoWidget};
use crate::video::{list_cameras, CameraEntry, VideoSource};

pub struct GestureApp {
    // Core components
    tracker: GestureTracker,
    provider: Box<dyn LandmarkProvider>,
    video_source: Option<VideoSource>,
    cameras: Vec<CameraEntry>,
    ports: Vec<PortEntry>,
    sink: Option<Box<dyn CommandSink>>,
    exporter: DataExporter,

    // UI state
    theme: Theme,
    video_widget: VideoWidget,
    show_settings: bool,
    show_about: bool,
    status: Option<String>,

    // Recording state
    is_recording: bool,
    recording_start: Option<DateTime<Local>>,
    recording_duration: Duration,

    current_result: TrackingResult,
    last_command: Option<(Command, DateTime<Local>)>,

    config: AppConfig,
    config_path: Option<PathBuf>,
}

impl GestureApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig, config_path: Option<PathBuf>) -> Self {
        let cameras = list_cameras().unwrap_or_else(|e| {
            warn!("{}", e);
            Vec::new()
        });

        let ports = scan_ports();

        let mut app = Self {
            tracker: GestureTracker::new(config.classifier.clone(), config.capture.max_hands),
            provider: Box::new(MediaPipeWrapper::new()),
            video_source: None,
            cameras,
            ports,
            sink: None,
            exporter: DataExporter::new(&config.output.directory, None),
            theme: Theme::default(),
            video_widget: VideoWidget::new(),
            show_settings: false,
            show_about: false,
            status: None,
            is_recording: false,
            recording_start: None,
            recording_duration: Duration::ZERO,
            current_result: TrackingResult::default(),
            last_command: None,
            config,
            config_path,
        };

        app.open_camera(app.config.capture.camera_index);
        app.select_port();
        if app.config.transport.enabled {
            app.connect_sink();
        }
        app
    }

    fn open_camera(&mut self, index: u32) {
        self.video_source = None;
        self.video_widget.clear();
        self.tracker.reset();
        self.current_result = TrackingResult::default();

        match VideoSource::open(index, self.config.capture.mirror) {
            Ok(source) => {
                self.config.capture.camera_index = index;
                self.status = None;
                self.video_source = Some(source);
            }
            Err(e) => {
                error!("{}", e);
                self.status = Some(e.to_string());
            }
        }
    }

    fn select_port(&mut self) {
        if let Some(port) = pick_port(&self.ports, self.config.transport.port.as_deref()) {
            self.config.transport.port = Some(port);
        }
    }

    fn connect_sink(&mut self) {
        match open_sink(&self.config) {
            Ok(sink) => {
                info!("Commands go to {}", sink.describe());
                self.sink = Some(sink);
            }
            Err(e) => {
                error!("{:#}", e);
                self.status = Some(format!("{:#}", e));
                self.config.transport.enabled = false;
            }
        }
    }

    fn process_frame(&mut self, ctx: &egui::Context) {
        let Some(camera) = self.video_source.as_mut() else {
            return;
        };

        let start = Instant::now();
        match camera.read_frame() {
            Ok(frame) => {
                let detection = self.provider.detect(&frame);
                let result = self.tracker.process_detection(detection);
                self.tracker.record_loop_time(start.elapsed());
                self.video_widget.update_frame(ctx, &frame);
                self.handle_result(result);
            }
            Err(e) => {
                warn!("{}", e);
                self.status = Some(e.to_string());
                self.video_source = None;
                self.video_widget.clear();
            }
        }
    }

    fn handle_result(&mut self, result: TrackingResult) {
        if let Some(command) = result.command {
            self.last_command = Some((command, Local::now()));
        }

        if self.sink.is_some() {
            forward_command(&mut self.sink, &result);
            if self.sink.is_none() {
                self.config.transport.enabled = false;
                self.status = Some("Controller disconnected, command output disabled".into());
            }
        }

        if self.is_recording {
            if let Err(e) = self.exporter.add_frame(&result) {
                error!("{:#}", e);
                self.status = Some(format!("Recording stopped: {:#}", e));
                self.is_recording = false;
                self.recording_start = None;
            }
        }
        self.current_result = result;
    }

    fn toggle_recording(&mut self) {
        self.is_recording = !self.is_recording;

        if self.is_recording {
            self.exporter = DataExporter::new(&self.config.output.directory, None);
            self.recording_start = Some(Local::now());
        } else {
            self.recording_start = None;
            self.recording_duration = Duration::ZERO;
            self.save_session();
        }
    }

    fn save_session(&mut self) {
        if self.exporter.is_empty() {
            return;
        }

        self.status = Some(match self.exporter.generate_report() {
            Ok(_) => format!("Session saved to {}", self.exporter.session_dir().display()),
            Err(e) => {
                error!("{:#}", e);
                format!("Failed to save session: {:#}", e)
            }
        });
    }

    fn export_data_to_csv(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name("gesture_data.csv")
            .save_file()
        else {
            return;
        };

        self.status = Some(match self.exporter.export_csv_to(&path) {
            Ok(path) => format!("Exported {} frames to {}", self.exporter.len(), path.display()),
            Err(e) => format!("Export failed: {:#}", e),
        });
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            egui::menu::bar(ui, |ui| {
                ui.heading("Hand Gesture Control");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("ℹ About").clicked() {
                        self.show_about = !self.show_about;
                    }
                    if ui.button("⚙ Settings").clicked() {
                        self.show_settings = !self.show_settings;
                    }
                });
            });
            ui.add_space(6.0);
        });
    }

    fn render_control_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("control_panel")
            .resizable(false)
            .exact_width(300.0)
            .show(ctx, |ui| {
                ui.add_space(10.0);
                ui.heading("Control Panel");
                ui.separator();

                self.render_camera_selector(ui);
                ui.add_space(10.0);

                ui.group(|ui| {
                    ui.set_width(ui.available_width());
                    self.render_gesture_panel(ui);
                });
                ui.add_space(10.0);

                ui.group(|ui| {
                    ui.set_width(ui.available_width());
                    self.render_command_panel(ui);
                });
                ui.add_space(10.0);

                ui.group(|ui| {
                    ui.set_width(ui.available_width());
                    self.render_recording_panel(ui);
                });
            });
    }

    fn render_camera_selector(&mut self, ui: &mut egui::Ui) {
        let current = self.config.capture.camera_index;
        let selected_text = self
            .cameras
            .iter()
            .find(|c| c.index == current)
            .map(|c| c.label())
            .unwrap_or_else(|| format!("Camera {}", current));

        let mut chosen = current;
        ui.label("Select Camera:");
        egui::ComboBox::from_id_source("camera_select")
            .selected_text(selected_text)
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for camera in &self.cameras {
                    ui.selectable_value(&mut chosen, camera.index, camera.label());
                }
            });

        if chosen != current {
            self.open_camera(chosen);
        }

        ui.horizontal(|ui| {
            if ui.checkbox(&mut self.config.capture.mirror, "Mirror image").changed() {
                if let Some(camera) = self.video_source.as_mut() {
                    camera.set_mirror(self.config.capture.mirror);
                }
            }
            if ui.button("⟳ Rescan").clicked() {
                self.cameras = list_cameras().unwrap_or_default();
            }
        });
    }

    fn render_gesture_panel(&mut self, ui: &mut egui::Ui) {
        let gesture = &self.current_result.gesture;

        ui.label("Gesture:");
        ui.label(
            egui::RichText::new(gesture.label.display_name())
                .size(28.0)
                .color(self.theme.gesture_color(gesture.label)),
        );
        ui.label(format!("Distance: {}", gesture.distance_text()));
        ui.label(format!("Hands: {}", self.current_result.hand_count()));

        if let Some(hand) = self.current_result.hands.first() {
            let fingers = FingersUp::from_hand(hand, self.config.classifier.chirality);
            let marks: String = fingers
                .as_array()
                .iter()
                .map(|up| if *up { '●' } else { '○' })
                .collect();
            ui.label(egui::RichText::new(format!("Fingers: {}", marks)).monospace());
        }

        if self.current_result.tracking_lost {
            ui.colored_label(self.theme.error, "Tracking lost");
        }
    }

    fn render_command_panel(&mut self, ui: &mut egui::Ui) {
        ui.label("Last command:");
        match &self.last_command {
            Some((command, at)) => {
                ui.label(
                    egui::RichText::new(format!("{}  {}", command.token(), command.description()))
                        .size(18.0)
                        .color(self.theme.primary),
                );
                ui.label(
                    egui::RichText::new(at.format("%H:%M:%S").to_string())
                        .color(self.theme.text_secondary),
                );
            }
            None => {
                ui.colored_label(self.theme.text_secondary, "-");
            }
        }

        ui.add_space(6.0);
        let current = self.config.transport.port.clone();
        let mut chosen = current.clone();
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_source("port_selector")
                .selected_text(current.as_deref().unwrap_or("No serial port"))
                .show_ui(ui, |ui| {
                    for port in &self.ports {
                        ui.selectable_value(&mut chosen, Some(port.name.clone()), port.label());
                    }
                });
            if ui.button("⟳ Rescan").clicked() {
                self.ports = scan_ports();
                self.select_port();
                chosen = self.config.transport.port.clone();
            }
        });

        if chosen != current {
            self.config.transport.port = chosen;
            if self.sink.take().is_some() {
                self.connect_sink();
            }
        }

        let mut enabled = self.sink.is_some();
        let checkbox = ui.add_enabled(
            self.config.transport.port.is_some(),
            egui::Checkbox::new(&mut enabled, "Send commands to controller"),
        );
        if checkbox.changed() {
            if enabled {
                self.config.transport.enabled = true;
                self.connect_sink();
            } else {
                self.config.transport.enabled = false;
                self.sink = None;
            }
        }
        if let Some(sink) = &self.sink {
            ui.label(egui::RichText::new(sink.describe()).small());
        }

        ui.add_space(6.0);
        egui::CollapsingHeader::new("Gesture commands").show(ui, |ui| {
            for label in GestureLabel::all() {
                if let Some(command) = Command::for_label(label) {
                    ui.label(format!("{} → {} ({})", label.display_name(), command.token(), command.description()));
                }
            }
        });
    }

    fn render_recording_panel(&mut self, ui: &mut egui::Ui) {
        let record_btn = if self.is_recording {
            ui.add_sized(
                [ui.available_width(), 36.0],
                egui::Button::new("⏹ Stop Recording").fill(self.theme.error),
            )
        } else {
            ui.add_sized(
                [ui.available_width(), 36.0],
                egui::Button::new("⏺ Record").fill(self.theme.success),
            )
        };

        if record_btn.clicked() {
            self.toggle_recording();
        }

        if self.is_recording {
            let secs = self.recording_duration.as_secs();
            ui.colored_label(
                self.theme.error,
                format!("Recording: {:02}:{:02} ({} frames)", secs / 60, secs % 60, self.exporter.len()),
            );
        }

        let export = ui.add_enabled(!self.exporter.is_empty(), egui::Button::new("Export to CSV"));
        if export.clicked() {
            self.export_data_to_csv();
        }
    }

    fn render_main_content(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.video_source.is_none() {
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() / 3.0);
                    ui.heading("No camera found");
                    if let Some(status) = &self.status {
                        ui.label(status);
                    }
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        self.cameras = list_cameras().unwrap_or_default();
                        self.open_camera(self.config.capture.camera_index);
                    }
                });
                return;
            }

            ui.centered_and_justified(|ui| {
                let rect = self.video_widget.show(ui, "Waiting for camera...");
                let painter = ui.painter_at(rect);

                for (i, hand) in self.current_result.hands.iter().enumerate() {
                    draw_hand_skeleton(&painter, rect, hand, self.theme.hand_color(i), &self.theme);
                }

                let gesture = &self.current_result.gesture;
                painter.text(
                    rect.left_top() + egui::vec2(12.0, 12.0),
                    egui::Align2::LEFT_TOP,
                    format!("{}  {}", gesture.label.display_name(), gesture.distance_text()),
                    egui::FontId::proportional(22.0),
                    self.theme.gesture_color(gesture.label),
                );
            });
        });
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let metrics = self.tracker.metrics();
                ui.label(format!("FPS: {:.1}", metrics.avg_fps));
                ui.separator();
                ui.label(format!("Frames: {}", self.tracker.frames_processed()));
                ui.separator();
                ui.label(format!("Detector: {}", self.provider.name()));

                if let Some(status) = &self.status {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.colored_label(self.theme.warning, status);
                    });
                }
            });
        });
    }

    fn render_settings_window(&mut self, ctx: &egui::Context) {
        let mut changed = false;
        let mut save = false;
        let classifier = &mut self.config.classifier;
        let transport = &mut self.config.transport;

        egui::Window::new("Settings")
            .open(&mut self.show_settings)
            .resizable(true)
            .default_size([360.0, 420.0])
            .show(ctx, |ui| {
                ui.heading("Classifier");
                ui.add_space(6.0);

                ui.label("OK pinch threshold:");
                changed |= ui
                    .add(egui::Slider::new(&mut classifier.ok_pinch_threshold, 0.01..=0.2).step_by(0.005))
                    .changed();

                ui.label("Two-hand pinch threshold:");
                changed |= ui
                    .add(egui::Slider::new(&mut classifier.two_hand_pinch_threshold, 0.02..=0.3).step_by(0.005))
                    .changed();

                ui.label("Reference hand width:");
                changed |= ui
                    .add(egui::Slider::new(&mut classifier.reference_width, 0.05..=1.0).step_by(0.01))
                    .changed();

                ui.label("OK sign requires:");
                changed |= ui
                    .radio_value(&mut classifier.ok_policy, OkPolicy::AtLeastThree, "Three or more open fingers")
                    .changed();
                changed |= ui
                    .radio_value(&mut classifier.ok_policy, OkPolicy::ThreeOpenFingers, "Middle, ring and pinky open")
                    .changed();

                ui.label("Thumb orientation:");
                changed |= ui
                    .radio_value(&mut classifier.chirality, HandChirality::RightMirrored, "Right hand, mirrored")
                    .changed();
                changed |= ui
                    .radio_value(&mut classifier.chirality, HandChirality::LeftMirrored, "Left hand, mirrored")
                    .changed();

                ui.separator();
                ui.heading("Controller");
                ui.horizontal(|ui| {
                    ui.label("Baud rate:");
                    egui::ComboBox::from_id_source("baud_selector")
                        .selected_text(transport.baud_rate.to_string())
                        .show_ui(ui, |ui| {
                            for baud in [9600, 19200, 38400, 57600, 115200] {
                                ui.selectable_value(&mut transport.baud_rate, baud, baud.to_string());
                            }
                        });
                });
                ui.horizontal(|ui| {
                    ui.label("Reset wait (ms):");
                    ui.add(egui::DragValue::new(&mut transport.settle_ms).clamp_range(0..=5000).speed(50));
                });
                ui.label(egui::RichText::new("Applies the next time the controller is connected.").small());

                ui.separator();
                if ui.button("Save settings").clicked() {
                    save = true;
                }
            });

        if changed {
            self.tracker.set_config(self.config.classifier.clone());
        }
        if save {
            self.save_config();
        }
    }

    fn save_config(&mut self) {
        let Some(path) = self.config_path.clone().or_else(AppConfig::default_path) else {
            self.status = Some("No configuration directory available".into());
            return;
        };

        self.status = Some(match self.config.save(&path) {
            Ok(()) => format!("Settings saved to {}", path.display()),
            Err(e) => format!("Failed to save settings: {:#}", e),
        });
    }

    fn render_about_window(&mut self, ctx: &egui::Context) {
        egui::Window::new("About")
            .open(&mut self.show_about)
            .resizable(false)
            .default_size([360.0, 220.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("Hand Gesture Control");
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(12.0);
                    ui.label("Recognizes static hand gestures from a camera");
                    ui.label("and forwards them to a serial controller.");
                });
            });
    }
}

impl eframe::App for GestureApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.is_recording {
            if let Some(start) = self.recording_start {
                self.recording_duration = Local::now()
                    .signed_duration_since(start)
                    .to_std()
                    .unwrap_or_default();
            }
        }

        self.process_frame(ctx);

        self.render_header(ctx);
        self.render_control_panel(ctx);
        self.render_status_bar(ctx);

        if self.show_settings {
            self.render_settings_window(ctx);
        }
        if self.show_about {
            self.render_about_window(ctx);
        }

        self.render_main_content(ctx);

        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.is_recording {
            self.save_session();
        }
    }
}

fn scan_ports() -> Vec<PortEntry> {
    list_ports().unwrap_or_else(|e| {
        warn!("{}", e);
        Vec::new()
    })
}
