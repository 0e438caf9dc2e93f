// main.rs — desktop viewer: window, input mapping, status bar

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide the console in release builds

mod renderer;

use panorama_sphere::{
    i18n, AttitudeSensor, GestureEvent, Inertia, PanoramaView, ScriptedSensor, UnavailableSensor,
    ViewId, ViewObserver, ViewerConfig,
};
use renderer::Renderer;

use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, WindowBuilder},
};

use image::io::Reader as ImageReader;
use image::GenericImageView;
use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// One wheel notch counts as this much pinch.
const WHEEL_PINCH_STEP: f32 = 0.1;

/// Readings per full cycle of the simulated sensor.
const SIMULATED_SWAY_STEPS: usize = 500;
const SIMULATED_SWAY_AMPLITUDE: f64 = 0.35;

#[derive(Debug, Default)]
struct StatusBar {
    yaw: f32,
    pitch: f32,
    fov: f32,
}

/// Mirrors orientation changes into the status bar.
struct StatusObserver(Rc<RefCell<StatusBar>>);

impl ViewObserver for StatusObserver {
    fn on_fov_changed(&mut self, fov: f32) {
        self.0.borrow_mut().fov = fov;
    }

    fn on_yaw_changed(&mut self, yaw: f32) {
        self.0.borrow_mut().yaw = yaw;
    }

    fn on_pitch_changed(&mut self, pitch: f32) {
        self.0.borrow_mut().pitch = pitch;
    }
}

fn main() {
    env_logger::init();

    i18n::init(i18n::resolve_lang_from_args());
    let config = ViewerConfig::load_or_default();

    let sensor: Box<dyn AttitudeSensor> = if std::env::args().any(|a| a == "--simulate-motion") {
        log::info!("{}", i18n::tr("motion.simulated"));
        Box::new(ScriptedSensor::sway(SIMULATED_SWAY_STEPS, SIMULATED_SWAY_AMPLITUDE))
    } else {
        Box::new(UnavailableSensor)
    };

    let mut view = match PanoramaView::new(ViewId(1), &config, sensor) {
        Ok(v) => v,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let status = Rc::new(RefCell::new(StatusBar {
        yaw: view.orientation().yaw(),
        pitch: view.orientation().pitch(),
        fov: view.orientation().field_of_view(),
    }));
    view.set_observer(Box::new(StatusObserver(status.clone())));

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(i18n::tr("app.title"))
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)
            .expect("failed to create window"),
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone(), view.mesh()));

    let mut is_fullscreen = false;
    let mut is_loading = false;
    let mut cursor = [0.0f32; 2];
    let mut magnify_scale = 1.0f32;

    let (tx, rx): (Sender<image::RgbaImage>, Receiver<image::RgbaImage>) = channel();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Ok(rgba) = rx.try_recv() {
            renderer.load_panorama(rgba);
            is_loading = false;
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                let now = Instant::now();
                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state != ElementState::Pressed {
                            return;
                        }
                        match input.virtual_keycode {
                            Some(VirtualKeyCode::O) => {
                                if let Some(path) = pick_image() {
                                    is_loading = true;
                                    start_load_image(path, tx.clone());
                                }
                            }
                            Some(VirtualKeyCode::I) => {
                                let next = Inertia::nearest(view.inertia()).next();
                                view.set_inertia(next.factor());
                            }
                            Some(VirtualKeyCode::G) => {
                                let enabled = view.is_gesture_control_enabled();
                                view.set_gesture_control_enabled(!enabled);
                            }
                            Some(VirtualKeyCode::M) => {
                                let enabled = view.is_motion_control_enabled();
                                view.set_motion_control_enabled(!enabled);
                            }
                            Some(VirtualKeyCode::R) => {
                                view.orientation_mut().reset();
                            }
                            Some(VirtualKeyCode::F5) => {
                                let reloaded = ViewerConfig::load_or_default();
                                match view.apply_config(&reloaded) {
                                    Ok(()) => renderer.set_mesh(view.mesh()),
                                    Err(e) => log::warn!("{e}"),
                                }
                            }
                            Some(VirtualKeyCode::F11) => {
                                is_fullscreen = !is_fullscreen;
                                window.set_fullscreen(is_fullscreen.then_some(Fullscreen::Borderless(None)));
                            }
                            _ => {}
                        }
                    }

                    // left button drives the one-finger pan
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => match state {
                        ElementState::Pressed => {
                            view.handle_gesture(GestureEvent::TouchesBegan { touches: 1 }, now);
                            view.handle_gesture(
                                GestureEvent::DragBegan {
                                    point: cursor,
                                    touches: 1,
                                },
                                now,
                            );
                        }
                        ElementState::Released => {
                            view.handle_gesture(GestureEvent::DragEnded, now);
                        }
                    },

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = [position.x as f32, position.y as f32];
                        if view.gesture().is_dragging() {
                            view.handle_gesture(GestureEvent::DragMoved { point: cursor }, now);
                        }
                    }

                    WindowEvent::CursorLeft { .. } => {
                        view.handle_gesture(GestureEvent::DragCancelled, now);
                    }

                    // each wheel event is a complete pinch
                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        if scroll != 0.0 {
                            let scale = 1.0 + WHEEL_PINCH_STEP * scroll.signum();
                            view.handle_gesture(GestureEvent::PinchBegan, now);
                            view.handle_gesture(GestureEvent::PinchChanged { scale }, now);
                            view.handle_gesture(GestureEvent::PinchEnded, now);
                        }
                    }

                    // trackpad magnify deltas accumulate into a pinch scale
                    WindowEvent::TouchpadMagnify { delta, phase, .. } => match phase {
                        TouchPhase::Started => {
                            magnify_scale = 1.0;
                            view.handle_gesture(GestureEvent::PinchBegan, now);
                        }
                        TouchPhase::Moved => {
                            magnify_scale *= 1.0 + delta as f32;
                            view.handle_gesture(GestureEvent::PinchChanged { scale: magnify_scale }, now);
                        }
                        TouchPhase::Ended | TouchPhase::Cancelled => {
                            view.handle_gesture(GestureEvent::PinchEnded, now);
                        }
                    },

                    WindowEvent::DroppedFile(path) => {
                        is_loading = true;
                        start_load_image(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                view.update(Instant::now());
                renderer.update_camera(view.snapshot());

                let mut next_image = None;
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(ctx, &view, &status.borrow(), is_loading, &mut next_image);
                });

                if let Some(path) = next_image {
                    is_loading = true;
                    start_load_image(path, tx.clone());
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("{}", i18n::tr_with("render.error", &[("err", format!("{e:?}"))])),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(&i18n::tr("file.filter.images"), &["jpg", "jpeg", "png", "bmp"])
        .pick_file()
}

fn start_load_image(path: PathBuf, tx: Sender<image::RgbaImage>) {
    thread::spawn(move || {
        log::info!("{}", i18n::tr_with("image.loading", &[("path", path.display().to_string())]));

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                log::error!("{}", i18n::tr_with("image.open_failed", &[("err", e.to_string())]));
                return;
            }
        };
        let reader = BufReader::new(file);

        let img_result = ImageReader::new(reader)
            .with_guessed_format()
            .map_err(image::ImageError::IoError)
            .and_then(|mut r| {
                r.no_limits();
                r.decode()
            });

        match img_result {
            Ok(img) => {
                let (w, h) = img.dimensions();
                log::info!(
                    "{}",
                    i18n::tr_with("image.loaded", &[("w", w.to_string()), ("h", h.to_string())])
                );
                if tx.send(img.to_rgba8()).is_err() {
                    log::error!("{}", i18n::tr("image.send_failed"));
                }
            }
            Err(e) => log::error!("{}", i18n::tr_with("image.decode_failed", &[("err", e.to_string())])),
        }
    });
}

fn on_off(enabled: bool) -> String {
    i18n::tr(if enabled { "status.on" } else { "status.off" })
}

fn draw_ui(
    ctx: &egui::Context,
    view: &PanoramaView,
    status: &StatusBar,
    is_loading: bool,
    next_image: &mut Option<PathBuf>,
) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if is_loading {
                ui.label(egui::RichText::new(i18n::tr("status.loading")).color(egui::Color32::YELLOW));
                ui.label("|");
            }

            ui.label(format!("FOV: {:.1}°", status.fov));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", status.yaw.to_degrees()));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", status.pitch.to_degrees()));
            ui.label("|");
            ui.label(format!(
                "{}: {:?} ({:.2})",
                i18n::tr("status.inertia"),
                Inertia::nearest(view.inertia()),
                view.inertia()
            ));
            ui.label("|");
            ui.label(format!(
                "{}: {}",
                i18n::tr("status.gesture"),
                on_off(view.is_gesture_control_enabled())
            ));
            ui.label("|");
            ui.label(format!(
                "{}: {}",
                i18n::tr("status.motion"),
                on_off(view.is_motion_control_enabled())
            ));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("…").clicked() {
                    *next_image = pick_image();
                }
            });
        });
    });
}
