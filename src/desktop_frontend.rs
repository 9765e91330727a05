use crate::app_state::Effects;
use crate::engine::Engine;
use crate::layout::ScreenSize;
use crate::output_midir::MidiBackend;
use crate::render::{self, PixelCanvas};
use crate::ui_adapter::{self, MouseTracker};
use crate::ui_events::{UiEvent, UiSession};
use crate::ui_settings;

use softbuffer::{Context, Surface};
use std::error::Error;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Instant;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

type WindowSurface = Surface<Rc<Window>, Rc<Window>>;

fn screen_size(size: PhysicalSize<u32>) -> ScreenSize {
    ScreenSize {
        width: size.width as f32,
        height: size.height as f32,
    }
}

fn resize_surface(surface: &mut WindowSurface, size: PhysicalSize<u32>) {
    let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
        return;
    };
    if let Err(e) = surface.resize(w, h) {
        log::error!("desktop: surface resize failed: {e}");
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut settings = ui_settings::load_desktop_settings();

    let mut midi = MidiBackend::connect(settings.midi_channel);
    midi.program = settings.midi_program;
    if !midi.is_available() {
        eprintln!("Warning: No MIDI ports found. Application will emit no sound.");
    }
    let audio = midi.into_guarded();

    // Setup Window
    let event_loop = EventLoop::new()?;
    let window = Rc::new(
        WindowBuilder::new()
            .with_title("Iso Keys")
            .with_inner_size(winit::dpi::LogicalSize::new(800.0, 600.0))
            .build(&event_loop)?,
    );

    let context = Context::new(window.clone())?;
    let mut surface = Surface::new(&context, window.clone())?;
    resize_surface(&mut surface, window.inner_size());

    let density = window.scale_factor() as f32;
    let mut ui = UiSession::new(Engine::new(
        audio,
        screen_size(window.inner_size()),
        density,
    ));
    settings.apply_to(ui.engine_mut(), Instant::now());
    ui.engine_mut().initialize_audio();

    let mut mouse = MouseTracker::default();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => {
            let now = Instant::now();
            let effects = match event {
                WindowEvent::CloseRequested => {
                    ui.engine_mut().shutdown();
                    ui_settings::save_desktop_settings(&settings.capture(ui.engine()));
                    elwt.exit();
                    return;
                }

                WindowEvent::Focused(focused) => ui.handle(UiEvent::Focus(focused), now),

                WindowEvent::KeyboardInput { event, .. } => {
                    match ui_adapter::ui_event_from_winit(&event) {
                        Some(ue) => ui.handle(ue, now),
                        None => Effects::empty(),
                    }
                }

                WindowEvent::Resized(size) => {
                    resize_surface(&mut surface, size);
                    ui.handle(UiEvent::Resize(screen_size(size)), now) | Effects::Redraw
                }

                WindowEvent::CursorMoved { position, .. } => {
                    match mouse.moved(position.x as f32, position.y as f32) {
                        Some(ue) => ui.handle(ue, now),
                        None => Effects::empty(),
                    }
                }

                WindowEvent::CursorLeft { .. } => match mouse.left() {
                    Some(ue) => ui.handle(ue, now),
                    None => Effects::empty(),
                },

                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => match mouse.button(state == ElementState::Pressed) {
                    Some(ue) => ui.handle(ue, now),
                    None => Effects::empty(),
                },

                WindowEvent::Touch(touch) => {
                    ui.handle(ui_adapter::touch_event_from_winit(&touch), now)
                }

                WindowEvent::RedrawRequested => {
                    if let Err(e) = redraw(&mut surface, &window, ui.engine()) {
                        log::error!("desktop: redraw failed: {e}");
                    }
                    Effects::empty()
                }

                _ => Effects::empty(),
            };

            if effects.contains(Effects::ExitRequested) {
                // Nothing to navigate to on desktop; leaving the keyboard closes the window.
                log::info!("desktop: exit requested");
                ui.engine_mut().shutdown();
                ui_settings::save_desktop_settings(&settings.capture(ui.engine()));
                elwt.exit();
                return;
            }
            if effects.intersects(Effects::Redraw | Effects::Animating) {
                window.request_redraw();
            }

            let current = settings.capture(ui.engine());
            if current != settings {
                settings = current;
                ui_settings::save_desktop_settings(&settings);
            }
        }

        Event::AboutToWait => {
            let now = Instant::now();
            if ui.handle(UiEvent::Tick, now).contains(Effects::Redraw) {
                window.request_redraw();
            }
            match ui.engine().next_wakeup(now) {
                Some(at) => elwt.set_control_flow(ControlFlow::WaitUntil(at)),
                None => elwt.set_control_flow(ControlFlow::Wait),
            }
        }

        _ => {}
    })?;

    Ok(())
}

fn redraw(
    surface: &mut WindowSurface,
    window: &Window,
    engine: &Engine<MidiBackend>,
) -> Result<(), softbuffer::SoftBufferError> {
    let size = window.inner_size();
    if size.width == 0 || size.height == 0 {
        return Ok(());
    }
    let mut buffer = surface.buffer_mut()?;
    {
        let mut canvas = PixelCanvas::new(&mut buffer, size.width as usize, size.height as usize);
        render::draw_frame(&mut canvas, engine);
    }
    buffer.present()
}
