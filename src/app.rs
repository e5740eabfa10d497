use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{CursorGrabMode, Window, WindowAttributes, WindowId},
};

use crate::config::AppConfig;
use crate::error::{AutomataError, Result};
use crate::gfx::{
    camera::{camera_utils::CameraUniform, viewport_camera::ViewportCamera},
    rendering::{screenshot::write_screenshot, RenderEngine},
};
use crate::input::{Action, InputHandler};
use crate::performance::{PerformanceMonitor, SimulationStatus};
use crate::simulation::{ComputeContext, IterationScheduler, SeedImage, SimulationImageSet};

pub struct AutomataApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

/// GPU objects that exist once the window does
struct Session {
    window: Arc<Window>,
    context: ComputeContext,
    images: SimulationImageSet,
    render_engine: RenderEngine,
    camera: ViewportCamera,
}

struct AppState {
    config: AppConfig,
    session: Option<Session>,
    input: InputHandler,
    scheduler: IterationScheduler,
    monitor: PerformanceMonitor,
    last_frame: Option<Instant>,
    /// First fatal error; the loop exits as soon as it is set
    error: Option<AutomataError>,
}

impl AutomataApp {
    pub fn new(config: AppConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;
        let scheduler = IterationScheduler::new(config.interval(), !config.paused);

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                session: None,
                input: InputHandler::default(),
                scheduler,
                monitor: PerformanceMonitor::new(),
                last_frame: None,
                error: None,
            },
        })
    }

    /// Run the application until the window closes or a fatal error occurs
    pub fn run(mut self) -> Result<()> {
        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AutomataError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
        event_loop.exit();
    }

    fn start_session(&self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let config = &self.config;
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title("automata")
                    .with_inner_size(LogicalSize::new(config.width, config.height)),
            )?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let context = pollster::block_on(ComputeContext::initialize(
            &instance,
            Some(&surface),
            &config.kernel,
            &config.entry_point,
        ))?;

        let images = match &config.seed {
            Some(path) => SimulationImageSet::create(&context, path)?,
            None => {
                let (width, height) = config.seed_size;
                let seed = SeedImage::random_soup(width, height, config.seed_density)?;
                SimulationImageSet::from_seed(&context, &seed)?
            }
        };

        let (width, height) = window.inner_size().into();
        let render_engine =
            RenderEngine::new(surface, &context, &images, width, height, config.vsync);
        let camera = ViewportCamera::new(width, height, images.size()).with_wrap(config.wrap);

        Ok(Session {
            window,
            context,
            images,
            render_engine,
            camera,
        })
    }

    /// One frame: input, camera, scheduler, step, draw
    fn frame(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let now = Instant::now();
        let frame_time = self
            .last_frame
            .replace(now)
            .map(|last| now - last)
            .unwrap_or_default();
        let delta_time = frame_time.as_secs_f32();

        let actions: Vec<Action> = self.input.drain_actions().collect();
        for action in actions {
            match action {
                Action::Quit => {
                    event_loop.exit();
                    return Ok(());
                }
                Action::ToggleRunning => {
                    let running = self.scheduler.toggle_running();
                    log::info!("{}", if running { "Resumed" } else { "Paused" });
                }
                Action::Step => {
                    session.images.iterate(&session.context)?;
                }
                Action::ResetCamera => session.camera.reset(),
                Action::Screenshot => {
                    let frame = session.render_engine.capture(&session.images)?;
                    write_screenshot(&self.config.screenshot_dir, &frame)?;
                }
                Action::ToggleCursorCapture => {
                    let captured =
                        set_cursor_capture(&session.window, !self.input.is_cursor_captured());
                    self.input.set_cursor_captured(captured);
                }
            }
        }

        if let Some(direction) = self.input.interval_direction() {
            let interval = self.scheduler.scale_interval(direction, delta_time);
            log::debug!("Interval {:.4}s", interval);
        }

        self.input.update_camera(&mut session.camera);

        if self.scheduler.tick(delta_time) {
            session.images.iterate(&session.context)?;
        }

        session
            .render_engine
            .update(CameraUniform::from(&session.camera));
        session.render_engine.render_frame(&session.images)?;

        if self.monitor.record_frame(frame_time) {
            session.window.set_title(&self.monitor.title(SimulationStatus {
                generation: session.images.generation(),
                interval: self.scheduler.interval(),
                running: self.scheduler.is_running(),
            }));
        }

        Ok(())
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        match self.start_session(event_loop) {
            Ok(session) => {
                log::info!(
                    "Simulation {}x{}, {}",
                    session.images.size().0,
                    session.images.size().1,
                    if self.scheduler.is_running() { "running" } else { "paused" }
                );
                self.session = Some(session);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.input.handle_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(session) = self.session.as_mut() {
                    session.render_engine.resize(width, height);
                    if width > 0 && height > 0 {
                        session.camera.resize(width, height);
                    }
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.frame(event_loop) {
                    self.fail(event_loop, err);
                }
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        self.input.handle_device_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.as_ref() {
            session.window.request_redraw();
        }
    }
}

/// Grab and hide the cursor, or release it. Returns whether the cursor is now captured.
fn set_cursor_capture(window: &Window, capture: bool) -> bool {
    if !capture {
        if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("Failed to release cursor: {}", err);
        }
        window.set_cursor_visible(true);
        return false;
    }

    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    match grabbed {
        Ok(()) => {
            window.set_cursor_visible(false);
            true
        }
        Err(err) => {
            log::warn!("Cursor capture unavailable: {}", err);
            false
        }
    }
}
