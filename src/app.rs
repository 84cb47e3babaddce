// =============================================================================
// APPLICATION SHELL - window, GL context and frame loop for the demos
// =============================================================================
//
// FRAME FLOW:
// 1. winit delivers input; keys go to the scene (quit/fullscreen handled here)
// 2. RedrawRequested: viewport + clear, Scene::render, flush, swap
// 3. about_to_wait requests the next redraw, so demos animate continuously
//
// The GL context is created in `resumed`, after which the scene is built on
// top of it. Teardown runs the other way: scene (and every handle it owns)
// first, while the context is still current, then the context and window.

use std::num::NonZeroU32;
use std::time::Instant;

use anyhow::{anyhow, Context as _, Result};
use glutin::config::{Config as GlConfig, ConfigTemplateBuilder, GlConfig as _};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasWindowHandle;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowAttributes},
};

use crate::backend::NativeBackend;
use crate::config::Config;
use crate::context::Context;

// =============================================================================
// SCENE INTERFACE
// =============================================================================

/// Per-frame timing and framebuffer size.
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    /// Seconds since the scene was created.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    pub width: u32,
    pub height: u32,
}

impl FrameInfo {
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// A demo: builds its GPU resources once the context exists and draws one
/// frame per call to `render`.
pub trait Scene: Sized {
    const TITLE: &'static str;
    const SIZE: (u32, u32) = (1000, 1000);

    fn init(ctx: &Context, config: &Config) -> Result<Self>;

    /// Draw into the already cleared framebuffer.
    fn render(&mut self, ctx: &Context, frame: &FrameInfo) -> Result<()>;

    /// Key presses and releases, without auto-repeat.
    fn key_event(&mut self, _key: KeyCode, _state: ElementState) {}
}

// =============================================================================
// ENTRY POINT
// =============================================================================

/// Load config.toml, set up logging, and run `S` until the window closes.
pub fn run<S: Scene>() -> Result<()> {
    let config = Config::load();
    init_logging(&config);
    log::info!("Starting {}", S::TITLE);

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::<S>::new(config);
    event_loop.run_app(&mut app)?;
    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Initialize logging at the configured level; `RUST_LOG` still wins.
pub fn init_logging(config: &Config) {
    use env_logger::Builder;

    let mut builder = Builder::new();
    builder.filter_level(config.log_level());
    builder.parse_default_env();
    // A second init (tests, repeated runs) keeps the first logger
    let _ = builder.try_init();
}

/// Parse a winit key code name as written in config.toml.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let key = match name {
        "Escape" => KeyCode::Escape,
        "Space" => KeyCode::Space,
        "Enter" => KeyCode::Enter,
        "Backspace" => KeyCode::Backspace,
        "Tab" => KeyCode::Tab,
        "F1" => KeyCode::F1,
        "F2" => KeyCode::F2,
        "F3" => KeyCode::F3,
        "F4" => KeyCode::F4,
        "F5" => KeyCode::F5,
        "F6" => KeyCode::F6,
        "F7" => KeyCode::F7,
        "F8" => KeyCode::F8,
        "F9" => KeyCode::F9,
        "F10" => KeyCode::F10,
        "F11" => KeyCode::F11,
        "F12" => KeyCode::F12,
        "KeyQ" | "Q" => KeyCode::KeyQ,
        "KeyX" | "X" => KeyCode::KeyX,
        "KeyF" | "F" => KeyCode::KeyF,
        _ => return None,
    };
    Some(key)
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Window-side GL objects.
///
/// IMPORTANT: Field order matters for Drop! The glazy context must go before
/// the GL context it issues calls into.
struct Graphics {
    ctx: Context,
    surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

struct App<S: Scene> {
    config: Config,
    quit_key: Option<KeyCode>,
    fullscreen_key: Option<KeyCode>,

    // Dropped before `graphics`, see Drop below
    scene: Option<S>,
    graphics: Option<Graphics>,
    is_fullscreen: bool,
    is_minimized: bool,

    // Set when the loop exits because of an error, returned from run()
    failure: Option<anyhow::Error>,

    start_time: Instant,
    last_frame_time: Instant,
    last_fps_update: Instant,
    frame_count: u32,
}

impl<S: Scene> App<S> {
    fn new(config: Config) -> Self {
        let quit_key = parse_key(&config.controls.quit_key);
        if quit_key.is_none() {
            log::warn!("Unknown quit key '{}'", config.controls.quit_key);
        }
        let fullscreen_key = parse_key(&config.controls.fullscreen_key);
        if fullscreen_key.is_none() {
            log::warn!("Unknown fullscreen key '{}'", config.controls.fullscreen_key);
        }
        let now = Instant::now();
        Self {
            is_fullscreen: config.window.fullscreen,
            config,
            quit_key,
            fullscreen_key,
            scene: None,
            graphics: None,
            is_minimized: false,
            failure: None,
            start_time: now,
            last_frame_time: now,
            last_fps_update: now,
            frame_count: 0,
        }
    }

    fn title(&self) -> &str {
        self.config.window.title.as_deref().unwrap_or(S::TITLE)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.failure = Some(error);
        event_loop.exit();
    }

    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    fn init_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics> {
        let (default_width, default_height) = S::SIZE;
        let mut window_attributes = WindowAttributes::default()
            .with_title(self.title())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width.unwrap_or(default_width),
                self.config.window.height.unwrap_or(default_height),
            ));
        if let (Some(x), Some(y)) = (self.config.window.x, self.config.window.y) {
            window_attributes = window_attributes.with_position(PhysicalPosition::new(x, y));
        }
        if self.config.window.fullscreen {
            window_attributes =
                window_attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let template = ConfigTemplateBuilder::new().with_depth_size(24);
        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(window_attributes))
            .build(event_loop, template, pick_config)
            .map_err(|e| anyhow!("Failed to create window: {}", e))?;
        let window = window.context("Display builder returned no window")?;

        let (major, minor) = self.config.graphics.gl_version;
        let raw_window_handle = window.window_handle().ok().map(|handle| handle.as_raw());
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .with_profile(GlProfile::Core)
            .build(raw_window_handle);

        let gl_display = gl_config.display();
        // SAFETY: the raw window handle belongs to `window`, which outlives
        // the context (field order in Graphics).
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .with_context(|| format!("Failed to create an OpenGL {}.{} core context", major, minor))?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .context("Failed to describe window surface")?;
        // SAFETY: as above
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
            .context("Failed to create window surface")?;
        let gl_context = not_current
            .make_current(&surface)
            .context("Failed to make GL context current")?;

        let interval = if self.config.graphics.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = surface.set_swap_interval(&gl_context, interval) {
            log::warn!("Failed to set swap interval: {}", e);
        }

        // SAFETY: the context is current on this thread and stays current
        // for the life of the event loop.
        let backend = unsafe {
            NativeBackend::from_loader(|symbol| gl_display.get_proc_address(symbol).cast())
        };
        log::info!("OpenGL {} on {}", backend.version(), backend.renderer());

        let ctx = Context::new(backend);
        ctx.set_debug(self.config.debug.check_gl_errors);
        if self.config.graphics.depth_test {
            ctx.set_depth_test(true);
        }

        Ok(Graphics {
            ctx,
            surface,
            gl_context,
            window,
        })
    }

    fn toggle_fullscreen(&mut self) {
        if let Some(ref graphics) = self.graphics {
            self.is_fullscreen = !self.is_fullscreen;

            if self.is_fullscreen {
                graphics
                    .window
                    .set_fullscreen(Some(Fullscreen::Borderless(None)));
                log::info!("Entered fullscreen mode");
            } else {
                graphics.window.set_fullscreen(None);
                log::info!("Exited fullscreen mode");
            }
        }
    }

    // =========================================================================
    // RENDER LOOP
    // =========================================================================

    fn render_frame(&mut self) -> Result<bool> {
        if self.is_minimized {
            return Ok(false);
        }
        let (Some(scene), Some(graphics)) = (self.scene.as_mut(), self.graphics.as_ref()) else {
            return Ok(false);
        };

        let now = Instant::now();
        let size = graphics.window.inner_size();
        let frame = FrameInfo {
            time: now.duration_since(self.start_time).as_secs_f32(),
            delta: now.duration_since(self.last_frame_time).as_secs_f32(),
            width: size.width,
            height: size.height,
        };

        let ctx = &graphics.ctx;
        ctx.viewport(frame.width, frame.height)?;
        ctx.clear(self.config.graphics.clear_color);
        scene.render(ctx, &frame)?;
        ctx.flush();
        graphics
            .surface
            .swap_buffers(&graphics.gl_context)
            .context("Failed to swap buffers")?;
        Ok(true)
    }

    // =========================================================================
    // FPS TRACKING
    // =========================================================================

    fn update_fps(&mut self) {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;
        self.frame_count += 1;

        if !self.config.debug.show_fps {
            return;
        }

        // Update title every second
        if now.duration_since(self.last_fps_update).as_secs_f32() >= 1.0 {
            let elapsed = now.duration_since(self.last_fps_update).as_secs_f32();
            let fps = self.frame_count as f32 / elapsed;

            if let Some(ref graphics) = self.graphics {
                let mode = if self.is_fullscreen { "fullscreen" } else { "windowed" };
                graphics.window.set_title(&format!(
                    "{} - {:.0} FPS ({:.2}ms) [{}]",
                    self.title(),
                    fps,
                    frame_time * 1000.0,
                    mode
                ));
            }

            self.frame_count = 0;
            self.last_fps_update = now;
        }
    }
}

/// Prefer the config with the most MSAA samples.
fn pick_config(configs: Box<dyn Iterator<Item = GlConfig> + '_>) -> GlConfig {
    configs
        .reduce(|best, config| {
            if config.num_samples() > best.num_samples() {
                config
            } else {
                best
            }
        })
        .expect("no OpenGL configs available")
}

// =============================================================================
// EVENT HANDLING
// =============================================================================

impl<S: Scene> ApplicationHandler for App<S> {
    /// Called when the application is ready to create windows.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }

        let graphics = match self.init_graphics(event_loop) {
            Ok(graphics) => graphics,
            Err(e) => return self.fail(event_loop, e.context("Failed to initialize OpenGL")),
        };

        match S::init(&graphics.ctx, &self.config) {
            Ok(scene) => self.scene = Some(scene),
            Err(e) => {
                // The handles the scene built so far are already gone; drop
                // the context now, while it is still current.
                drop(graphics);
                return self.fail(event_loop, e.context(format!("Failed to set up {}", S::TITLE)));
            }
        }

        let now = Instant::now();
        self.start_time = now;
        self.last_frame_time = now;
        self.last_fps_update = now;
        self.graphics = Some(graphics);
    }

    /// Handle window events.
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            // ─────────────────────────────────────────────────────────────────
            // CLOSE REQUEST
            // ─────────────────────────────────────────────────────────────────
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                event_loop.exit();
            }

            // ─────────────────────────────────────────────────────────────────
            // WINDOW RESIZED
            // ─────────────────────────────────────────────────────────────────
            WindowEvent::Resized(size) => {
                log::debug!("Window resized to {}x{}", size.width, size.height);

                match (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
                    (Some(width), Some(height)) => {
                        self.is_minimized = false;
                        // EGL and CGL need the surface resized explicitly
                        if let Some(ref graphics) = self.graphics {
                            graphics.surface.resize(&graphics.gl_context, width, height);
                        }
                    }
                    _ => self.is_minimized = true,
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // REDRAW REQUESTED
            // ─────────────────────────────────────────────────────────────────
            WindowEvent::RedrawRequested => match self.render_frame() {
                Ok(true) => self.update_fps(),
                Ok(false) => {}
                Err(e) => self.fail(event_loop, e.context("Render error")),
            },

            // ─────────────────────────────────────────────────────────────────
            // KEYBOARD INPUT
            // ─────────────────────────────────────────────────────────────────
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return;
                }
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                if event.state == ElementState::Pressed {
                    if Some(key) == self.quit_key {
                        log::info!("{:?} pressed, exiting...", key);
                        event_loop.exit();
                        return;
                    }
                    if Some(key) == self.fullscreen_key {
                        self.toggle_fullscreen();
                        return;
                    }
                }
                if let Some(ref mut scene) = self.scene {
                    scene.key_event(key, event.state);
                }
            }

            _ => {}
        }
    }

    /// Called when the event loop is about to block waiting for events.
    /// We use this to request continuous redraws.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref graphics) = self.graphics {
            graphics.window.request_redraw();
        }
    }
}

// =============================================================================
// CLEANUP
// =============================================================================

impl<S: Scene> Drop for App<S> {
    fn drop(&mut self) {
        log::info!("Cleaning up GL resources...");
        // Handles delete through the context, which must still be current
        self.scene = None;
        self.graphics = None;
        log::info!("Cleanup complete");
    }
}
