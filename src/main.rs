//! Diffusion Sonar - reaction-diffusion you can hear
//!
//! A radar-like sweep reads chemical B along a ray from the center of a
//! Gray-Scott field and plays what it finds on 88 sine voices.

use std::sync::Arc;

use clap::Parser;
use log::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use diffusion_sonar::audio::{AudioSystem, ToneMapper, VoiceBank};
use diffusion_sonar::cli::{Args, BackendArg};
use diffusion_sonar::controls::{control_for, Control};
use diffusion_sonar::error::SessionError;
use diffusion_sonar::field::SeedPattern;
use diffusion_sonar::gpu::{GpuBackend, GpuContext};
use diffusion_sonar::instrument::Instrument;
use diffusion_sonar::params::*;
use diffusion_sonar::recording::run_headless;
use diffusion_sonar::rendering::RenderSystem;
use diffusion_sonar::stepper::CpuBackend;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation and sonification
    instrument: Option<Instrument<GpuBackend>>,
    bank: VoiceBank,
    audio: Option<AudioSystem>,

    // Configuration
    params: SimulationParams,
    seed: SeedPattern,
    render_config: RenderConfig,
    audio_config: AudioConfig,
    sweep_config: SweepConfig,

    /// Error that ended the session early
    fatal: Option<SessionError>,
}

impl App {
    fn new(args: &Args) -> Self {
        let audio_config = AudioConfig::default();
        let tuning = args.tuning();
        info!("Tuning: {}", tuning.describe());

        let mut params = SimulationParams::default();
        params.apply(&args.overrides());

        Self {
            window: None,
            render_system: None,
            instrument: None,
            bank: VoiceBank::new(&tuning, &audio_config),
            audio: None,
            params,
            seed: args.seed_pattern(),
            render_config: args.render_config(),
            audio_config,
            sweep_config: SweepConfig::default(),
            fatal: None,
        }
    }

    /// Create the window-bound GPU state and the instrument
    fn init(&mut self, window: Arc<Window>) -> Result<(), SessionError> {
        self.render_config.validate().map_err(SessionError::Config)?;

        let mut render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.render_config,
        ))?;

        let (width, height) = render_system.size();
        let grid_size = self.render_config.grid_size_for(width, height);
        info!("Field: {}x{} cells", grid_size, grid_size);

        let backend = GpuBackend::new(render_system.context(), grid_size, grid_size, &self.seed)?;
        render_system.attach(&backend);

        self.instrument = Some(Instrument::new(
            backend,
            self.params,
            self.seed,
            &self.sweep_config,
            ToneMapper::new(self.bank.gains(), &self.audio_config),
        ));

        // Audio is optional: keep running silently without it
        match AudioSystem::new(&self.bank, &self.audio_config) {
            Ok(audio) => self.audio = Some(audio),
            Err(e) => warn!("{}; continuing without sound", e),
        }

        self.window = Some(window);
        self.render_system = Some(render_system);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: SessionError) {
        error!("{}", e);
        self.fatal = Some(e);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("Diffusion Sonar")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                let e = SessionError::GpuUnavailable(format!("Failed to create window: {}", e));
                return self.fail(event_loop, e);
            }
        };

        if let Err(e) = self.init(window) {
            return self.fail(event_loop, e);
        }

        println!("\nDiffusion Sonar is running!");
        println!("  Q/A Da   W/S Db   E/D feed   R/F kill   T/G dt");
        println!("  Space reset   P print parameters   Esc quit\n");
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => self.handle_key(event_loop, key),
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

impl App {
    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: winit::keyboard::KeyCode) {
        let (Some(instrument), Some(render_system)) =
            (self.instrument.as_mut(), self.render_system.as_mut())
        else {
            return;
        };

        let reset = match control_for(key, instrument.params()) {
            Some(Control::Adjust(overrides)) => {
                instrument.update_parameters(overrides);
                println!("{:?}", instrument.params());
                true
            }
            Some(Control::Reset) => true,
            Some(Control::PrintParams) => {
                println!("{:?}", instrument.params());
                false
            }
            Some(Control::Quit) => {
                event_loop.exit();
                false
            }
            None => false,
        };

        if reset {
            if let Err(e) = instrument.reset_buffers(render_system) {
                error!("Reset failed: {}", e);
            }
        }
    }

    /// Run a single frame
    fn render_frame(&mut self) {
        let (Some(instrument), Some(render_system)) =
            (self.instrument.as_mut(), self.render_system.as_mut())
        else {
            return;
        };

        match instrument.run_frame(render_system) {
            Ok(report) if report.frame % 600 == 0 => debug!(
                "Frame {}: sweep {:.2} rad, {} voices sounding",
                report.frame, report.angle, report.sounding_voices
            ),
            Ok(_) => {}
            Err(e) => error!("Frame error: {}", e),
        }
    }
}

/// Run the windowed instrument until the window closes
fn run_windowed(args: &Args) -> Result<(), SessionError> {
    let mut app = App::new(args);
    let event_loop = EventLoop::new()
        .map_err(|e| SessionError::GpuUnavailable(format!("Failed to create event loop: {}", e)))?;
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("Event loop error: {}", e);
    }

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Record a fixed number of frames without a window
fn run_recording(args: &Args) -> Result<(), SessionError> {
    let audio_config = AudioConfig::default();
    let tuning = args.tuning();
    info!("Tuning: {}", tuning.describe());
    let bank = VoiceBank::new(&tuning, &audio_config);

    let render_config = args.render_config();
    render_config.validate().map_err(SessionError::Config)?;
    let grid_size =
        render_config.grid_size_for(render_config.window_width, render_config.window_height);
    let mut params = SimulationParams::default();
    params.apply(&args.overrides());
    let seed = args.seed_pattern();
    let sweep_config = SweepConfig::default();
    let recording = args.recording_config();
    let tones = ToneMapper::new(bank.gains(), &audio_config);

    info!(
        "Recording {} frames of a {}x{} field ({:?} backend)",
        recording.frames, grid_size, grid_size, args.backend
    );

    let summary = match args.backend {
        BackendArg::Cpu => {
            let backend = CpuBackend::new(grid_size, grid_size, &seed);
            let mut instrument = Instrument::new(backend, params, seed, &sweep_config, tones);
            run_headless(
                &mut instrument,
                &bank,
                &audio_config,
                &recording,
                render_config.sweep_color,
            )?
        }
        BackendArg::Gpu => {
            let context = pollster::block_on(GpuContext::headless())?;
            let backend = GpuBackend::new(&context, grid_size, grid_size, &seed)?;
            let mut instrument = Instrument::new(backend, params, seed, &sweep_config, tones);
            run_headless(
                &mut instrument,
                &bank,
                &audio_config,
                &recording,
                render_config.sweep_color,
            )?
        }
    };

    println!(
        "Wrote {} snapshots and {} audio samples to {}",
        summary.snapshots,
        summary.audio_samples,
        recording.output_dir.display()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Diffusion Sonar - Gray-Scott reaction-diffusion, swept and sonified");
    println!("Initializing systems...\n");

    let result = if args.headless {
        run_recording(&args)
    } else {
        run_windowed(&args)
    };

    if let Err(e) = result {
        eprintln!("diffusion-sonar: {}", e);
        if matches!(e, SessionError::GpuUnavailable(_)) {
            eprintln!("A GPU adapter is required for the windowed mode; try --headless --backend cpu");
        }
        std::process::exit(1);
    }
}
