use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputFrame, InputState};
use crate::time::FrameClock;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "aurora".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            resizable: true,
        }
    }
}

/// Runs one window until the app or the user closes it.
pub struct Runtime;

impl Runtime {
    /// Blocks on the event loop. Window or device creation failures and
    /// `App::on_gpu_ready` errors are returned once the loop has stopped.
    pub fn run<A: App + 'static>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut host = Host {
            config,
            gpu_init,
            app,
            window: None,
            failure: None,
            closing: false,
        };
        event_loop
            .run_app(&mut host)
            .context("winit event loop terminated with error")?;
        host.failure.map_or(Ok(()), Err)
    }
}

// The window outlives the surface that borrows it.
#[self_referencing]
struct WindowEntry {
    input: InputState,
    input_frame: InputFrame,
    clock: FrameClock,
    window: Window,
    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

impl WindowEntry {
    fn open(event_loop: &ActiveEventLoop, config: &RuntimeConfig, init: GpuInit) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.initial_size)
            .with_resizable(config.resizable);
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        WindowEntryTryBuilder {
            input: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, init)),
        }
        .try_build()
        .context("GPU initialization failed")
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        log::debug!("window resized to {}x{}", size.width, size.height);
        self.with_gpu_mut(|gpu| gpu.resize(size));
        self.request_redraw();
    }

    fn request_redraw(&self) {
        self.with_window(|w| w.request_redraw());
    }

    /// One `App::on_frame`. Minimized windows skip the frame and the clock.
    fn redraw(&mut self, app: &mut impl App) -> AppControl {
        self.with_mut(|f| {
            let size = f.gpu.size();
            if size.width == 0 || size.height == 0 {
                return AppControl::Continue;
            }

            let mut ctx = FrameCtx {
                window: f.window,
                gpu: f.gpu,
                input: f.input,
                input_frame: f.input_frame,
                time: f.clock.tick(),
            };
            let control = app.on_frame(&mut ctx);
            f.input_frame.clear();
            control
        })
    }
}

struct Host<A: App> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    window: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
    closing: bool,
}

impl<A: App> Host<A> {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let entry = WindowEntry::open(event_loop, &self.config, self.gpu_init.clone())?;
        entry
            .with_gpu(|gpu| self.app.on_gpu_ready(gpu))
            .context("application setup failed")?;
        entry.request_redraw();
        self.window = Some(entry);
        Ok(())
    }

    /// Drops the surface and window before leaving the loop.
    fn close(&mut self, event_loop: &ActiveEventLoop) {
        self.closing = true;
        self.window = None;
        event_loop.exit();
    }
}

impl<A: App> ApplicationHandler for Host<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.closing {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            log::error!("{e:#}");
            self.failure = Some(e);
            self.close(event_loop);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Redraw continuously; FIFO presentation paces the loop.
        if let Some(entry) = &self.window {
            entry.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };

        entry.with_mut(|f| {
            if let Some(ev) = translate_window_event(f.window, &event) {
                f.input.apply_event(f.input_frame, ev);
            }
        });

        let control = match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested");
                AppControl::Exit
            }
            WindowEvent::Resized(size) => {
                entry.resize(size);
                AppControl::Continue
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = entry.with_window(|w| w.inner_size());
                entry.resize(size);
                AppControl::Continue
            }
            WindowEvent::RedrawRequested => entry.redraw(&mut self.app),
            _ => AppControl::Continue,
        };

        if control == AppControl::Exit {
            self.close(event_loop);
        }
    }
}
