//! Application event loop.
//!
//! This module owns the window, drives the frame loop and wires the scene's
//! pieces together.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window, loads the configuration and textures,
//!    builds the material registry, the particle field and the GPU context,
//!    and starts fetching the scene asset in the background
//! 2. Every redraw first checks whether the asset fetch has finished. A
//!    finished asset is parsed and bound on the frame thread; a failure is
//!    logged and the scene keeps rendering without it
//! 3. The animation loop ticks (shader time, camera damping), the uniforms
//!    are written and the frame is rendered and presented
//! 4. Resize and scale-factor changes update the viewport, the camera aspect
//!    and the fireflies' pixel ratio
//!
//! [`Tweak`]s sent through a [`TweakSender`] are applied between frames.

use std::{fmt::Debug, iter, sync::Arc};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    animation::AnimationLoop,
    binder::AssetBinder,
    camera::CameraRig,
    config::SceneConfig,
    context::Context,
    data_structures::{material::MaterialRegistry, texture::TextureOptions},
    render::SceneRenderer,
    resources::{
        scene::{SceneBytes, fetch_scene, parse_scene},
        texture::load_texture,
    },
    scene::LiveScene,
    tweaks::{Tweak, TweakTargets, to_clear_colour},
    viewport::Viewport,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything that exists once the window and the GPU are up.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    renderer: SceneRenderer,
    registry: MaterialRegistry,
    scene: LiveScene,
    rig: CameraRig,
    anim: AnimationLoop,
    binder: AssetBinder,
    viewport: Viewport,
    tweaks: TweakTargets,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &SceneConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor())
            .with_cap(config.pixel_ratio_cap);

        let registry = MaterialRegistry::new(&config.material_settings(viewport.device_pixel_ratio));
        let rig = config.camera.rig(viewport.width, viewport.height);

        let ctx = Context::new(window, &rig, config.clear_colour).await?;

        let colour_map = load_texture(
            &config.baked_texture,
            TextureOptions::COLOUR,
            &ctx.device,
            &ctx.queue,
        )
        .await?;
        let alpha_map = load_texture(
            &config.alpha_texture,
            TextureOptions::DATA,
            &ctx.device,
            &ctx.queue,
        )
        .await?;

        let particles = config.fireflies.generate();
        log::info!("Generated {} fireflies", particles.len());
        let scene = LiveScene::new(particles);

        let renderer = SceneRenderer::new(
            &ctx.device,
            ctx.config.format,
            &ctx.camera.bind_group_layout,
            &registry,
            colour_map,
            alpha_map,
            scene.particles(),
            ctx.resolution(),
        )?;

        let mut anim = AnimationLoop::new(&registry);
        anim.start();

        let mut state = Self {
            ctx,
            renderer,
            registry,
            scene,
            rig,
            anim,
            binder: AssetBinder::default(),
            viewport,
            tweaks: TweakTargets {
                clear_colour: config.clear_colour,
            },
            is_surface_configured: false,
        };
        state.resize(viewport);
        Ok(state)
    }

    fn resize(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        self.viewport = viewport;
        viewport.apply(&mut self.rig, &self.registry);
        let (width, height) = self.drawing_buffer_size();
        self.is_surface_configured = self.ctx.resize(width, height);
    }

    /// Resize from winit's physical window size.
    fn resize_physical(&mut self, width: u32, height: u32) {
        let viewport = Viewport::from_physical(width, height, self.ctx.window.scale_factor())
            .with_cap(self.viewport.pixel_ratio_cap);
        self.resize(viewport);
    }

    // Native surfaces must match the window, so the cap only reaches the
    // drawing buffer on the web.
    #[cfg(target_arch = "wasm32")]
    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.viewport.buffer_size()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn drawing_buffer_size(&self) -> (u32, u32) {
        let size = self.ctx.window.inner_size();
        (size.width, size.height)
    }

    /// Parses and binds a fetched asset. Failures leave the asset slot as it
    /// was.
    pub fn receive_asset(&mut self, fetched: anyhow::Result<SceneBytes>) {
        let asset = match fetched.and_then(|bytes| parse_scene(&bytes)) {
            Ok(asset) => asset,
            Err(e) => {
                log::error!("Couldn't load the scene asset: {:#}", e);
                return;
            }
        };
        if let Err(e) = self.binder.bind(asset, &self.registry, &mut self.scene) {
            log::error!("Scene asset left unbound: {}", e);
        }
    }

    pub fn apply_tweak(&mut self, tweak: Tweak) {
        tweak.apply(&self.registry, &mut self.tweaks);
        self.ctx.clear_colour = to_clear_colour(self.tweaks.clear_colour);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        self.anim.tick(&mut self.rig);

        // nothing to draw into until the first resize
        if !self.is_surface_configured {
            return Ok(());
        }

        self.ctx.camera.write(&self.ctx.queue, &self.rig);
        self.renderer
            .sync_asset(&self.ctx.device, &self.scene, &self.registry);
        self.renderer
            .write_uniforms(&self.ctx.queue, &self.registry, self.ctx.resolution());

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.renderer
                .draw(&mut render_pass, &self.ctx.camera.bind_group);
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(anyhow::Result<(String, Box<AppState>)>),
    #[allow(dead_code)]
    AssetFetched(anyhow::Result<SceneBytes>),
    Tweak(Tweak),
    #[allow(dead_code)]
    Exit,
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(Ok((scene_file, _))) => {
                f.debug_tuple("Initialized").field(scene_file).finish()
            }
            Self::Initialized(Err(e)) => f.debug_tuple("InitializationFailed").field(e).finish(),
            Self::AssetFetched(Ok(bytes)) => f.debug_tuple("AssetFetched").field(&bytes.file_name).finish(),
            Self::AssetFetched(Err(e)) => f.debug_tuple("AssetFailed").field(e).finish(),
            Self::Tweak(tweak) => f.debug_tuple("Tweak").field(tweak).finish(),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

/// Handle for changing scene values while the event loop runs.
#[derive(Clone)]
pub struct TweakSender(EventLoopProxy<FlowEvent>);

impl TweakSender {
    /// Returns `false` once the event loop has exited.
    pub fn send(&self, tweak: Tweak) -> bool {
        self.0.send_event(FlowEvent::Tweak(tweak)).is_ok()
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg(not(target_arch = "wasm32"))]
    pending_asset: Option<tokio::task::JoinHandle<anyhow::Result<SceneBytes>>>,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            #[cfg(not(target_arch = "wasm32"))]
            pending_asset: None,
            proxy,
            state: None,
        })
    }

    fn on_initialized(
        &mut self,
        event_loop: &ActiveEventLoop,
        initialized: anyhow::Result<(String, Box<AppState>)>,
    ) {
        match initialized {
            Ok((scene_file, state)) => {
                let app_state = self.state.insert(*state);
                let size = app_state.ctx.window.inner_size();
                app_state.resize_physical(size.width, size.height);
                app_state.ctx.window.request_redraw();
                self.start_asset_fetch(scene_file);
            }
            Err(e) => {
                log::error!("App initialization failed: {:#}", e);
                event_loop.exit();
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start_asset_fetch(&mut self, scene_file: String) {
        log::info!("Fetching {}", scene_file);
        self.pending_asset = Some(
            self.async_runtime
                .spawn(async move { fetch_scene(&scene_file).await }),
        );
    }

    #[cfg(target_arch = "wasm32")]
    fn start_asset_fetch(&mut self, scene_file: String) {
        log::info!("Fetching {}", scene_file);
        let proxy = self.proxy.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let fetched = fetch_scene(&scene_file).await;
            if proxy.send_event(FlowEvent::AssetFetched(fetched)).is_err() {
                log::warn!("Event loop closed before {} arrived", scene_file);
            }
        });
    }

    /// Takes the fetched asset once the background task has finished.
    #[cfg(not(target_arch = "wasm32"))]
    fn poll_asset(&mut self) -> Option<anyhow::Result<SceneBytes>> {
        let handle = self.pending_asset.take_if(|handle| handle.is_finished())?;
        Some(
            self.async_runtime
                .block_on(handle)
                .map_err(anyhow::Error::from)
                .and_then(|fetched| fetched),
        )
    }

    #[cfg(target_arch = "wasm32")]
    fn poll_asset(&mut self) -> Option<anyhow::Result<SceneBytes>> {
        None
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Portal");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID));
            if let Some(canvas) = canvas {
                window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
            } else {
                log::warn!("No #{} element, winit will create its own canvas", CANVAS_ID);
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Couldn't create the window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let init_future = async move {
            let config = match SceneConfig::load().await {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Invalid scene configuration, using defaults: {:#}", e);
                    SceneConfig::default()
                }
            };
            let state = AppState::new(window, &config).await?;
            Ok((config.scene_file, Box::new(state)))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let initialized = self.async_runtime.block_on(init_future);
            self.on_initialized(event_loop, initialized);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let initialized = init_future.await;
                if proxy.send_event(FlowEvent::Initialized(initialized)).is_err() {
                    log::error!("Event loop closed during initialization");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        log::debug!("{:?}", event);
        match event {
            // context built by `spawn_local` in `resumed`
            FlowEvent::Initialized(initialized) => self.on_initialized(event_loop, initialized),
            FlowEvent::AssetFetched(fetched) => {
                if let Some(state) = &mut self.state {
                    state.receive_asset(fetched);
                }
            }
            FlowEvent::Tweak(tweak) => match &mut self.state {
                Some(state) => state.apply_tweak(tweak),
                None => log::warn!("Dropping {:?}, the scene is not initialized yet", tweak),
            },
            FlowEvent::Exit => event_loop.exit(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let fetched = self.poll_asset();
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let Some(fetched) = fetched {
            state.receive_asset(fetched);
        }

        state.rig.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize_physical(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = state.ctx.window.inner_size();
                state.resize_physical(size.width, size.height);
            }
            WindowEvent::RedrawRequested => match state.render() {
                Ok(_) => {}
                // lost or outdated surfaces come back after a reconfigure
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = state.ctx.window.inner_size();
                    state.resize_physical(size.width, size.height);
                }
                Err(e) => {
                    log::error!("Unable to render {}", e);
                }
            },
            _ => {}
        }
    }
}

/// Owns the event loop until [`Runner::run`] is called.
pub struct Runner {
    event_loop: EventLoop<FlowEvent>,
}

impl Runner {
    pub fn new() -> anyhow::Result<Self> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Err(e) = env_logger::try_init() {
                eprintln!("Logger already initialised: {}", e);
            };
        }

        #[cfg(target_arch = "wasm32")]
        {
            console_log::init_with_level(log::Level::Info)?;
        }

        let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
        Ok(Self { event_loop })
    }

    pub fn tweaks(&self) -> TweakSender {
        TweakSender(self.event_loop.create_proxy())
    }

    pub fn run(self) -> anyhow::Result<()> {
        let mut app = App::new(&self.event_loop)?;
        self.event_loop.run_app(&mut app)?;
        Ok(())
    }
}

pub fn run() -> anyhow::Result<()> {
    Runner::new()?.run()
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    use winit::platform::web::EventLoopExtWebSys;

    let to_js = |e: anyhow::Error| JsValue::from_str(&format!("{:#}", e));
    let runner = Runner::new().map_err(to_js)?;
    let app = App::new(&runner.event_loop).map_err(to_js)?;
    runner.event_loop.spawn_app(app);
    Ok(())
}
