use anyhow::{Context, Result};
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_layer, delegate_output, delegate_pointer, delegate_registry,
    delegate_seat, delegate_shm,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    seat::{SeatHandler, SeatState},
    shell::wlr_layer::{
        Anchor, KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
        LayerSurfaceConfigure,
    },
    shell::WaylandSurface,
    shm::{slot::SlotPool, Shm, ShmHandler},
};
use smithay_client_toolkit::seat::pointer::{PointerEvent, PointerEventKind, PointerHandler};
use wayland_client::{
    globals::registry_queue_init,
    protocol::{wl_output, wl_pointer, wl_seat, wl_shm, wl_surface},
    Connection, QueueHandle,
};

use chrono::{Timelike, Utc};
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::canvas::{Canvas, FontState};
use crate::cities::{self, CITIES};
use crate::config::{self, WidgetConfig};
use crate::ipc;
use crate::locale::Language;
use crate::renderer::{self, Frame, HitAction};
use crate::scheduler::TickScheduler;
use crate::state::{Highlight, WidgetState};
use crate::time_utils::{self, ClockTime};

/// How long a digit flash stays lit before the frame loop clears it.
const HIGHLIGHT_ANIMATION: Duration = Duration::from_millis(600);

pub struct Chronomap {
    registry_state: RegistryState,
    seat_state: SeatState,
    output_state: OutputState,
    shm: Shm,
    pool: SlotPool,

    layer_surface: LayerSurface,
    width: u32,
    height: u32,
    configured: bool,
    needs_redraw: bool,

    config: WidgetConfig,
    config_path: PathBuf,
    font: FontState,

    pointer: Option<wl_pointer::WlPointer>,

    // Per-tick render inputs, refreshed by tick() and on interaction.
    widget: WidgetState,
    snapshot: ClockTime,
    offset_label: String,
    night: Vec<bool>,
    utc_minutes: u32,

    // IPC
    ipc_listener: UnixListener,
    ipc_socket_path: PathBuf,

    should_quit: bool,
}

pub fn run(config: WidgetConfig, config_path: PathBuf, socket_override: Option<PathBuf>) -> Result<()> {
    let conn = Connection::connect_to_env().context(
        "Failed to connect to Wayland. Ensure a Wayland compositor with wlr-layer-shell support is running."
    )?;

    let (globals, mut event_queue) = registry_queue_init(&conn)
        .context("Failed to initialize Wayland registry")?;
    let qh = event_queue.handle();

    let compositor = CompositorState::bind(&globals, &qh)
        .context("wl_compositor not available")?;
    let layer_shell = LayerShell::bind(&globals, &qh)
        .context("wlr-layer-shell not available. Your compositor must support the wlr_layer_shell_v1 protocol.")?;
    let shm = Shm::bind(&globals, &qh)
        .context("wl_shm not available")?;

    let surface = compositor.create_surface(&qh);
    let layer = parse_layer(&config.window.layer);
    let layer_surface = layer_shell.create_layer_surface(&qh, surface, layer, Some("chronomap"), None);

    let font = FontState::new(&config.clock.font);
    let (init_w, init_h) = renderer::compute_size(&config);

    layer_surface.set_size(init_w, init_h);
    layer_surface.set_anchor(parse_anchor(&config.window.anchor));
    layer_surface.set_margin(
        config.window.margin_top,
        config.window.margin_right,
        config.window.margin_bottom,
        config.window.margin_left,
    );
    layer_surface.set_exclusive_zone(0);
    layer_surface.set_keyboard_interactivity(KeyboardInteractivity::None);
    layer_surface.commit();

    let pool = SlotPool::new((init_w * init_h * 4) as usize, &shm)
        .context("Failed to create SHM pool")?;

    let ipc_socket_path = ipc::socket_path(socket_override.as_ref());
    let ipc_listener = ipc::create_listener(&ipc_socket_path)?;

    let city = cities::find(&config.widget.default_city).unwrap_or_else(|| {
        log::warn!(
            "Unknown default_city '{}', falling back to {}",
            config.widget.default_city,
            cities::DEFAULT_CITY_ID
        );
        cities::default_city()
    });
    let language = Language::from_code(&config.widget.default_language);
    let widget = WidgetState::new(city, language);

    let now = Utc::now();
    let snapshot = time_utils::snapshot(now, city.tz, language);
    let offset_label = time_utils::offset_label_or_fallback(now, city.tz);
    let night = time_utils::night_flags(now);
    let utc_minutes = now.hour() * 60 + now.minute();

    let mut chronomap = Chronomap {
        registry_state: RegistryState::new(&globals),
        seat_state: SeatState::new(&globals, &qh),
        output_state: OutputState::new(&globals, &qh),
        shm,
        pool,
        layer_surface,
        width: init_w,
        height: init_h,
        configured: false,
        needs_redraw: true,
        config,
        config_path,
        font,
        pointer: None,
        widget,
        snapshot,
        offset_label,
        night,
        utc_minutes,
        ipc_listener,
        ipc_socket_path,
        should_quit: false,
    };

    // Signal handling
    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        }).expect("Failed to set signal handler");
    }

    // Render once right away, then align the 1 Hz tick to second boundaries.
    let mut scheduler = TickScheduler::start(Instant::now(), Utc::now().timestamp_millis());

    loop {
        if chronomap.should_quit || !running.load(Ordering::SeqCst) {
            break;
        }

        // Dispatch Wayland events, blocking until the next tick deadline
        // (capped so the IPC socket is still polled regularly).
        event_queue.flush()?;
        if let Some(guard) = event_queue.prepare_read() {
            let timeout = scheduler
                .poll_timeout(Instant::now())
                .min(Duration::from_millis(100));
            let fd = guard.connection_fd();
            let mut fds = [nix::poll::PollFd::new(fd, nix::poll::PollFlags::POLLIN)];
            let _ = nix::poll::poll(&mut fds, nix::poll::PollTimeout::from(timeout.as_millis() as u16));
            if fds[0].revents().map_or(false, |r| r.contains(nix::poll::PollFlags::POLLIN)) {
                guard.read()?;
            } else {
                drop(guard);
            }
        }
        event_queue.dispatch_pending(&mut chronomap)?;

        chronomap.poll_ipc();

        let now = Instant::now();
        if scheduler.due(now) {
            scheduler.advance(now);
            chronomap.tick();
        }

        if chronomap.configured && chronomap.needs_redraw {
            chronomap.draw(&qh);
            chronomap.needs_redraw = false;
        }
    }

    ipc::cleanup_socket(&chronomap.ipc_socket_path);

    Ok(())
}

fn parse_layer(name: &str) -> Layer {
    match name {
        "background" => Layer::Background,
        "bottom" => Layer::Bottom,
        "top" => Layer::Top,
        "overlay" => Layer::Overlay,
        _ => Layer::Top,
    }
}

fn parse_anchor(spec: &str) -> Anchor {
    let mut anchor = Anchor::empty();
    for part in spec.split_whitespace() {
        match part.to_lowercase().as_str() {
            "top" => anchor |= Anchor::TOP,
            "bottom" => anchor |= Anchor::BOTTOM,
            "left" => anchor |= Anchor::LEFT,
            "right" => anchor |= Anchor::RIGHT,
            _ => {}
        }
    }
    anchor
}

impl Chronomap {
    /// One render cycle: take a fresh snapshot in the selected zone, run
    /// the rollover comparison, and refresh the per-city night flags.
    fn tick(&mut self) {
        let now = Utc::now();
        let city = self.widget.city;
        self.snapshot = time_utils::snapshot(now, city.tz, self.widget.language);
        self.widget.observe(self.snapshot.minute, self.snapshot.second);
        self.offset_label = time_utils::offset_label_or_fallback(now, city.tz);
        self.night = time_utils::night_flags(now);
        self.utc_minutes = now.hour() * 60 + now.minute();
        self.needs_redraw = true;
    }

    /// Recompute window size from content and apply if changed.
    fn update_size(&mut self) {
        let (new_w, new_h) = renderer::compute_size(&self.config);
        if new_w != self.width || new_h != self.height {
            self.width = new_w;
            self.height = new_h;
            self.layer_surface.set_size(self.width, self.height);
            self.layer_surface.set_margin(
                self.config.window.margin_top,
                self.config.window.margin_right,
                self.config.window.margin_bottom,
                self.config.window.margin_left,
            );
            self.layer_surface.wl_surface().commit();
        }
        self.needs_redraw = true;
    }

    fn draw(&mut self, qh: &QueueHandle<Self>) {
        let width = self.width;
        let height = self.height;

        if width == 0 || height == 0 { return; }

        let stride = width as i32 * 4;
        let buf_size = (stride * height as i32) as usize;

        if self.pool.len() < buf_size {
            self.pool.resize(buf_size).expect("Failed to resize SHM pool");
        }

        let (buffer, canvas_data) = self.pool
            .create_buffer(width as i32, height as i32, stride, wl_shm::Format::Argb8888)
            .expect("Failed to create buffer");

        let mut canvas = Canvas::new(width, height);
        let frame = Frame {
            config: &self.config,
            city: self.widget.city,
            language: self.widget.language,
            time: &self.snapshot,
            millis: Utc::now().timestamp_subsec_millis(),
            offset_label: &self.offset_label,
            highlight: self.widget.highlight,
            utc_minutes: self.utc_minutes,
            night: &self.night,
        };
        renderer::render(&mut canvas, &frame, &self.font);

        // Apply window opacity
        let opacity = self.config.window.opacity;
        if opacity < 1.0 {
            let data = canvas.pixmap.data_mut();
            let scale = (opacity * 255.0) as u32;
            for i in (0..data.len()).step_by(4) {
                data[i + 3] = ((data[i + 3] as u32 * scale) / 255) as u8;
            }
        }

        // Copy pixels with RGBA→BGRA swizzle
        let pixels = canvas.pixels_argb8888();
        canvas_data[..pixels.len()].copy_from_slice(&pixels);

        // Attach and commit; the frame callback keeps the millisecond
        // counter running between ticks.
        let surface = self.layer_surface.wl_surface();
        buffer.attach_to(surface).expect("Failed to attach buffer");
        surface.damage_buffer(0, 0, width as i32, height as i32);
        surface.frame(qh, surface.clone());
        surface.commit();
    }

    fn handle_press(&mut self, x: f64, y: f64) {
        let layout = renderer::layout(&self.config, self.width, self.height);
        match renderer::hit_test(&layout, x, y) {
            Some(HitAction::SelectCity(id)) => {
                if self.widget.select_city(id) {
                    log::info!("Selected city: {}", id);
                    self.tick();
                }
            }
            Some(HitAction::CycleLanguage) => {
                self.widget.cycle_language();
                log::info!("Language: {}", self.widget.language.code());
                self.tick();
            }
            None => {}
        }
    }

    fn poll_ipc(&mut self) {
        loop {
            match self.ipc_listener.accept() {
                Ok((stream, _)) => {
                    self.handle_ipc_connection(stream);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("IPC accept error: {}", e);
                    break;
                }
            }
        }
    }

    fn handle_ipc_connection(&mut self, stream: std::os::unix::net::UnixStream) {
        let cmd = match ipc::read_command(&stream) {
            Ok(cmd) => cmd,
            Err(e) => {
                log::warn!("IPC read error: {}", e);
                return;
            }
        };

        let response = self.handle_command(cmd);
        let mut stream = stream;
        if let Err(e) = ipc::write_response(&mut stream, &response) {
            log::warn!("IPC write error: {}", e);
        }
    }

    fn handle_command(&mut self, cmd: ipc::IpcCommand) -> ipc::IpcResponse {
        match cmd {
            ipc::IpcCommand::SelectCity { city } => {
                if self.widget.select_city(&city) {
                    self.tick();
                    ipc::IpcResponse::ok()
                } else {
                    ipc::IpcResponse::err(format!("Unknown city: {}", city))
                }
            }
            ipc::IpcCommand::NextLanguage => {
                self.widget.cycle_language();
                self.tick();
                ipc::IpcResponse::ok()
            }
            ipc::IpcCommand::SetLanguage { lang } => {
                match Language::ALL.into_iter().find(|l| l.code().eq_ignore_ascii_case(&lang)) {
                    Some(language) => {
                        self.widget.language = language;
                        self.tick();
                        ipc::IpcResponse::ok()
                    }
                    None => ipc::IpcResponse::err(format!(
                        "Unknown language: {} (expected ko-KR, en-US, or ja-JP)",
                        lang
                    )),
                }
            }
            ipc::IpcCommand::ListCities => {
                let language = self.widget.language;
                let entries = CITIES
                    .iter()
                    .map(|city| ipc::CityEntry {
                        id: city.id.to_string(),
                        abbr: city.abbr.to_string(),
                        timezone: city.tz.name().to_string(),
                        name: city.name(language).to_string(),
                    })
                    .collect();
                ipc::IpcResponse::with_cities(entries)
            }
            ipc::IpcCommand::ReloadConfig => {
                match config::load_config(&self.config_path) {
                    Ok(new_config) => {
                        // Runtime selection survives a reload (it is never
                        // persisted either).
                        self.layer_surface.set_anchor(parse_anchor(&new_config.window.anchor));
                        self.layer_surface.set_margin(
                            new_config.window.margin_top,
                            new_config.window.margin_right,
                            new_config.window.margin_bottom,
                            new_config.window.margin_left,
                        );
                        self.config = new_config;
                        self.font = FontState::new(&self.config.clock.font);
                        self.update_size();
                        self.layer_surface.wl_surface().commit();
                        ipc::IpcResponse::ok()
                    }
                    Err(e) => ipc::IpcResponse::err(format!("Config reload failed: {}", e)),
                }
            }
            ipc::IpcCommand::GetState => ipc::IpcResponse::state(
                self.widget.city.id,
                self.widget.language.code(),
                self.widget.city.tz.name(),
                &self.offset_label,
                self.width,
                self.height,
                &self.config_path.to_string_lossy(),
            ),
            ipc::IpcCommand::Quit => {
                self.should_quit = true;
                ipc::IpcResponse::ok()
            }
        }
    }
}

// SCTK handler implementations

impl CompositorHandler for Chronomap {
    fn scale_factor_changed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _new_factor: i32) {
        self.needs_redraw = true;
    }

    fn transform_changed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _new_transform: wl_output::Transform) {
        self.needs_redraw = true;
    }

    fn frame(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _time: u32) {
        // The per-frame loop is cosmetic: it advances the millisecond
        // counter and expires the digit flash. The 1 Hz tick owns time.
        let expired = self.widget.expire_highlight(HIGHLIGHT_ANIMATION);
        if expired || self.config.clock.show_millis || self.widget.highlight != Highlight::None {
            self.needs_redraw = true;
        }
    }

    fn surface_enter(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _output: &wl_output::WlOutput) {}
    fn surface_leave(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _output: &wl_output::WlOutput) {}
}

impl LayerShellHandler for Chronomap {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        self.should_quit = true;
    }

    fn configure(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface, configure: LayerSurfaceConfigure, _serial: u32) {
        if configure.new_size.0 > 0 {
            self.width = configure.new_size.0;
        }
        if configure.new_size.1 > 0 {
            self.height = configure.new_size.1;
        }
        self.configured = true;
        self.needs_redraw = true;
    }
}

impl OutputHandler for Chronomap {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn update_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn output_destroyed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
}

impl SeatHandler for Chronomap {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {}
    fn new_capability(&mut self, _conn: &Connection, qh: &QueueHandle<Self>, seat: wl_seat::WlSeat, capability: SeatCapability) {
        if capability == SeatCapability::Pointer && self.pointer.is_none() {
            self.pointer = Some(self.seat_state.get_pointer(qh, &seat).expect("Failed to get pointer"));
        }
    }
    fn remove_capability(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat, capability: SeatCapability) {
        if capability == SeatCapability::Pointer {
            if let Some(pointer) = self.pointer.take() {
                pointer.release();
            }
        }
    }
    fn remove_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {}
}

use smithay_client_toolkit::seat::Capability as SeatCapability;

impl ShmHandler for Chronomap {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl ProvidesRegistryState for Chronomap {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState, SeatState];
}

const BTN_LEFT: u32 = 0x110;

impl PointerHandler for Chronomap {
    fn pointer_frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _pointer: &wl_pointer::WlPointer,
        events: &[PointerEvent],
    ) {
        for event in events {
            if let PointerEventKind::Press { button, .. } = event.kind {
                if button == BTN_LEFT {
                    self.handle_press(event.position.0, event.position.1);
                }
            }
        }
    }
}

delegate_compositor!(Chronomap);
delegate_layer!(Chronomap);
delegate_output!(Chronomap);
delegate_pointer!(Chronomap);
delegate_registry!(Chronomap);
delegate_seat!(Chronomap);
delegate_shm!(Chronomap);
