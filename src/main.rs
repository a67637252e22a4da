//! Color Cluster entry point
//!
//! Handles platform-specific initialization and runs the game loop.
//! On the web the page's UI drives sessions by dispatching `cluster-start`,
//! `cluster-stop` and `cluster-resume` events on the `#field` element; the
//! host answers with `cluster-complete` when the puzzle is solved.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_host {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{Event, HtmlElement, PointerEvent};

    use color_cluster::consts::DOT_SIZE;
    use color_cluster::engine::{ClusterGame, FrameScheduler, FrameSink, FrameTicket};
    use color_cluster::sim::{Arena, DotView, PointerKind};
    use color_cluster::{Palette, Settings};

    /// `requestAnimationFrame`-backed scheduler
    struct RafScheduler {
        host: Weak<RefCell<Host>>,
        pending: Option<(FrameTicket, i32)>,
    }

    impl FrameScheduler for RafScheduler {
        fn request_frame(&mut self, ticket: FrameTicket) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let host = self.host.clone();
            let closure = Closure::once(move |time: f64| {
                if let Some(host) = host.upgrade() {
                    on_frame(&host, ticket, time);
                }
            });
            match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
                Ok(id) => self.pending = Some((ticket, id)),
                Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
            }
            closure.forget();
        }

        fn cancel_frame(&mut self, ticket: FrameTicket) {
            if let Some((pending, id)) = self.pending {
                if pending == ticket {
                    self.pending = None;
                    if let Some(window) = web_sys::window() {
                        let _ = window.cancel_animation_frame(id);
                    }
                }
            }
        }
    }

    /// Positions one absolutely-placed element per dot
    struct DomSink<'a> {
        els: &'a [HtmlElement],
    }

    impl FrameSink for DomSink<'_> {
        fn present(&mut self, dots: &[DotView]) {
            for (dot, el) in dots.iter().zip(self.els) {
                let transform = format!(
                    "translate3d({}px, {}px, 0)",
                    dot.pos.x - DOT_SIZE / 2.0,
                    dot.pos.y - DOT_SIZE / 2.0
                );
                let _ = el.style().set_property("transform", &transform);
            }
        }
    }

    struct Host {
        game: ClusterGame<RafScheduler>,
        field: HtmlElement,
        dot_els: Vec<HtmlElement>,
        last_time: Option<f64>,
    }

    impl Host {
        /// Live field size; `None` while the element has no layout
        fn measure_arena(&self) -> Option<Arena> {
            let rect = self.field.get_bounding_client_rect();
            (rect.width() > 0.0 && rect.height() > 0.0)
                .then(|| Arena::new(rect.width() as f32, rect.height() as f32))
        }

        fn start(&mut self) {
            let mut settings = Settings::load().applied();
            let palette = match settings.palette() {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("Bad palette ({}), using defaults", e);
                    settings = Settings::default();
                    settings.palette().unwrap_or(Palette(Vec::new()))
                }
            };
            self.game.configure_from(&settings);

            let Some(arena) = self.measure_arena() else {
                log::warn!("Field has no size yet; not starting");
                return;
            };
            self.last_time = None;
            self.game.start(arena);
            self.rebuild_dots(&palette);
        }

        /// One element per dot, colored by palette index
        fn rebuild_dots(&mut self, palette: &Palette) {
            for el in self.dot_els.drain(..) {
                el.remove();
            }
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            for dot in self.game.snapshot() {
                let Ok(el) = document.create_element("div") else {
                    continue;
                };
                let Ok(el) = el.dyn_into::<HtmlElement>() else {
                    continue;
                };
                el.set_class_name("dot");
                let style = el.style();
                let size = format!("{}px", DOT_SIZE);
                let _ = style.set_property("position", "absolute");
                let _ = style.set_property("border-radius", "50%");
                let _ = style.set_property("width", &size);
                let _ = style.set_property("height", &size);
                let _ = style.set_property(
                    "background-color",
                    &palette.color_for(dot.color).to_string(),
                );
                let _ = self.field.append_child(&el);
                self.dot_els.push(el);
            }
            DomSink { els: &self.dot_els }.present(self.game.snapshot());
        }
    }

    fn on_frame(host: &Rc<RefCell<Host>>, ticket: FrameTicket, time: f64) {
        // Page handlers for `cluster-complete` may dispatch `cluster-start`
        // or `cluster-stop`, which borrow the host again
        super::step_then_notify(
            host.as_ref(),
            |host: &mut Host| {
                let delta = host
                    .last_time
                    .map(|last| ((time - last) / 1000.0) as f32)
                    .unwrap_or(0.0);
                host.last_time = Some(time);

                let arena = host.measure_arena();
                host.game.set_arena(arena);

                let Host { game, dot_els, .. } = &mut *host;
                let report = game.frame(
                    ticket,
                    delta,
                    &mut DomSink {
                        els: dot_els.as_slice(),
                    },
                );
                report
                    .completed
                    .then(|| (host.field.clone(), host.game.session_time()))
            },
            |(field, secs)| {
                log::info!("Puzzle solved in {:.1}s", secs);
                let _ = field.set_attribute("data-state", "won");
                if let Ok(event) = Event::new("cluster-complete") {
                    let _ = field.dispatch_event(&event);
                }
            },
        );
    }

    fn listen<F>(target: &HtmlElement, event: &str, handler: F)
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(host: &Rc<RefCell<Host>>) {
        let field = host.borrow().field.clone();

        let h = host.clone();
        listen(&field, "pointermove", move |e: Event| {
            let Ok(e) = e.dyn_into::<PointerEvent>() else {
                return;
            };
            let mut h = h.borrow_mut();
            let rect = h.field.get_bounding_client_rect();
            let x = e.client_x() as f32 - rect.left() as f32;
            let y = e.client_y() as f32 - rect.top() as f32;
            h.game
                .pointer_move(x, y, PointerKind::from_pointer_type(&e.pointer_type()));
        });

        let h = host.clone();
        listen(&field, "pointerleave", move |_| h.borrow_mut().game.pointer_leave());

        let h = host.clone();
        listen(&field, "cluster-start", move |_| {
            let mut h = h.borrow_mut();
            let _ = h.field.remove_attribute("data-state");
            h.start();
        });

        let h = host.clone();
        listen(&field, "cluster-stop", move |_| h.borrow_mut().game.stop());

        let h = host.clone();
        listen(&field, "cluster-resume", move |_| {
            let mut h = h.borrow_mut();
            h.last_time = None;
            h.game.resume();
        });
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }
        log::info!("Color Cluster starting...");

        let Some(field) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("field"))
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            log::error!("No #field element; nothing to drive");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let host = Rc::new_cyclic(|weak: &Weak<RefCell<Host>>| {
            let scheduler = RafScheduler {
                host: weak.clone(),
                pending: None,
            };
            RefCell::new(Host {
                game: ClusterGame::new(scheduler, seed),
                field,
                dot_els: Vec::new(),
                last_time: None,
            })
        });

        setup_input_handlers(&host);
        host.borrow_mut().start();
        log::info!("Color Cluster running!");
    }
}

/// Runs `step` under a mutable borrow of `cell` and hands its result to
/// `notify` once the borrow is released, so `notify` may borrow `cell` again.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn step_then_notify<T, R>(
    cell: &std::cell::RefCell<T>,
    step: impl FnOnce(&mut T) -> Option<R>,
    notify: impl FnOnce(R),
) {
    let outcome = step(&mut cell.borrow_mut());
    if let Some(outcome) = outcome {
        notify(outcome);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_host::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Color Cluster (native) starting...");

    let path = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("color_cluster_settings.json"));
    let settings = match color_cluster::Settings::load_from(&path) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Could not load {}: {}", path.display(), e);
            color_cluster::Settings::default()
        }
    };

    headless::run(&settings, rand::random());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless session with a scripted pointer, for smoke-testing the engine natively
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use color_cluster::engine::{ClusterGame, ManualScheduler};
    use color_cluster::sim::{Arena, DotView, PointerKind};
    use color_cluster::Settings;

    /// Two simulated minutes at 60 fps
    const MAX_FRAMES: u32 = 60 * 120;
    const FRAME_DT: f32 = 1.0 / 60.0;

    pub fn run(settings: &Settings, seed: u64) {
        let arena = Arena::new(800.0, 560.0);
        let mut game = ClusterGame::new(ManualScheduler::new(), seed);
        game.configure_from(settings);
        game.start(arena);

        let mut presented = 0u64;
        let mut sink = |_: &[DotView]| presented += 1;

        let mut frames = 0;
        let mut won = false;
        while frames < MAX_FRAMES {
            // Sweep the pointer along a Lissajous path over the field
            let t = frames as f32 * FRAME_DT;
            let x = arena.width * (0.5 + 0.45 * (t * 0.7).sin());
            let y = arena.height * (0.5 + 0.45 * (t * 1.1).cos());
            game.pointer_move(x, y, PointerKind::Fine);

            let Some(report) = game.pump(FRAME_DT, &mut sink) else {
                break;
            };
            frames += 1;
            if report.completed {
                won = true;
                break;
            }
        }
        game.stop();

        log::info!(
            "Headless run: seed {}, {} frames, {} snapshots, {:.1}s simulated",
            seed,
            frames,
            presented,
            game.session_time()
        );
        if won {
            println!("✓ Sorted after {:.1}s", game.session_time());
        } else {
            println!("✗ Not sorted after {:.1}s", game.session_time());
        }
    }
}
