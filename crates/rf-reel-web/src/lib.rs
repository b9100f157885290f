// ============================================================================
// REELFORGE WEB — Slot reel widget
// WebAssembly bindings for the ReelForge reel animation controller
// ============================================================================

pub mod browser;
pub mod dom;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rf_reel::{seeded, ReelConfig, ReelError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::EventTarget;

pub use browser::{BrowserScheduler, WidgetController};
pub use dom::{DomIds, DomScene};

// ============================================================================
// INITIALIZATION
// ============================================================================

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("[ReelForge Web] Initialized");
}

/// Build the widget over the default markup and wire its listeners
#[wasm_bindgen]
pub fn mount() -> Result<SlotMachineWidget, JsValue> {
    let mut widget = SlotMachineWidget::new()?;
    widget.mount()?;
    Ok(widget)
}

fn to_js(err: ReelError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ============================================================================
// WIDGET
// ============================================================================

struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut()>,
}

/// Slot machine widget bound to the page
#[wasm_bindgen]
pub struct SlotMachineWidget {
    controller: Rc<RefCell<WidgetController>>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl SlotMachineWidget {
    /// Classic three-reel widget over the default element ids
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<SlotMachineWidget, JsValue> {
        Self::build(ReelConfig::classic(), DomIds::default())
    }

    /// Widget from a JSON `ReelConfig` and optional JSON `DomIds`
    #[wasm_bindgen]
    pub fn with_config_json(
        config_json: &str,
        ids_json: Option<String>,
    ) -> Result<SlotMachineWidget, JsValue> {
        let config = ReelConfig::from_json(config_json).map_err(to_js)?;
        let ids = match ids_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| JsValue::from_str(&format!("JSON parse error: {}", e)))?,
            None => DomIds::default(),
        };
        Self::build(config, ids)
    }

    /// Attach the spin click handler and populate reels on page load
    #[wasm_bindgen]
    pub fn mount(&mut self) -> Result<(), JsValue> {
        if !self.listeners.is_empty() {
            return Ok(());
        }
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;

        let trigger: Option<EventTarget> = self
            .controller
            .borrow()
            .scene()
            .trigger()
            .map(|button| button.clone().unchecked_into());
        match trigger {
            Some(button) => {
                let weak = Rc::downgrade(&self.controller);
                self.listen(button, "click", move || {
                    with_controller(&weak, |c| {
                        c.spin();
                    })
                })?;
            }
            None => log::warn!("[ReelForge Web] No play button, spins must be triggered from JS"),
        }

        if document.ready_state() == "complete" {
            self.controller.borrow_mut().initialize_reels();
        } else {
            let weak = Rc::downgrade(&self.controller);
            self.listen(window.unchecked_into(), "load", move || {
                with_controller(&weak, |c| c.initialize_reels())
            })?;
        }

        log::info!("[ReelForge Web] Widget mounted");
        Ok(())
    }

    #[wasm_bindgen]
    pub fn initialize_reels(&self) {
        self.controller.borrow_mut().initialize_reels();
    }

    /// Start a spin; `false` if one is already running
    #[wasm_bindgen]
    pub fn spin(&self) -> bool {
        self.controller.borrow_mut().spin()
    }

    #[wasm_bindgen]
    pub fn is_spinning(&self) -> bool {
        self.controller.borrow().is_spinning()
    }

    #[wasm_bindgen]
    pub fn phase(&self) -> String {
        self.controller.borrow().phase().name().to_string()
    }

    /// Timeline of the current spin as a JS object
    #[wasm_bindgen]
    pub fn trace(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.controller.borrow().trace()).map_err(Into::into)
    }

    #[wasm_bindgen]
    pub fn trace_json(&self) -> Result<String, JsValue> {
        self.controller
            .borrow()
            .trace()
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Session statistics as a JS object
    #[wasm_bindgen]
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.controller.borrow().stats()).map_err(Into::into)
    }

    /// Browser timers and frames currently armed
    #[wasm_bindgen]
    pub fn armed_timers(&self) -> u32 {
        self.controller.borrow().scheduler().armed_count() as u32
    }

    #[wasm_bindgen]
    pub fn hit_rate(&self) -> f64 {
        self.controller.borrow().stats().hit_rate()
    }

    /// Cancel pending timers and detach listeners
    #[wasm_bindgen]
    pub fn dispose(&mut self) {
        self.detach();
        self.controller.borrow_mut().dispose();
        log::info!("[ReelForge Web] Widget disposed");
    }
}

impl SlotMachineWidget {
    fn build(config: ReelConfig, ids: DomIds) -> Result<SlotMachineWidget, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;

        let scene = DomScene::attach(&document, &ids)?;
        if scene.reel_count() != config.reel_count {
            return Err(JsValue::from_str(&format!(
                "Config has {} reels, markup has {}",
                config.reel_count,
                scene.reel_count()
            )));
        }

        let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
        let scheduler = BrowserScheduler::new(window);
        let controller = WidgetController::new(config, scene, scheduler, seeded(seed))
            .map_err(to_js)?;

        let controller = Rc::new(RefCell::new(controller));
        controller
            .borrow_mut()
            .scheduler_mut()
            .bind(Rc::downgrade(&controller));

        Ok(SlotMachineWidget {
            controller,
            listeners: Vec::new(),
        })
    }

    fn listen(
        &mut self,
        target: EventTarget,
        event: &'static str,
        handler: impl FnMut() + 'static,
    ) -> Result<(), JsValue> {
        let callback = Closure::<dyn FnMut()>::wrap(Box::new(handler));
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        self.listeners.push(Listener {
            target,
            event,
            callback,
        });
        Ok(())
    }

    fn detach(&mut self) {
        for listener in self.listeners.drain(..) {
            listener
                .target
                .remove_event_listener_with_callback(
                    listener.event,
                    listener.callback.as_ref().unchecked_ref(),
                )
                .ok();
        }
    }
}

impl Drop for SlotMachineWidget {
    fn drop(&mut self) {
        self.detach();
    }
}

fn with_controller(weak: &Weak<RefCell<WidgetController>>, f: impl FnOnce(&mut WidgetController)) {
    let Some(controller) = weak.upgrade() else {
        return;
    };
    match controller.try_borrow_mut() {
        Ok(mut c) => f(&mut c),
        Err(_) => log::warn!("[ReelForge Web] Controller busy, event dropped"),
    };
}
