// ============================================================================
// REELFORGE WEB — Browser scheduler
// setTimeout / setInterval / requestAnimationFrame behind the Scheduler trait
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

use rand::rngs::StdRng;
use rf_reel::{ReelAnimationController, ReelTask, Scheduler, TaskHandle};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Performance, Window};

use crate::dom::DomScene;

/// Controller as wired in the page
pub type WidgetController = ReelAnimationController<DomScene, BrowserScheduler, StdRng>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerKind {
    Timeout,
    Interval,
    Frame,
}

struct Armed {
    kind: TimerKind,
    /// Browser timer / frame id
    id: i32,
    callback: Closure<dyn FnMut()>,
}

/// [`Scheduler`] backed by the window's timers.
///
/// Fired callbacks re-enter the controller through a weak reference set with
/// [`bind`](BrowserScheduler::bind); a widget that has been dropped simply
/// ignores its late timers.
pub struct BrowserScheduler {
    window: Window,
    performance: Option<Performance>,
    target: Weak<RefCell<WidgetController>>,
    next_handle: u64,
    armed: HashMap<TaskHandle, Armed>,
    /// Callbacks that may still be on the JS stack; dropped on the next fire
    retired: Vec<Closure<dyn FnMut()>>,
}

impl BrowserScheduler {
    pub fn new(window: Window) -> Self {
        let performance = window.performance();
        Self {
            window,
            performance,
            target: Weak::new(),
            next_handle: 1,
            armed: HashMap::new(),
            retired: Vec::new(),
        }
    }

    /// Point fired callbacks at the controller that owns this scheduler
    pub fn bind(&mut self, target: Weak<RefCell<WidgetController>>) {
        self.target = target;
    }

    /// Armed timers and frames
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    fn arm(&mut self, kind: TimerKind, delay_ms: f64, task: ReelTask) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;

        let target = self.target.clone();
        let callback = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            fire(&target, handle, task);
        }));
        let function = callback.as_ref().unchecked_ref();
        let timeout = delay_ms.max(0.0).round() as i32;

        let id = match kind {
            TimerKind::Timeout => self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(function, timeout),
            TimerKind::Interval => self
                .window
                .set_interval_with_callback_and_timeout_and_arguments_0(function, timeout),
            TimerKind::Frame => self.window.request_animation_frame(function),
        };

        match id {
            Ok(id) => {
                self.armed.insert(handle, Armed { kind, id, callback });
            }
            Err(e) => log::error!("[ReelForge Web] Failed to arm {:?}: {:?}", task, e),
        }
        handle
    }

    fn clear(&self, armed: &Armed) {
        match armed.kind {
            TimerKind::Timeout => self.window.clear_timeout_with_handle(armed.id),
            TimerKind::Interval => self.window.clear_interval_with_handle(armed.id),
            TimerKind::Frame => {
                self.window.cancel_animation_frame(armed.id).ok();
            }
        }
    }

    /// Bookkeeping before a fired task is dispatched
    fn on_fired(&mut self, handle: TaskHandle) {
        self.retired.clear();
        let one_shot = self
            .armed
            .get(&handle)
            .is_some_and(|a| a.kind != TimerKind::Interval);
        if one_shot {
            if let Some(armed) = self.armed.remove(&handle) {
                self.retired.push(armed.callback);
            }
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn now_ms(&self) -> f64 {
        self.performance
            .as_ref()
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn set_timeout(&mut self, delay_ms: f64, task: ReelTask) -> TaskHandle {
        self.arm(TimerKind::Timeout, delay_ms, task)
    }

    fn set_interval(&mut self, period_ms: f64, task: ReelTask) -> TaskHandle {
        self.arm(TimerKind::Interval, period_ms, task)
    }

    fn request_frame(&mut self, task: ReelTask) -> TaskHandle {
        self.arm(TimerKind::Frame, 0.0, task)
    }

    fn cancel(&mut self, handle: TaskHandle) {
        if let Some(armed) = self.armed.remove(&handle) {
            self.clear(&armed);
            self.retired.push(armed.callback);
        }
    }
}

impl Drop for BrowserScheduler {
    fn drop(&mut self) {
        for armed in self.armed.values() {
            self.clear(armed);
        }
    }
}

fn fire(target: &Weak<RefCell<WidgetController>>, handle: TaskHandle, task: ReelTask) {
    let Some(widget) = target.upgrade() else {
        return;
    };
    let Ok(mut controller) = widget.try_borrow_mut() else {
        log::warn!("[ReelForge Web] Controller busy, dropped {:?}", task);
        return;
    };
    controller.scheduler_mut().on_fired(handle);
    controller.dispatch(handle, task);
}
