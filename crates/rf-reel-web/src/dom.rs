// ============================================================================
// REELFORGE WEB — DOM scene
// Binds the reel controller's scene operations to the page markup
// ============================================================================

use rf_reel::{ReelGeometry, ReelScene, SlotBox, StripMotion, Symbol};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlButtonElement, HtmlElement, HtmlImageElement};

// ============================================================================
// MARKUP BINDING
// ============================================================================

/// Element ids and class names of the widget markup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomIds {
    /// Reel viewport ids, left to right
    pub reels: Vec<String>,
    pub play_button: String,
    pub splash: String,
    pub message: String,
    pub strip_class: String,
    pub item_class: String,
    pub spinning_class: String,
    pub hidden_class: String,
    pub show_class: String,
    pub jackpot_class: String,
    /// `alt` text of slot images
    pub item_alt: String,
}

impl Default for DomIds {
    fn default() -> Self {
        Self {
            reels: vec!["reel1".into(), "reel2".into(), "reel3".into()],
            play_button: "playButton".into(),
            splash: "tvSplash".into(),
            message: "winMessage".into(),
            strip_class: "reel-strip".into(),
            item_class: "reel-item".into(),
            spinning_class: "spinning".into(),
            hidden_class: "hidden".into(),
            show_class: "show".into(),
            jackpot_class: "jackpot".into(),
            item_alt: "Slot item".into(),
        }
    }
}

struct ReelNodes {
    viewport: HtmlElement,
    strip: HtmlElement,
    items: Vec<HtmlImageElement>,
}

// ============================================================================
// SCENE
// ============================================================================

/// [`ReelScene`] over the live document
pub struct DomScene {
    document: Document,
    ids: DomIds,
    reels: Vec<ReelNodes>,
    splash: Option<HtmlElement>,
    trigger: Option<HtmlButtonElement>,
    message: Option<HtmlElement>,
}

impl DomScene {
    /// Look up the widget markup. Reels and their strips are required; splash,
    /// button and banner are optional.
    pub fn attach(document: &Document, ids: &DomIds) -> Result<Self, JsValue> {
        let mut reels = Vec::with_capacity(ids.reels.len());
        for id in &ids.reels {
            let viewport = element::<HtmlElement>(document, id)
                .ok_or_else(|| JsValue::from_str(&format!("Reel element #{} not found", id)))?;
            let strip = viewport
                .query_selector(&format!(".{}", ids.strip_class))?
                .and_then(|e| e.dyn_into::<HtmlElement>().ok())
                .ok_or_else(|| {
                    JsValue::from_str(&format!("#{} has no .{}", id, ids.strip_class))
                })?;
            let items = images_in(&strip, &ids.item_class)?;
            reels.push(ReelNodes {
                viewport,
                strip,
                items,
            });
        }

        Ok(Self {
            document: document.clone(),
            splash: element(document, &ids.splash),
            trigger: element(document, &ids.play_button),
            message: element(document, &ids.message),
            ids: ids.clone(),
            reels,
        })
    }

    pub fn reel_count(&self) -> usize {
        self.reels.len()
    }

    /// The spin button, if the markup has one
    pub fn trigger(&self) -> Option<&HtmlButtonElement> {
        self.trigger.as_ref()
    }

    fn create_item(&self, symbol: &Symbol) -> Result<HtmlImageElement, JsValue> {
        let img = self
            .document
            .create_element("img")?
            .dyn_into::<HtmlImageElement>()?;
        img.set_src(&symbol.path);
        img.set_class_name(&self.ids.item_class);
        img.set_alt(&self.ids.item_alt);
        Ok(img)
    }
}

impl ReelScene for DomScene {
    fn populate_strip(&mut self, reel: usize, symbols: &[&Symbol]) {
        let mut items = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.create_item(symbol) {
                Ok(img) => items.push(img),
                Err(e) => log::warn!("[ReelForge Web] Failed to create slot: {:?}", e),
            }
        }

        let Some(nodes) = self.reels.get_mut(reel) else {
            return;
        };
        for old in nodes.items.drain(..) {
            old.remove();
        }
        for img in &items {
            if let Err(e) = nodes.strip.append_child(img) {
                log::warn!("[ReelForge Web] Failed to append slot: {:?}", e);
            }
        }
        nodes.items = items;
    }

    fn set_slot_symbol(&mut self, reel: usize, slot: usize, symbol: &Symbol) {
        if let Some(img) = self.reels.get(reel).and_then(|r| r.items.get(slot)) {
            img.set_src(&symbol.path);
        }
    }

    fn slot_source(&self, reel: usize, slot: usize) -> Option<String> {
        self.reels
            .get(reel)?
            .items
            .get(slot)?
            .get_attribute("src")
    }

    fn set_spinning(&mut self, reel: usize, spinning: bool) {
        if let Some(nodes) = self.reels.get(reel) {
            let classes = nodes.strip.class_list();
            let result = if spinning {
                classes.add_1(&self.ids.spinning_class)
            } else {
                classes.remove_1(&self.ids.spinning_class)
            };
            if let Err(e) = result {
                log::warn!("[ReelForge Web] Spinning class on reel {}: {:?}", reel, e);
            }
        }
    }

    fn set_strip_motion(&mut self, reel: usize, motion: &StripMotion) {
        let Some(nodes) = self.reels.get(reel) else {
            return;
        };
        let transition = match motion.transition {
            Some(t) => format!("transform {}s {}", t.duration_ms / 1000.0, t.easing.css()),
            None => "none".to_string(),
        };
        let transform = if motion.offset_px == 0.0 {
            "translateY(0)".to_string()
        } else {
            format!("translateY({}px)", -motion.offset_px)
        };

        let style = nodes.strip.style();
        let applied = style
            .set_property("transition", &transition)
            .and_then(|_| style.set_property("transform", &transform));
        if let Err(e) = applied {
            log::warn!("[ReelForge Web] Strip style on reel {}: {:?}", reel, e);
        }
    }

    fn measure(&self, reel: usize) -> ReelGeometry {
        let Some(nodes) = self.reels.get(reel) else {
            return ReelGeometry::default();
        };
        let viewport = nodes.viewport.get_bounding_client_rect();
        let slots = nodes
            .items
            .iter()
            .map(|img| {
                let rect = img.get_bounding_client_rect();
                SlotBox {
                    top: rect.top(),
                    height: rect.height(),
                }
            })
            .collect();
        ReelGeometry {
            viewport_top: viewport.top(),
            viewport_height: viewport.height(),
            slots,
        }
    }

    fn hide_splash(&mut self) {
        if let Some(splash) = &self.splash {
            splash.class_list().add_1(&self.ids.hidden_class).ok();
        }
    }

    fn set_trigger_enabled(&mut self, enabled: bool) {
        if let Some(button) = &self.trigger {
            button.set_disabled(!enabled);
        }
    }

    fn show_message(&mut self, text: &str, jackpot: bool) {
        if let Some(message) = &self.message {
            message.set_text_content(Some(text));
            let classes = message.class_list();
            classes
                .toggle_with_force(&self.ids.jackpot_class, jackpot)
                .ok();
            classes.add_1(&self.ids.show_class).ok();
        }
    }

    fn hide_message(&mut self) {
        if let Some(message) = &self.message {
            let classes = message.class_list();
            classes.remove_1(&self.ids.show_class).ok();
            classes.remove_1(&self.ids.jackpot_class).ok();
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn element<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document
        .get_element_by_id(id)
        .and_then(|e| e.dyn_into::<T>().ok())
}

fn images_in(strip: &HtmlElement, class: &str) -> Result<Vec<HtmlImageElement>, JsValue> {
    let nodes = strip.query_selector_all(&format!(".{}", class))?;
    Ok((0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|n| n.dyn_into::<HtmlImageElement>().ok())
        .collect())
}
