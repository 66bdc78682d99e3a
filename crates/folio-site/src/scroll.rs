//! Scroll progress tracking.
//!
//! The tracker reports how far the reader has scrolled through the post
//! container as a fraction in `[0, 1]`. [`ScrollMeter`] is written against
//! the [`Viewport`] trait so the same logic can be driven by a browser
//! binding or a test double; [`client_script`] is the script embedded in
//! generated pages, implementing the same formula in the browser.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use log::debug;

use crate::assets;

/// Raw scroll measurements of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollMetrics {
    /// Distance scrolled past the top of the container.
    pub scroll_top: f64,
    /// Full height of the container's content.
    pub scroll_height: f64,
    /// Height of the visible area.
    pub viewport_height: f64,
}

/// Fraction of the container scrolled through, clamped to `[0, 1]`.
///
/// A container that fits in the viewport (zero or negative scrollable
/// height) and non-finite measurements yield `0.0`, never NaN.
///
/// # Example
///
/// ```
/// use folio_site::scroll::{progress, ScrollMetrics};
///
/// let m = ScrollMetrics { scroll_top: 250.0, scroll_height: 1500.0, viewport_height: 500.0 };
/// assert_eq!(progress(&m), 0.25);
/// ```
pub fn progress(metrics: &ScrollMetrics) -> f64 {
    let scrollable = metrics.scroll_height - metrics.viewport_height;
    if !scrollable.is_finite() || !metrics.scroll_top.is_finite() || scrollable <= 0.0 {
        return 0.0;
    }
    (metrics.scroll_top / scrollable).clamp(0.0, 1.0)
}

/// Events the meter listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportEvent {
    Scroll,
    Resize,
}

/// Handle for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Event handler registered with a [`Viewport`].
pub type Handler = Rc<dyn Fn()>;

/// The host environment a [`ScrollMeter`] observes.
pub trait Viewport {
    /// Element handle returned by [`Viewport::query`].
    type Element: 'static;

    /// Locate an element by CSS selector.
    fn query(&self, selector: &str) -> Option<Self::Element>;

    /// Current scroll measurements of `element`.
    fn metrics(&self, element: &Self::Element) -> ScrollMetrics;

    /// Register `handler` for `event`.
    fn add_listener(&self, event: ViewportEvent, handler: Handler) -> ListenerId;

    /// Remove a listener registered with [`Viewport::add_listener`].
    fn remove_listener(&self, id: ListenerId);
}

/// Receives progress updates.
pub trait ProgressIndicator {
    fn set_progress(&self, fraction: f64);
}

impl<F: Fn(f64)> ProgressIndicator for F {
    fn set_progress(&self, fraction: f64) {
        self(fraction)
    }
}

/// Tracks scroll progress of one container for as long as it is alive.
///
/// Listeners are registered in [`ScrollMeter::attach`] and removed when the
/// meter is dropped.
pub struct ScrollMeter<V: Viewport + 'static> {
    viewport: Rc<V>,
    listeners: Vec<ListenerId>,
    current: Rc<Cell<f64>>,
}

impl<V: Viewport + 'static> ScrollMeter<V> {
    /// Locate the container and start listening for scroll and resize.
    ///
    /// A missing container is not an error: the meter is returned detached
    /// and the indicator never updates.
    pub fn attach<I>(viewport: Rc<V>, selector: &str, indicator: I) -> Self
    where
        I: ProgressIndicator + 'static,
    {
        let current = Rc::new(Cell::new(0.0));

        let Some(container) = viewport.query(selector) else {
            debug!("scroll container '{selector}' not found, progress disabled");
            return Self {
                viewport,
                listeners: Vec::new(),
                current,
            };
        };

        let weak: Weak<V> = Rc::downgrade(&viewport);
        let state = Rc::clone(&current);
        let update: Handler = Rc::new(move || {
            let Some(viewport) = weak.upgrade() else {
                return;
            };
            let fraction = progress(&viewport.metrics(&container));
            state.set(fraction);
            indicator.set_progress(fraction);
        });

        let listeners = [ViewportEvent::Scroll, ViewportEvent::Resize]
            .into_iter()
            .map(|event| viewport.add_listener(event, Rc::clone(&update)))
            .collect();

        update();

        Self {
            viewport,
            listeners,
            current,
        }
    }

    /// True if the container was found and listeners are registered.
    pub fn is_attached(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Last computed fraction.
    pub fn progress(&self) -> f64 {
        self.current.get()
    }
}

impl<V: Viewport + 'static> Drop for ScrollMeter<V> {
    fn drop(&mut self) {
        for id in self.listeners.drain(..) {
            self.viewport.remove_listener(id);
        }
    }
}

/// Client-side script tracking the container matched by `selector`.
///
/// The selector is embedded as a JSON string literal; `</` is escaped so
/// the script cannot close its own `<script>` element.
pub fn client_script(selector: &str) -> String {
    let literal = serde_json::to_string(selector)
        .unwrap_or_else(|_| "\".md-output\"".to_string())
        .replace("</", "<\\/");
    assets::SCROLL_JS.replace("__CONTAINER_SELECTOR__", &literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeViewport {
        container: Option<&'static str>,
        metrics: Cell<ScrollMetrics>,
        listeners: RefCell<Vec<(ListenerId, ViewportEvent, Handler)>>,
        next_id: Cell<u64>,
    }

    impl FakeViewport {
        fn with_container(selector: &'static str) -> Self {
            Self {
                container: Some(selector),
                ..Self::default()
            }
        }

        fn fire(&self, event: ViewportEvent) {
            let handlers: Vec<Handler> = self
                .listeners
                .borrow()
                .iter()
                .filter(|(_, e, _)| *e == event)
                .map(|(_, _, h)| Rc::clone(h))
                .collect();
            for handler in handlers {
                handler();
            }
        }

        fn listener_count(&self) -> usize {
            self.listeners.borrow().len()
        }
    }

    impl Viewport for FakeViewport {
        type Element = ();

        fn query(&self, selector: &str) -> Option<()> {
            (self.container == Some(selector)).then_some(())
        }

        fn metrics(&self, _element: &()) -> ScrollMetrics {
            self.metrics.get()
        }

        fn add_listener(&self, event: ViewportEvent, handler: Handler) -> ListenerId {
            let id = ListenerId(self.next_id.get());
            self.next_id.set(id.0 + 1);
            self.listeners.borrow_mut().push((id, event, handler));
            id
        }

        fn remove_listener(&self, id: ListenerId) {
            self.listeners.borrow_mut().retain(|(l, _, _)| *l != id);
        }
    }

    fn metrics(top: f64, height: f64, viewport: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: top,
            scroll_height: height,
            viewport_height: viewport,
        }
    }

    #[test]
    fn test_progress_midway() {
        assert_eq!(progress(&metrics(500.0, 2000.0, 1000.0)), 0.5);
    }

    #[test]
    fn test_progress_clamped() {
        assert_eq!(progress(&metrics(-40.0, 2000.0, 1000.0)), 0.0);
        assert_eq!(progress(&metrics(5000.0, 2000.0, 1000.0)), 1.0);
    }

    #[test]
    fn test_progress_degenerate_heights() {
        assert_eq!(progress(&metrics(0.0, 0.0, 0.0)), 0.0);
        assert_eq!(progress(&metrics(10.0, 800.0, 800.0)), 0.0);
        assert_eq!(progress(&metrics(10.0, 500.0, 800.0)), 0.0);
        assert_eq!(progress(&metrics(f64::NAN, 2000.0, 1000.0)), 0.0);
        assert_eq!(progress(&metrics(1.0, f64::INFINITY, 1000.0)), 0.0);
    }

    #[test]
    fn test_meter_updates_on_scroll_and_resize() {
        let viewport = Rc::new(FakeViewport::with_container(".md-output"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let meter = ScrollMeter::attach(Rc::clone(&viewport), ".md-output", move |f: f64| {
            sink.borrow_mut().push(f)
        });
        assert!(meter.is_attached());
        assert_eq!(viewport.listener_count(), 2);

        viewport.metrics.set(metrics(250.0, 1500.0, 500.0));
        viewport.fire(ViewportEvent::Scroll);
        assert_eq!(meter.progress(), 0.25);

        viewport.metrics.set(metrics(250.0, 1500.0, 1000.0));
        viewport.fire(ViewportEvent::Resize);
        assert_eq!(meter.progress(), 0.5);

        assert_eq!(*seen.borrow(), vec![0.0, 0.25, 0.5]);
    }

    #[test]
    fn test_meter_detaches_on_drop() {
        let viewport = Rc::new(FakeViewport::with_container(".md-output"));
        let meter = ScrollMeter::attach(Rc::clone(&viewport), ".md-output", |_: f64| {});
        assert_eq!(viewport.listener_count(), 2);

        drop(meter);
        assert_eq!(viewport.listener_count(), 0);
    }

    #[test]
    fn test_missing_container_is_silent() {
        let viewport = Rc::new(FakeViewport::default());
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);

        let meter = ScrollMeter::attach(Rc::clone(&viewport), ".md-output", move |_: f64| {
            counter.set(counter.get() + 1)
        });
        viewport.fire(ViewportEvent::Scroll);

        assert!(!meter.is_attached());
        assert_eq!(meter.progress(), 0.0);
        assert_eq!(calls.get(), 0);
        assert_eq!(viewport.listener_count(), 0);
    }

    #[test]
    fn test_client_script_embeds_selector() {
        let script = client_script(".md-output");
        assert!(script.contains(r#"var selector = ".md-output";"#));
        assert!(script.contains("removeEventListener(\"scroll\""));
        assert!(!script.contains("__CONTAINER_SELECTOR__"));
    }

    #[test]
    fn test_client_script_escapes_selector() {
        let script = client_script("</script><b \"x\">");
        assert!(!script.contains("</script><b"));
        assert!(script.contains(r#"<\/script><b \"x\">"#));
    }
}
