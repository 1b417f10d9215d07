//! The layout pass driver.
//!
//! A [`LayoutContext`] owns everything a pass needs: the style engine, the
//! registered content providers, font metrics and the message queue other
//! threads use to report changes. Messages are only looked at when a pass
//! starts; a pass always runs to completion.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use trellis_common::dispatch::{MessageQueue, QueueId, SubscriberRegistry};
use trellis_dom::{DomTree, NodeId};

use super::block::layout_root;
use super::box_tree::{BoxTree, MeasureContext};
use super::builder::{ProviderMap, build_box_tree};
use super::font::{FontMetrics, LayoutConfig};
use super::replaced::ContentProvider;
use crate::cascade::StyleEngine;
use crate::media::Viewport;
use crate::paint::{DisplayList, Painter};

/// Something changed outside the layout thread.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutMessage {
    /// The viewport was resized.
    ViewportChanged(Viewport),
    /// A style sheet was added, removed or edited.
    StyleSheetsChanged,
    /// The DOM was mutated.
    DomChanged,
    /// Content for a replaced element became available.
    MediaReady(NodeId),
}

/// Runs style, box generation and layout for one document.
pub struct LayoutContext {
    engine: StyleEngine,
    config: LayoutConfig,
    metrics: Box<dyn FontMetrics>,
    providers: ProviderMap,
    queue: MessageQueue<LayoutMessage>,
    sender: Option<Sender<LayoutMessage>>,
    box_tree: Option<BoxTree>,
    needs_layout: bool,
    passes: u64,
}

impl LayoutContext {
    /// A context with its own private queue; see [`sender`](Self::sender).
    #[must_use]
    pub fn new(viewport: Viewport, metrics: Box<dyn FontMetrics>) -> Self {
        let (sender, queue) = MessageQueue::new(QueueId(0));
        let mut context = Self::with_queue(viewport, metrics, queue);
        context.sender = Some(sender);
        context
    }

    /// A context fed by `registry`.
    #[must_use]
    pub fn subscribed(
        viewport: Viewport,
        metrics: Box<dyn FontMetrics>,
        registry: &SubscriberRegistry<LayoutMessage>,
    ) -> Self {
        Self::with_queue(viewport, metrics, registry.subscribe())
    }

    fn with_queue(
        viewport: Viewport,
        metrics: Box<dyn FontMetrics>,
        queue: MessageQueue<LayoutMessage>,
    ) -> Self {
        let config = LayoutConfig::default();
        let mut engine = StyleEngine::new(viewport);
        engine.set_default_font(config.default_font.clone());
        Self {
            engine,
            config,
            metrics,
            providers: ProviderMap::new(),
            queue,
            sender: None,
            box_tree: None,
            needs_layout: true,
            passes: 0,
        }
    }

    /// A sender into this context's queue, if it owns a private one.
    #[must_use]
    pub fn sender(&self) -> Option<Sender<LayoutMessage>> {
        self.sender.clone()
    }

    /// The id of the queue this context drains.
    #[must_use]
    pub const fn queue_id(&self) -> QueueId {
        self.queue.id()
    }

    /// The style engine.
    #[must_use]
    pub const fn engine(&self) -> &StyleEngine {
        &self.engine
    }

    /// Mutable access to the style engine. Schedules a new pass.
    pub fn engine_mut(&mut self) -> &mut StyleEngine {
        self.needs_layout = true;
        &mut self.engine
    }

    /// Layout knobs.
    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the layout knobs. Schedules a new pass.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.engine.set_default_font(config.default_font.clone());
        self.config = config;
        self.needs_layout = true;
    }

    /// Back `node` with `provider`. Schedules a new pass.
    pub fn register_provider(&mut self, node: NodeId, provider: Arc<dyn ContentProvider>) {
        let _ = self.providers.insert(node, provider);
        self.needs_layout = true;
    }

    /// True if the next [`update`](Self::update) will rebuild the tree.
    #[must_use]
    pub const fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    /// Number of passes run so far.
    #[must_use]
    pub const fn passes(&self) -> u64 {
        self.passes
    }

    /// The box tree from the last pass.
    #[must_use]
    pub const fn box_tree(&self) -> Option<&BoxTree> {
        self.box_tree.as_ref()
    }

    fn apply_messages(&mut self) {
        for message in self.queue.drain() {
            log::trace!(target: "layout", "message {message:?}");
            match message {
                LayoutMessage::ViewportChanged(viewport) => self.engine.set_viewport(viewport),
                LayoutMessage::StyleSheetsChanged
                | LayoutMessage::DomChanged
                | LayoutMessage::MediaReady(_) => {}
            }
            self.needs_layout = true;
        }
    }

    /// Drain pending messages and, if anything changed, run a full pass:
    /// compute styles, build the box tree and lay it out.
    pub fn update(&mut self, dom: &DomTree) -> &BoxTree {
        self.apply_messages();
        let tree = match self.box_tree.take() {
            Some(tree) if !self.needs_layout => tree,
            _ => self.run_pass(dom),
        };
        self.needs_layout = false;
        self.box_tree.insert(tree)
    }

    fn run_pass(&mut self, dom: &DomTree) -> BoxTree {
        self.passes += 1;
        let viewport = self.engine.viewport();
        log::debug!(target: "layout", "pass {} at {}x{}", self.passes, viewport.width, viewport.height);

        let styles = self.engine.compute(dom);
        let mut tree = build_box_tree(dom, styles, &self.providers);
        let cx = MeasureContext::new(self.metrics.as_ref(), &self.config).within(viewport.width);
        let _ = layout_root(&mut tree, viewport.width, &cx);
        tree
    }

    /// Paint the tree from the last pass. Empty before the first pass.
    #[must_use]
    pub fn paint(&self) -> DisplayList {
        self.box_tree.as_ref().map_or_else(DisplayList::new, |tree| {
            Painter::new(self.metrics.as_ref(), &self.config).paint(tree)
        })
    }
}

impl fmt::Debug for LayoutContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutContext")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .field("providers", &self.providers.len())
            .field("needs_layout", &self.needs_layout)
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font::{ApproximateFontMetrics, FontSpec};
    use crate::paint::DisplayCommand;

    fn context() -> LayoutContext {
        LayoutContext::new(Viewport::new(800.0, 600.0), Box::new(ApproximateFontMetrics))
    }

    #[test]
    fn test_pass_runs_only_when_something_changed() {
        let dom = DomTree::new();
        let mut cx = context();
        let _ = cx.update(&dom);
        let _ = cx.update(&dom);
        assert_eq!(cx.passes(), 1);

        if let Some(sender) = cx.sender() {
            assert!(sender.send(LayoutMessage::DomChanged).is_ok());
        }
        let _ = cx.update(&dom);
        assert_eq!(cx.passes(), 2);
    }

    #[test]
    fn test_viewport_message_reaches_engine() {
        let dom = DomTree::new();
        let mut cx = context();
        if let Some(sender) = cx.sender() {
            assert!(sender.send(LayoutMessage::ViewportChanged(Viewport::new(320.0, 480.0))).is_ok());
        }
        let _ = cx.update(&dom);
        assert_eq!(cx.engine().viewport(), Viewport::new(320.0, 480.0));
    }

    #[test]
    fn test_default_font_reaches_painted_text() {
        let mut dom = DomTree::new();
        let div = dom.append_element(NodeId::ROOT, trellis_dom::ElementData::new("div"));
        let _ = dom.append_text(div, "hi");
        let mut cx = context();
        let _ = cx.update(&dom);
        cx.set_config(LayoutConfig {
            default_font: FontSpec {
                family: "Bitstream".to_string(),
                size: 30.0,
                ..FontSpec::default()
            },
            ..LayoutConfig::default()
        });
        let _ = cx.update(&dom);
        assert_eq!(cx.passes(), 2);

        let fonts: Vec<FontSpec> = cx
            .paint()
            .commands()
            .iter()
            .filter_map(|c| match c {
                DisplayCommand::DrawText { font, .. } => Some(font.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0].family, "Bitstream");
        assert_eq!(fonts[0].size, 30.0);
    }

    #[test]
    fn test_zero_precision_keeps_widths_finite() {
        let mut dom = DomTree::new();
        let div = dom.append_element(NodeId::ROOT, trellis_dom::ElementData::new("div"));
        let _ = dom.append_text(div, "two words");
        let mut cx = context();
        cx.set_config(LayoutConfig {
            subpixel_precision: 0.0,
            ..LayoutConfig::default()
        });
        let tree = cx.update(&dom);
        let widths: Vec<f32> = tree
            .descendants(tree.root())
            .into_iter()
            .filter_map(|id| tree.get(id).and_then(|b| b.dimensions))
            .map(|d| d.content.width)
            .collect();
        assert!(!widths.is_empty());
        assert!(widths.iter().all(|w| w.is_finite()));
    }

    #[test]
    fn test_registry_fan_out() {
        let registry = SubscriberRegistry::new();
        let dom = DomTree::new();
        let mut first =
            LayoutContext::subscribed(Viewport::new(800.0, 600.0), Box::new(ApproximateFontMetrics), &registry);
        let mut second =
            LayoutContext::subscribed(Viewport::new(800.0, 600.0), Box::new(ApproximateFontMetrics), &registry);
        let _ = first.update(&dom);
        let _ = second.update(&dom);
        assert_eq!(registry.publish(&LayoutMessage::StyleSheetsChanged), 2);
        let _ = first.update(&dom);
        let _ = second.update(&dom);
        assert_eq!((first.passes(), second.passes()), (2, 2));
    }
}
